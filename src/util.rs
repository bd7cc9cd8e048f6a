use std::{
    io,
    os::fd::{AsRawFd, RawFd},
};

/// Uses `poll(2)` with a zero timeout to check whether `fd` can be read without blocking.
pub fn is_readable(fd: RawFd) -> io::Result<bool> {
    let mut poll = libc::pollfd {
        fd: fd.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    let ret = unsafe { libc::poll(&mut poll, 1, 0) };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(poll.revents & libc::POLLIN != 0)
}

/// Blocks the calling thread until `fd` becomes readable.
pub fn block_until_readable(fd: RawFd) -> io::Result<()> {
    loop {
        let mut poll = libc::pollfd {
            fd: fd.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let ret = unsafe { libc::poll(&mut poll, 1, -1) };
        if ret == -1 {
            return Err(io::Error::last_os_error());
        }

        if poll.revents & libc::POLLIN != 0 {
            return Ok(());
        }
    }
}
