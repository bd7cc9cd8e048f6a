//! The kernel adapter: everything that touches the file descriptor.
//!
//! [`Handle`] wraps the caller's *borrowed* descriptor and exposes the `ioctl` surface and the
//! batched event read. It interprets nothing: capability and state bookkeeping live elsewhere,
//! and the descriptor is never closed here.

use std::{
    ffi::{c_char, c_int, c_uint, c_void},
    io, mem,
    os::fd::{AsFd, AsRawFd, BorrowedFd},
    slice,
};

use uoctl::Ioctl;

use crate::{
    abs_info::AbsInfo,
    bits::{BitSet, BitValue},
    caps::Capabilities,
    event::{Abs, EventType, InputEvent},
    input_id::InputId,
    key_repeat::KeyRepeat,
    raw::{
        EVIOCGABS, EVIOCGBIT, EVIOCGID, EVIOCGKEY, EVIOCGLED, EVIOCGMTSLOTS, EVIOCGNAME,
        EVIOCGPHYS, EVIOCGPROP, EVIOCGRAB, EVIOCGREP, EVIOCGSW, EVIOCGUNIQ, EVIOCGVERSION,
        EVIOCSABS, EVIOCSCLOCKID, EVIOCSREP,
    },
    state::{DeviceState, SlotAxes},
    util,
    version::Version,
};

/// A borrowed evdev file descriptor.
///
/// The caller owns the descriptor and is responsible for opening and closing it; this type only
/// borrows it for the lifetime `'fd`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Handle<'fd> {
    fd: BorrowedFd<'fd>,
}

impl<'fd> Handle<'fd> {
    pub fn new(fd: BorrowedFd<'fd>) -> Self {
        Self { fd }
    }

    pub fn fd(&self) -> BorrowedFd<'fd> {
        self.fd
    }

    pub fn set_fd(&mut self, fd: BorrowedFd<'fd>) {
        self.fd = fd;
    }

    /// Executes `ioctl`, attaching its name to any error.
    unsafe fn ioctl<T>(&self, name: &'static str, ioctl: Ioctl<T>, arg: T) -> io::Result<c_int> {
        match unsafe { ioctl.ioctl(&self.fd, arg) } {
            Ok(ret) => Ok(ret),
            Err(e) => Err(io::Error::new(e.kind(), format!("ioctl {name} failed: {e}"))),
        }
    }

    /// Fetches a string-returning `ioctl`, growing the buffer until the result fits.
    unsafe fn fetch_string(
        &self,
        name: &'static str,
        ioctl: impl Fn(usize) -> Ioctl<*mut c_char>,
    ) -> io::Result<String> {
        let mut buf = vec![0_u8; 64];
        let len = loop {
            let len =
                unsafe { self.ioctl(name, ioctl(buf.len()), buf.as_mut_ptr() as *mut c_char)? };
            if len as usize == buf.len() {
                // A full buffer may mean a truncated string.
                buf.resize(buf.len() * 2, 0);
            } else {
                break len;
            }
        };

        // `len` counts the trailing NUL.
        buf.truncate(len.saturating_sub(1) as usize);
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    unsafe fn fetch_bits<V: BitValue>(
        &self,
        name: &'static str,
        ioctl: impl Fn(usize) -> Ioctl<*mut c_void>,
    ) -> io::Result<BitSet<V>> {
        let mut set = BitSet::<V>::new();
        let words = set.words_mut();
        unsafe {
            self.ioctl(name, ioctl(mem::size_of_val(words)), words.as_mut_ptr().cast())?;
        }
        Ok(set)
    }

    pub fn driver_version(&self) -> io::Result<Version> {
        unsafe {
            let mut version = 0;
            self.ioctl("EVIOCGVERSION", EVIOCGVERSION, &mut version)?;
            Ok(Version(version))
        }
    }

    pub fn input_id(&self) -> io::Result<InputId> {
        unsafe {
            let mut id = mem::zeroed();
            self.ioctl("EVIOCGID", EVIOCGID, &mut id)?;
            Ok(InputId(id))
        }
    }

    pub fn name(&self) -> io::Result<String> {
        unsafe { self.fetch_string("EVIOCGNAME", EVIOCGNAME) }
    }

    /// Fetches the physical location string; `None` when the device has none.
    pub fn phys(&self) -> io::Result<Option<String>> {
        unsafe {
            match self.fetch_string("EVIOCGPHYS", EVIOCGPHYS) {
                Ok(phys) => Ok(Some(phys)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e),
            }
        }
    }

    /// Fetches the unique-identifier string; `None` when the device has none.
    pub fn uniq(&self) -> io::Result<Option<String>> {
        unsafe {
            match self.fetch_string("EVIOCGUNIQ", EVIOCGUNIQ) {
                Ok(uniq) => Ok(Some(uniq)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e),
            }
        }
    }

    pub fn supported_events(&self) -> io::Result<BitSet<EventType>> {
        unsafe { self.fetch_bits("EVIOCGBIT", |len| EVIOCGBIT(0, len)) }
    }

    pub fn supported<V: BitValue>(&self, ty: EventType) -> io::Result<BitSet<V>> {
        unsafe { self.fetch_bits("EVIOCGBIT", move |len| EVIOCGBIT(ty.raw() as u8, len)) }
    }

    /// Fetches the property bitmap; old kernels without the `ioctl` yield the empty set.
    pub fn props(&self) -> io::Result<BitSet<crate::event::InputProp>> {
        unsafe {
            match self.fetch_bits("EVIOCGPROP", EVIOCGPROP) {
                Ok(props) => Ok(props),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::Unsupported | io::ErrorKind::InvalidInput
                    ) =>
                {
                    log::debug!("EVIOCGPROP unavailable, assuming no properties: {e}");
                    Ok(BitSet::new())
                }
                Err(e) => Err(e),
            }
        }
    }

    pub fn abs_info(&self, abs: Abs) -> io::Result<AbsInfo> {
        debug_assert!(abs.raw() <= Abs::MAX.raw());
        unsafe {
            let mut info = mem::zeroed();
            self.ioctl("EVIOCGABS", EVIOCGABS(abs.raw() as u8), &mut info)?;
            Ok(AbsInfo(info))
        }
    }

    /// Writes new axis parameters through to the kernel.
    pub fn set_abs_info(&self, abs: Abs, info: AbsInfo) -> io::Result<()> {
        unsafe {
            self.ioctl("EVIOCSABS", EVIOCSABS(abs.raw() as u8), &info.0)?;
        }
        Ok(())
    }

    pub fn key_state(&self) -> io::Result<BitSet<crate::event::Key>> {
        unsafe { self.fetch_bits("EVIOCGKEY", EVIOCGKEY) }
    }

    pub fn led_state(&self) -> io::Result<BitSet<crate::event::Led>> {
        unsafe { self.fetch_bits("EVIOCGLED", EVIOCGLED) }
    }

    pub fn switch_state(&self) -> io::Result<BitSet<crate::event::Switch>> {
        unsafe { self.fetch_bits("EVIOCGSW", EVIOCGSW) }
    }

    /// Fetches the autorepeat parameters; `None` when the device doesn't do autorepeat.
    pub fn key_repeat(&self) -> io::Result<Option<KeyRepeat>> {
        unsafe {
            let mut rep = [0 as c_uint; 2];
            match self.ioctl("EVIOCGREP", EVIOCGREP, &mut rep) {
                Ok(_) => Ok(Some(KeyRepeat::new(rep[0] as u32, rep[1] as u32))),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::Unsupported | io::ErrorKind::InvalidInput
                    ) =>
                {
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        }
    }

    pub fn set_key_repeat(&self, rep: KeyRepeat) -> io::Result<()> {
        unsafe {
            let rep = [rep.delay() as c_uint, rep.period() as c_uint];
            self.ioctl("EVIOCSREP", EVIOCSREP, &rep)?;
        }
        Ok(())
    }

    /// Fetches the per-slot values of one `ABS_MT_*` code.
    pub fn slot_values(&self, code: Abs, nslots: usize) -> io::Result<Vec<i32>> {
        let mut buf = vec![0_i32; nslots + 1];
        buf[0] = code.raw().into();
        unsafe {
            self.ioctl(
                "EVIOCGMTSLOTS",
                EVIOCGMTSLOTS(buf.len() * size_of::<i32>()),
                buf.as_mut_ptr().cast(),
            )?;
        }
        buf.remove(0);
        Ok(buf)
    }

    pub fn grab(&self) -> io::Result<()> {
        unsafe {
            self.ioctl("EVIOCGRAB", EVIOCGRAB, 1)?;
        }
        Ok(())
    }

    pub fn ungrab(&self) -> io::Result<()> {
        unsafe {
            self.ioctl("EVIOCGRAB", EVIOCGRAB, 0)?;
        }
        Ok(())
    }

    pub fn set_clockid(&self, clockid: libc::clockid_t) -> io::Result<()> {
        unsafe {
            self.ioctl("EVIOCSCLOCKID", EVIOCSCLOCKID, &clockid)?;
        }
        Ok(())
    }

    /// Reads a batch of raw event records into `dest`.
    ///
    /// Returns the number of whole records read. A read that isn't a multiple of the record size
    /// means the kernel buffer was truncated and is reported as [`io::ErrorKind::InvalidData`].
    pub fn read_events(&self, dest: &mut [InputEvent]) -> io::Result<usize> {
        let n = unsafe {
            libc::read(
                self.fd.as_raw_fd(),
                dest.as_mut_ptr().cast(),
                mem::size_of_val(dest),
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }

        let bytes = n as usize;
        if bytes % size_of::<InputEvent>() != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("read {bytes} bytes, not a multiple of the event record size"),
            ));
        }
        Ok(bytes / size_of::<InputEvent>())
    }

    /// Writes event records to the device (used for LED updates).
    pub fn write_events(&self, events: &[InputEvent]) -> io::Result<()> {
        let mut bytes: &[u8] = unsafe {
            slice::from_raw_parts(events.as_ptr().cast(), mem::size_of_val(events))
        };
        while !bytes.is_empty() {
            let n = unsafe {
                libc::write(self.fd.as_raw_fd(), bytes.as_ptr().cast(), bytes.len())
            };
            if n < 0 {
                let e = io::Error::last_os_error();
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e);
            }
            bytes = &bytes[n as usize..];
        }
        Ok(())
    }

    pub fn is_readable(&self) -> io::Result<bool> {
        util::is_readable(self.fd.as_raw_fd())
    }

    pub fn block_until_readable(&self) -> io::Result<()> {
        util::block_until_readable(self.fd.as_raw_fd())
    }
}

impl AsFd for Handle<'_> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

/// Populates the capability set and the initial state cache from the attach-time `ioctl`s.
pub(crate) fn probe(handle: &Handle<'_>) -> io::Result<(Capabilities, DeviceState)> {
    let mut caps = Capabilities::new();
    let mut state = DeviceState::new();

    caps.types = handle.supported_events()?;
    caps.props = handle.props()?;

    if caps.types.contains(EventType::KEY) {
        caps.keys = handle.supported(EventType::KEY)?;
        state.keys = handle.key_state()?;
    }
    if caps.types.contains(EventType::REL) {
        caps.rels = handle.supported(EventType::REL)?;
    }
    if caps.types.contains(EventType::SW) {
        caps.switches = handle.supported(EventType::SW)?;
        state.switches = handle.switch_state()?;
    }
    if caps.types.contains(EventType::MSC) {
        caps.miscs = handle.supported(EventType::MSC)?;
    }
    if caps.types.contains(EventType::LED) {
        caps.leds = handle.supported(EventType::LED)?;
        state.leds = handle.led_state()?;
    }
    if caps.types.contains(EventType::SND) {
        caps.sounds = handle.supported(EventType::SND)?;
    }
    if caps.types.contains(EventType::REP) {
        state.rep = handle.key_repeat()?;
    }

    if caps.types.contains(EventType::ABS) {
        caps.abs = handle.supported(EventType::ABS)?;
        for abs in caps.abs.iter() {
            let info = handle.abs_info(abs)?;
            state.abs[abs.raw() as usize] = info.value();
            caps.abs_params[abs.raw() as usize] = info.with_value(0);
        }
        probe_slots(handle, &caps, &mut state)?;
    }

    Ok((caps, state))
}

/// Sets up the multitouch slot table, demoting *fake multitouch* devices to plain axes.
fn probe_slots(handle: &Handle<'_>, caps: &Capabilities, state: &mut DeviceState) -> io::Result<()> {
    if !caps.abs.contains(Abs::MT_SLOT) {
        return Ok(());
    }

    // A device advertising the axis right below ABS_MT_SLOT got an ordinary axis range
    // misclassified as multitouch by the kernel. Treat every MT code as a plain axis.
    if caps.abs.contains(Abs::from_raw(Abs::MT_SLOT.raw() - 1)) {
        log::warn!("fake multitouch device, treating MT codes as plain absolute axes");
        return Ok(());
    }

    let slot_info = caps.abs_params(Abs::MT_SLOT).unwrap_or(AbsInfo::ZERO);
    let nslots = (slot_info.maximum().saturating_add(1)).max(0) as usize;
    let codes: Vec<Abs> = caps.abs.iter().filter(|abs| abs.is_slot_axis()).collect();
    let mut slots = SlotAxes::with_layout(codes, nslots);
    slots.set_current(state.abs[Abs::MT_SLOT.raw() as usize].max(0) as usize);

    for code in slots.codes().to_vec() {
        match handle.slot_values(code, slots.nslots()) {
            Ok(row) => {
                slots.row_mut(code).unwrap().copy_from_slice(&row);
            }
            Err(e) => {
                // Old kernels can't report slot values; assume all zeroes.
                log::debug!("EVIOCGMTSLOTS unavailable, assuming zeroed slot state: {e}");
                break;
            }
        }
    }

    state.slots = slots;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::os::fd::{BorrowedFd, FromRawFd, OwnedFd};

    use super::*;

    fn pipe() -> (OwnedFd, OwnedFd) {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
    }

    fn write_all(fd: &OwnedFd, bytes: &[u8]) {
        let n = unsafe { libc::write(fd.as_raw_fd(), bytes.as_ptr().cast(), bytes.len()) };
        assert_eq!(n as usize, bytes.len());
    }

    #[test]
    fn truncated_records_are_rejected() {
        let (rd, wr) = pipe();
        write_all(&wr, &[0xab; 10]);

        let handle = Handle::new(rd.as_fd());
        let mut buf = [InputEvent::zeroed(); 4];
        let err = handle.read_events(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn whole_records_are_decoded() {
        let (rd, wr) = pipe();
        let ev = InputEvent::new(EventType::KEY, crate::event::Key::KEY_A.raw(), 1);
        let bytes = unsafe {
            slice::from_raw_parts((&raw const ev).cast::<u8>(), size_of::<InputEvent>())
        };
        write_all(&wr, bytes);

        let handle = Handle::new(rd.as_fd());
        let mut buf = [InputEvent::zeroed(); 4];
        assert_eq!(handle.read_events(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], ev);
    }

    #[test]
    fn readable_polling() {
        let (rd, wr) = pipe();
        let handle = Handle::new(rd.as_fd());
        assert!(!handle.is_readable().unwrap());
        write_all(&wr, &[0; 4]);
        assert!(handle.is_readable().unwrap());
    }

    // Keep the borrow honest: `Handle` must not outlive the fd it was created from.
    #[allow(dead_code)]
    fn lifetimes(fd: BorrowedFd<'_>) -> Handle<'_> {
        Handle::new(fd)
    }
}
