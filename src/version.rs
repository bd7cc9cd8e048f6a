use std::{ffi::c_int, fmt};

/// The version of the kernel's evdev core, as reported by the driver-version `ioctl`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Version(pub(crate) c_int);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, patch] = [self.0 >> 16 & 0xff, self.0 >> 8 & 0xff, self.0 & 0xff];
        write!(f, "{major}.{minor}.{patch}")
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({:#x})", self.0)
    }
}
