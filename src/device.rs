//! The public device façade.

use std::{
    fmt, io,
    ops::BitOr,
    os::fd::{AsFd, BorrowedFd},
};

use crate::{
    abs_info::AbsInfo,
    bits::BitSet,
    dev::{self, Handle},
    engine::Engine,
    event::{
        Abs, EventCode, EventType, InputEvent, InputProp, Key, Led, LedEvent, Misc, Rel, Sound,
        Switch, SynEvent, Syn,
    },
    input_id::InputId,
    key_repeat::KeyRepeat,
    version::Version,
};

/// Flags selecting how [`Device::next_event`] reads.
///
/// Combine with `|`: `ReadFlags::NORMAL | ReadFlags::BLOCKING`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ReadFlags(u32);

impl ReadFlags {
    /// Deliver the synthesized delta records of a pending resynchronization.
    pub const SYNC: Self = Self(1 << 0);
    /// Deliver the next device event.
    pub const NORMAL: Self = Self(1 << 1);
    /// Pretend a drop marker was read: snapshot the cache and start a resynchronization. Useful
    /// after [`Device::change_fd`], where the device may have changed state without any event
    /// reaching this instance.
    pub const FORCE_SYNC: Self = Self(1 << 2);
    /// Block until an event is available instead of failing with
    /// [`WouldBlock`][io::ErrorKind::WouldBlock].
    pub const BLOCKING: Self = Self(1 << 3);

    /// Returns whether every flag in `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ReadFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for ReadFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::SYNC, "SYNC"),
            (Self::NORMAL, "NORMAL"),
            (Self::FORCE_SYNC, "FORCE_SYNC"),
            (Self::BLOCKING, "BLOCKING"),
        ];
        let mut rest = self.0;
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
                rest &= !flag.0;
            }
        }
        if rest != 0 || first {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "{rest:#x}")?;
        }
        Ok(())
    }
}

/// Outcome of a successful [`Device::next_event`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// A device event was read in normal mode.
    Success,
    /// Either a drop marker was read (the cache is stale, read with [`ReadFlags::SYNC`] next),
    /// or a synthesized delta record was delivered in sync mode.
    Sync,
}

/// A batch of LED changes, validated as a whole before any of it is written.
///
/// Replaces per-LED writes so that a batch with an unsupported LED in it changes nothing at all.
///
/// ```no_run
/// # fn main() -> std::io::Result<()> {
/// # use std::os::fd::AsFd;
/// use evstate::{Led, LedBatch};
///
/// # let file = std::fs::File::open("/dev/input/event0")?;
/// # let mut dev = evstate::Device::from_fd(file.as_fd())?;
/// dev.set_leds(LedBatch::new().with(Led::NUML, true).with(Led::CAPSL, false))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct LedBatch {
    entries: Vec<(Led, bool)>,
}

impl LedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one LED change to the batch.
    pub fn with(mut self, led: Led, on: bool) -> Self {
        self.entries.push((led, on));
        self
    }
}

/// A stateful view of one event device.
///
/// Created from a borrowed file descriptor with [`Device::from_fd`], which probes the device's
/// capabilities and current state through the evdev `ioctl`s. From then on the instance keeps a
/// userspace mirror of all retained state, updated as events are pulled through
/// [`Device::next_event`], and resynchronizes that mirror when the kernel reports dropped events.
///
/// The descriptor stays owned by the caller: it is never closed here, and the `'fd` lifetime
/// keeps the device from outliving it. Opening with `O_NONBLOCK` is recommended;
/// [`ReadFlags::BLOCKING`] can still be used to wait for events on demand.
///
/// The cached getters ([`Device::event_value`], [`Device::slot_value`], the `supported_*`
/// accessors, and the identity getters) perform no I/O, no allocation, and no logging, which
/// makes them safe to call from signal handlers.
pub struct Device<'fd> {
    handle: Handle<'fd>,
    name: String,
    phys: Option<String>,
    uniq: Option<String>,
    id: InputId,
    driver_version: Version,
    engine: Engine,
}

impl<'fd> Device<'fd> {
    /// Attaches to an already-open event device.
    ///
    /// Probes the device identity, capabilities, and current state. Optional `ioctl`s missing
    /// from older kernels degrade gracefully: no properties, zeroed multitouch slot state.
    pub fn from_fd(fd: BorrowedFd<'fd>) -> io::Result<Self> {
        let handle = Handle::new(fd);
        let driver_version = handle.driver_version()?;
        let (caps, state) = dev::probe(&handle)?;
        let this = Self {
            name: handle.name()?,
            phys: handle.phys()?,
            uniq: handle.uniq()?,
            id: handle.input_id()?,
            driver_version,
            handle,
            engine: Engine::new(caps, state),
        };
        log::debug!(
            "attached to '{}' (driver version {})",
            this.name,
            this.driver_version,
        );
        Ok(this)
    }

    /// Returns the borrowed descriptor.
    pub fn fd(&self) -> BorrowedFd<'fd> {
        self.handle.fd()
    }

    /// Swaps the underlying descriptor without re-probing the device.
    ///
    /// Nothing checks that `fd` refers to the same hardware; the cache is kept as-is. Follow up
    /// with a [`ReadFlags::FORCE_SYNC`] read to reconcile the cache with the new descriptor's
    /// state.
    pub fn change_fd(&mut self, fd: BorrowedFd<'fd>) {
        self.handle.set_fd(fd);
    }

    /// Reads the next event.
    ///
    /// In normal mode ([`ReadFlags::NORMAL`]) this returns the next device event with
    /// [`ReadStatus::Success`]. When the kernel reports that events were dropped, the drop
    /// marker is returned with [`ReadStatus::Sync`]; the caller should then read with
    /// [`ReadFlags::SYNC`] until [`WouldBlock`][io::ErrorKind::WouldBlock], consuming the delta
    /// records that bring its view up to date. A caller that goes straight back to normal reads
    /// instead has the cache updated silently and the deltas discarded.
    ///
    /// With no events available, non-blocking reads fail with
    /// [`WouldBlock`][io::ErrorKind::WouldBlock]; pass [`ReadFlags::BLOCKING`] to wait.
    pub fn next_event(&mut self, flags: ReadFlags) -> io::Result<(ReadStatus, InputEvent)> {
        self.engine.next_event(&mut self.handle, flags)
    }

    /// Returns whether [`Device::next_event`] has something to deliver, polling the descriptor
    /// only when the internal queues are empty.
    pub fn has_event_pending(&self) -> io::Result<bool> {
        self.engine.has_event_pending(&self.handle)
    }
}

/// Device identity. All of this is cached at attach time and involves no I/O to read.
impl Device<'_> {
    /// Returns the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the physical location string, if the device reports one.
    pub fn phys(&self) -> Option<&str> {
        self.phys.as_deref()
    }

    /// Returns the unique identifier string, if the device reports one.
    pub fn uniq(&self) -> Option<&str> {
        self.uniq.as_deref()
    }

    /// Returns bus type and vendor/product/version IDs.
    pub fn input_id(&self) -> InputId {
        self.id
    }

    /// Returns the version of the kernel's evdev core.
    pub fn driver_version(&self) -> Version {
        self.driver_version
    }
}

/// Capability queries and local capability overrides.
///
/// The `enable_*`/`disable_*` calls change only this instance's view; the kernel is never
/// informed. The single exception is [`Device::kernel_set_abs_info`], which writes axis
/// parameters through to the device.
impl Device<'_> {
    pub fn has_event_type(&self, ty: EventType) -> bool {
        self.engine.caps.types.contains(ty)
    }

    pub fn has_event_code(&self, code: impl Into<EventCode>) -> bool {
        self.engine.caps.has_code(code.into())
    }

    pub fn has_property(&self, prop: InputProp) -> bool {
        self.engine.caps.props.contains(prop)
    }

    pub fn supported_events(&self) -> &BitSet<EventType> {
        &self.engine.caps.types
    }

    pub fn properties(&self) -> &BitSet<InputProp> {
        &self.engine.caps.props
    }

    pub fn supported_keys(&self) -> &BitSet<Key> {
        &self.engine.caps.keys
    }

    pub fn supported_rel_axes(&self) -> &BitSet<Rel> {
        &self.engine.caps.rels
    }

    pub fn supported_abs_axes(&self) -> &BitSet<Abs> {
        &self.engine.caps.abs
    }

    pub fn supported_switches(&self) -> &BitSet<Switch> {
        &self.engine.caps.switches
    }

    pub fn supported_misc(&self) -> &BitSet<Misc> {
        &self.engine.caps.miscs
    }

    pub fn supported_leds(&self) -> &BitSet<Led> {
        &self.engine.caps.leds
    }

    pub fn supported_sounds(&self) -> &BitSet<Sound> {
        &self.engine.caps.sounds
    }

    /// Marks an event type as supported.
    pub fn enable_event_type(&mut self, ty: EventType) -> io::Result<()> {
        self.engine.enable_event_type(ty)
    }

    /// Marks an event type as unsupported; its events are filtered from then on.
    ///
    /// The synchronization type cannot be disabled.
    pub fn disable_event_type(&mut self, ty: EventType) -> io::Result<()> {
        self.engine.disable_event_type(ty)
    }

    /// Marks a code as supported, enabling its type along the way.
    ///
    /// Absolute axes and autorepeat carry payloads and have dedicated calls
    /// ([`Device::enable_abs_axis`], [`Device::enable_key_repeat`]); passing them here is
    /// rejected.
    pub fn enable_event_code(&mut self, code: impl Into<EventCode>) -> io::Result<()> {
        self.engine.enable_event_code(code.into())
    }

    /// Marks an absolute axis as supported, with the given axis parameters.
    pub fn enable_abs_axis(&mut self, abs: Abs, params: AbsInfo) -> io::Result<()> {
        self.engine.enable_abs_axis(abs, params)
    }

    /// Marks autorepeat as supported, with the given parameters.
    pub fn enable_key_repeat(&mut self, rep: KeyRepeat) -> io::Result<()> {
        self.engine.enable_key_repeat(rep)
    }

    /// Removes a code from the supported set; its events are filtered from then on.
    ///
    /// Disabling an absent code is a no-op. Synchronization codes cannot be disabled. The cached
    /// value is deliberately lost: re-enabling the code reads 0 until the next event or
    /// resynchronization.
    pub fn disable_event_code(&mut self, code: impl Into<EventCode>) -> io::Result<()> {
        self.engine.disable_event_code(code.into())
    }

    /// Marks a property as present.
    pub fn enable_property(&mut self, prop: InputProp) -> io::Result<()> {
        self.engine.enable_property(prop)
    }

    /// Returns the parameters of an absolute axis, with the cached value filled in.
    pub fn abs_info(&self, abs: Abs) -> Option<AbsInfo> {
        self.engine.abs_info(abs)
    }

    /// Writes new absolute-axis parameters both into this instance and through to the kernel.
    pub fn kernel_set_abs_info(&mut self, abs: Abs, params: AbsInfo) -> io::Result<()> {
        if !self.engine.caps.abs.contains(abs) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "axis is not enabled on this device",
            ));
        }
        self.handle.set_abs_info(abs, params)?;
        self.engine.caps.abs_params[abs.raw() as usize] = params.with_value(0);
        Ok(())
    }
}

/// Cached state access. None of these touch the descriptor.
impl Device<'_> {
    /// Returns the last observed value of `code`.
    ///
    /// Disabled codes and codes without retained state (relative axes, misc, sounds) read as 0.
    /// Multitouch codes read through the current slot; [`Abs::MT_SLOT`] reads as the current
    /// slot index.
    pub fn event_value(&self, code: impl Into<EventCode>) -> i32 {
        self.engine.event_value(code.into())
    }

    /// Overwrites the cached value of `code` without generating an event.
    ///
    /// Intended for setting up initial state; the kernel is not informed. Setting a disabled
    /// code is rejected.
    pub fn set_event_value(&mut self, code: impl Into<EventCode>, value: i32) -> io::Result<()> {
        self.engine.set_event_value(code.into(), value)
    }

    /// Returns the number of multitouch slots the cache tracks.
    ///
    /// 0 means the device has no (usable) multitouch slots; that includes *fake multitouch*
    /// devices, whose `MT_*` codes behave as plain absolute axes.
    pub fn num_slots(&self) -> usize {
        self.engine.num_slots()
    }

    /// Returns the slot that incoming multitouch events currently apply to.
    pub fn current_slot(&self) -> usize {
        self.engine.current_slot()
    }

    /// Returns the cached value of a multitouch code in a specific slot.
    ///
    /// Unknown slots and disabled codes read as 0. A slot is active iff its
    /// [`Abs::MT_TRACKING_ID`] value is nonnegative.
    pub fn slot_value(&self, slot: usize, code: Abs) -> i32 {
        self.engine.slot_value(slot, code)
    }

    /// Overwrites one per-slot value without generating an event.
    ///
    /// Out-of-range slots and non-multitouch codes are rejected, as is storing anything but
    /// `-1` into the tracking id of an inactive slot.
    pub fn set_slot_value(&mut self, slot: usize, code: Abs, value: i32) -> io::Result<()> {
        self.engine.set_slot_value(slot, code, value)
    }

    /// Returns the cached autorepeat parameters, if the device has autorepeat.
    pub fn key_repeat(&self) -> Option<KeyRepeat> {
        self.engine.key_repeat()
    }
}

/// Kernel-side operations beyond event reading.
impl Device<'_> {
    /// Grabs the device for exclusive access; other clients stop receiving its events.
    pub fn grab(&mut self) -> io::Result<()> {
        self.handle.grab()
    }

    /// Releases a grab taken with [`Device::grab`].
    pub fn ungrab(&mut self) -> io::Result<()> {
        self.handle.ungrab()
    }

    /// Selects the clock used for event timestamps ([`libc::CLOCK_MONOTONIC`] or
    /// [`libc::CLOCK_REALTIME`]).
    ///
    /// The kernel empties its buffer when this is called and enqueues a drop marker, so expect a
    /// resynchronization right after.
    pub fn set_clockid(&mut self, clockid: libc::clockid_t) -> io::Result<()> {
        self.handle.set_clockid(clockid)
    }

    /// Updates the device's autorepeat parameters, kernel-side and in the cache.
    pub fn set_key_repeat(&mut self, rep: KeyRepeat) -> io::Result<()> {
        self.handle.set_key_repeat(rep)?;
        self.engine.state.rep = Some(rep);
        Ok(())
    }

    /// Applies a batch of LED changes.
    ///
    /// Every entry is validated against the capability set before anything is written; a batch
    /// naming an unsupported LED fails without side effects.
    pub fn set_leds(&mut self, batch: LedBatch) -> io::Result<()> {
        for &(led, _) in &batch.entries {
            if !self.engine.caps.leds.contains(led) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("device has no {led:?}"),
                ));
            }
        }

        let mut events: Vec<InputEvent> = batch
            .entries
            .iter()
            .map(|&(led, on)| LedEvent::new(led, on).into())
            .collect();
        events.push(SynEvent::new(Syn::REPORT).into());
        self.handle.write_events(&events)?;

        for (led, on) in batch.entries {
            self.engine.state.leds.set(led, on);
        }
        Ok(())
    }
}

impl AsFd for Device<'_> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.handle.fd()
    }
}

impl fmt::Debug for Device<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("fd", &self.handle.fd())
            .field("name", &self.name)
            .field("id", &self.id)
            .field("driver_version", &self.driver_version)
            .finish_non_exhaustive()
    }
}
