//! The state cache: the last observed value of everything the device retains.
//!
//! Keys, LEDs, and switches are bit sets; absolute axes are plain values; multitouch data lives
//! in a per-slot table ([`SlotAxes`]). Relative axes and miscellaneous events carry no retained
//! state and are never stored.

use crate::bits::BitSet;
use crate::caps::ABS_COUNT;
use crate::event::{Abs, EventKind, InputEvent, Key, KeyState, Led, Repeat, Switch};
use crate::key_repeat::KeyRepeat;

/// The largest number of multitouch slots the cache will track.
///
/// Devices may report more; anything beyond this ceiling is ignored, both at attach and during
/// resynchronization.
pub(crate) const MAX_SLOTS: usize = 60;

/// Per-slot multitouch values.
///
/// One row of `nslots` values per supported `ABS_MT_*` code (in ascending code order), plus the
/// index of the slot that incoming `MT_*` events currently apply to. A slot is *active* while its
/// `ABS_MT_TRACKING_ID` value is nonnegative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlotAxes {
    codes: Vec<Abs>,
    /// `codes.len()` rows of `nslots` values each, in `codes` order.
    values: Vec<i32>,
    nslots: usize,
    current: usize,
}

impl SlotAxes {
    /// A table for a device without (usable) multitouch slots.
    pub fn empty() -> Self {
        Self {
            codes: Vec::new(),
            values: Vec::new(),
            nslots: 0,
            current: 0,
        }
    }

    /// Creates a zero-filled table for `codes`, clamping the slot count to [`MAX_SLOTS`].
    pub fn with_layout(codes: Vec<Abs>, nslots: usize) -> Self {
        if nslots > MAX_SLOTS {
            log::warn!("device reports {nslots} multitouch slots, tracking only {MAX_SLOTS}");
        }
        let nslots = nslots.min(MAX_SLOTS);
        Self {
            values: vec![0; codes.len() * nslots],
            codes,
            nslots,
            current: 0,
        }
    }

    pub fn nslots(&self) -> usize {
        self.nslots
    }

    pub fn codes(&self) -> &[Abs] {
        &self.codes
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Selects the slot subsequent writes apply to. Not range-checked: the kernel may select
    /// slots this table doesn't track, in which case writes are dropped.
    pub fn set_current(&mut self, slot: usize) {
        self.current = slot;
    }

    /// Returns the values of `code` for every slot, or `None` if the code isn't tracked.
    pub fn row(&self, code: Abs) -> Option<&[i32]> {
        let idx = self.codes.iter().position(|c| *c == code)?;
        Some(&self.values[idx * self.nslots..][..self.nslots])
    }

    pub fn row_mut(&mut self, code: Abs) -> Option<&mut [i32]> {
        let idx = self.codes.iter().position(|c| *c == code)?;
        Some(&mut self.values[idx * self.nslots..][..self.nslots])
    }

    /// Returns the value of `code` in `slot`, or `None` when either is unknown.
    pub fn value(&self, slot: usize, code: Abs) -> Option<i32> {
        self.row(code)?.get(slot).copied()
    }

    /// Stores `value`, returning whether the write landed (known code, tracked slot).
    pub fn set(&mut self, slot: usize, code: Abs, value: i32) -> bool {
        match self.row_mut(code).and_then(|row| row.get_mut(slot)) {
            Some(dest) => {
                *dest = value;
                true
            }
            None => false,
        }
    }
}

/// The last observed value of every retained `(type, code)` pair.
#[derive(Debug, Clone)]
pub(crate) struct DeviceState {
    /// Set = key held down.
    pub keys: BitSet<Key>,
    /// Set = LED lit.
    pub leds: BitSet<Led>,
    /// Set = switch closed/active.
    pub switches: BitSet<Switch>,
    /// Values of the non-multitouch absolute axes.
    pub abs: [i32; ABS_COUNT],
    pub slots: SlotAxes,
    pub rep: Option<KeyRepeat>,
}

impl DeviceState {
    pub fn new() -> Self {
        Self {
            keys: BitSet::new(),
            leds: BitSet::new(),
            switches: BitSet::new(),
            abs: [0; ABS_COUNT],
            slots: SlotAxes::empty(),
            rep: None,
        }
    }

    /// Returns whether multitouch events get per-slot treatment.
    ///
    /// False both for devices without slots and for *fake multitouch* devices, whose `MT_*`
    /// codes behave like ordinary absolute axes.
    pub fn has_slots(&self) -> bool {
        self.slots.nslots() > 0
    }

    /// Applies one kernel event to the cache.
    ///
    /// The kernel is authoritative: no value or range validation happens here. Events that carry
    /// no retained state (relative axes, misc, sounds, synchronization) leave the cache
    /// untouched.
    pub fn apply(&mut self, ev: &InputEvent) {
        match ev.kind() {
            EventKind::Key(key) => {
                // A repeat still means "held down".
                self.keys.set(key.key(), key.state() != KeyState::RELEASED);
            }
            EventKind::Led(led) => {
                self.leds.set(led.led(), led.is_on());
            }
            EventKind::Switch(switch) => {
                self.switches.set(switch.switch(), switch.is_on());
            }
            EventKind::Abs(abs) => {
                let code = abs.abs();
                if self.has_slots() && code == Abs::MT_SLOT {
                    self.slots.set_current(abs.value().max(0) as usize);
                } else if self.has_slots() && code.is_slot_axis() {
                    let slot = self.slots.current();
                    self.slots.set(slot, code, abs.value());
                } else {
                    self.abs[code.raw() as usize] = abs.value();
                }
            }
            EventKind::Repeat(rep) => {
                let mut new = self.rep.unwrap_or(KeyRepeat::new(0, 0));
                match rep.repeat() {
                    Repeat::DELAY => new.delay = rep.value(),
                    Repeat::PERIOD => new.period = rep.value(),
                    _ => return,
                }
                self.rep = Some(new);
            }
            _ => {}
        }
    }
}
