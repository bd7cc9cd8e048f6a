//! The capability set: which event types, codes, and properties a device supports, plus the
//! per-axis parameters of its absolute axes.
//!
//! Populated once at attach from the capability `ioctl`s; afterwards it only changes through the
//! explicit enable/disable calls on [`Device`][crate::Device].

use crate::abs_info::AbsInfo;
use crate::bits::BitSet;
use crate::event::{Abs, EventCode, EventType, InputEvent, InputProp, Key, Led, Misc, Rel, Sound, Switch};

/// Number of absolute axis codes (`ABS_MAX + 1`).
pub(crate) const ABS_COUNT: usize = Abs::MAX.0 as usize + 1;

/// Everything a device claims to support.
#[derive(Debug, Clone)]
pub(crate) struct Capabilities {
    pub types: BitSet<EventType>,
    pub props: BitSet<InputProp>,
    pub keys: BitSet<Key>,
    pub rels: BitSet<Rel>,
    pub abs: BitSet<Abs>,
    pub switches: BitSet<Switch>,
    pub miscs: BitSet<Misc>,
    pub leds: BitSet<Led>,
    pub sounds: BitSet<Sound>,
    /// Axis parameters for every code in `abs`. Entries of disabled axes are meaningless.
    pub abs_params: Box<[AbsInfo; ABS_COUNT]>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self {
            types: BitSet::new(),
            props: BitSet::new(),
            keys: BitSet::new(),
            rels: BitSet::new(),
            abs: BitSet::new(),
            switches: BitSet::new(),
            miscs: BitSet::new(),
            leds: BitSet::new(),
            sounds: BitSet::new(),
            abs_params: Box::new([AbsInfo::ZERO; ABS_COUNT]),
        }
    }

    /// Returns whether the device supports `code`.
    ///
    /// Synchronization codes are always supported; autorepeat codes are supported whenever the
    /// device has [`EventType::REP`] (there is no per-code bitmap for them).
    pub fn has_code(&self, code: EventCode) -> bool {
        match code {
            EventCode::Syn(_) => true,
            EventCode::Key(key) => self.keys.contains(key),
            EventCode::Rel(rel) => self.rels.contains(rel),
            EventCode::Abs(abs) => self.abs.contains(abs),
            EventCode::Switch(switch) => self.switches.contains(switch),
            EventCode::Misc(misc) => self.miscs.contains(misc),
            EventCode::Led(led) => self.leds.contains(led),
            EventCode::Repeat(_) => self.types.contains(EventType::REP),
            EventCode::Sound(sound) => self.sounds.contains(sound),
        }
    }

    /// Returns whether an incoming event passes the capability filter.
    ///
    /// Synchronization events always pass. Events of types without a per-code bitmap (repeat,
    /// force feedback, power) pass whenever the type itself is enabled.
    pub fn admits(&self, ev: &InputEvent) -> bool {
        let ty = ev.event_type();
        match ty {
            EventType::SYN => true,
            EventType::KEY => self.keys.contains(Key::from_raw(ev.raw_code())),
            EventType::REL => self.rels.contains(Rel::from_raw(ev.raw_code())),
            EventType::ABS => self.abs.contains(Abs::from_raw(ev.raw_code())),
            EventType::SW => self.switches.contains(Switch::from_raw(ev.raw_code())),
            EventType::MSC => self.miscs.contains(Misc::from_raw(ev.raw_code())),
            EventType::LED => self.leds.contains(Led::from_raw(ev.raw_code())),
            EventType::SND => self.sounds.contains(Sound::from_raw(ev.raw_code())),
            _ => self.types.contains(ty),
        }
    }

    /// Adds `code` to the set, enabling its type as well.
    ///
    /// Absolute axis parameters are stored alongside the bit; `None` leaves the previous
    /// parameters in place (used when re-enabling).
    pub fn insert_code(&mut self, code: EventCode, abs_params: Option<AbsInfo>) {
        self.types.insert(code.event_type());
        match code {
            EventCode::Syn(_) => {}
            EventCode::Key(key) => {
                self.keys.insert(key);
            }
            EventCode::Rel(rel) => {
                self.rels.insert(rel);
            }
            EventCode::Abs(abs) => {
                self.abs.insert(abs);
                if let Some(params) = abs_params {
                    self.abs_params[abs.raw() as usize] = params;
                }
            }
            EventCode::Switch(switch) => {
                self.switches.insert(switch);
            }
            EventCode::Misc(misc) => {
                self.miscs.insert(misc);
            }
            EventCode::Led(led) => {
                self.leds.insert(led);
            }
            EventCode::Repeat(_) => {}
            EventCode::Sound(sound) => {
                self.sounds.insert(sound);
            }
        }
    }

    /// Removes `code` from the set. Removing an absent code is a no-op.
    ///
    /// The caller is responsible for rejecting synchronization codes beforehand.
    pub fn remove_code(&mut self, code: EventCode) {
        match code {
            EventCode::Syn(_) => {}
            EventCode::Key(key) => {
                self.keys.remove(key);
            }
            EventCode::Rel(rel) => {
                self.rels.remove(rel);
            }
            EventCode::Abs(abs) => {
                self.abs.remove(abs);
            }
            EventCode::Switch(switch) => {
                self.switches.remove(switch);
            }
            EventCode::Misc(misc) => {
                self.miscs.remove(misc);
            }
            EventCode::Led(led) => {
                self.leds.remove(led);
            }
            EventCode::Repeat(_) => {
                self.types.remove(EventType::REP);
            }
            EventCode::Sound(sound) => {
                self.sounds.remove(sound);
            }
        }
    }

    /// Returns the stored parameters of `abs`, or `None` if the axis is disabled.
    pub fn abs_params(&self, abs: Abs) -> Option<AbsInfo> {
        if self.abs.contains(abs) {
            Some(self.abs_params[abs.raw() as usize])
        } else {
            None
        }
    }
}
