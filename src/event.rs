//! Input event types.
//!
//! Every event read from a device is an [`InputEvent`]: a timestamp, a 16-bit type, a 16-bit
//! code, and a 32-bit signed value. [`InputEvent::kind`] converts the raw record into a
//! `match`able [`EventKind`] with a typed wrapper per event type.
//!
//! [`EventCode`] is the companion for *identifying* an entity rather than reporting about one:
//! a `(type, code)` pair used by the capability and state query APIs.

pub(crate) mod codes;

use std::fmt;
use std::ops::Deref;
use std::time::{Duration, SystemTime};

use crate::raw::input_event;

pub use codes::{Abs, EventType, InputProp, Key, Led, Misc, Rel, Repeat, Sound, Switch, Syn};

/// An input event read from (or written to) an event device.
///
/// Use [`InputEvent::kind`] to convert it to a `match`able enum.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct InputEvent(pub(crate) input_event);

impl InputEvent {
    /// Creates an [`InputEvent`] from raw parts, with a zero timestamp.
    #[inline]
    pub const fn new(ty: EventType, raw_code: u16, raw_value: i32) -> Self {
        Self(input_event {
            time: libc::timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
            type_: ty.0,
            code: raw_code,
            value: raw_value,
        })
    }

    /// Creates an all-zero [`InputEvent`].
    ///
    /// Useful as a filler value for read buffers. Decodes as a `SYN_REPORT`.
    #[inline]
    pub const fn zeroed() -> Self {
        Self::new(EventType::SYN, 0, 0)
    }

    /// Returns a copy of `self` with the timestamp set to `time`.
    ///
    /// The kernel record stores microseconds; nanosecond precision is truncated.
    pub fn with_time(mut self, time: SystemTime) -> Self {
        let (sign, dur) = match time.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(dur) => (1, dur),
            Err(e) => (-1, e.duration()),
        };
        self.0.time.tv_sec = sign * dur.as_secs() as libc::time_t;
        self.0.time.tv_usec = dur.subsec_micros() as libc::suseconds_t;
        self
    }

    /// Returns the timestamp of this event.
    ///
    /// The clock this is sampled from defaults to the realtime clock and can be changed with
    /// [`Device::set_clockid`][crate::Device::set_clockid]. Out-of-range kernel values saturate
    /// to [`SystemTime::UNIX_EPOCH`].
    pub fn time(&self) -> SystemTime {
        let sec = self.0.time.tv_sec;
        let usec = self.0.time.tv_usec.clamp(0, 999_999) as u32;
        let dur = Duration::new(sec.unsigned_abs(), usec * 1000);
        let time = if sec >= 0 {
            SystemTime::UNIX_EPOCH.checked_add(dur)
        } else {
            SystemTime::UNIX_EPOCH.checked_sub(dur)
        };
        time.unwrap_or(SystemTime::UNIX_EPOCH)
    }

    pub(crate) fn timeval(&self) -> libc::timeval {
        self.0.time
    }

    pub(crate) fn with_timeval(mut self, time: libc::timeval) -> Self {
        self.0.time = time;
        self
    }

    /// Returns the [`EventType`] of this event.
    #[inline]
    pub fn event_type(&self) -> EventType {
        EventType(self.0.type_)
    }

    /// Returns the raw event code, identifying the key, axis, or other entity the event is
    /// about.
    #[inline]
    pub fn raw_code(&self) -> u16 {
        self.0.code
    }

    /// Returns the raw event value: the new state of the entity identified by the code.
    #[inline]
    pub fn raw_value(&self) -> i32 {
        self.0.value
    }
}

impl fmt::Debug for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            EventKind::Other(_) => f
                .debug_struct("InputEvent")
                .field("type", &self.event_type())
                .field("code", &self.raw_code())
                .field("value", &self.raw_value())
                .finish(),
            kind => kind.fmt(f),
        }
    }
}

/// The decode table: one row per event type this crate interprets.
///
/// Each row ties an [`EventType`] constant to the wrapper struct and [`EventKind`] variant it
/// decodes to, and the macro derives everything from that single table: the wrapper structs
/// (with [`Deref`] to [`InputEvent`] and the reverse [`From`] conversion), the [`EventKind`]
/// enum, and the [`InputEvent::kind`] dispatch. Event types without a row decode to
/// [`EventKind::Other`].
macro_rules! decode_table {
    ( $(
        $( #[$attr:meta] )*
        $ty:ident => $wrapper:ident as $variant:ident,
    )+ ) => {
        /// A decoded [`InputEvent`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[non_exhaustive]
        pub enum EventKind {
            $(
                $( #[$attr] )*
                $variant($wrapper),
            )+

            /// Fallback for event types this crate doesn't decode (force feedback, power).
            #[non_exhaustive] // prevents construction and use in patterns
            Other(InputEvent),
        }

        $(
            $( #[$attr] )*
            #[derive(Clone, Copy, PartialEq, Eq)]
            pub struct $wrapper(InputEvent);

            impl Deref for $wrapper {
                type Target = InputEvent;

                #[inline]
                fn deref(&self) -> &InputEvent {
                    &self.0
                }
            }

            impl From<$wrapper> for InputEvent {
                #[inline]
                fn from(ev: $wrapper) -> Self {
                    ev.0
                }
            }
        )+

        impl InputEvent {
            /// Returns the [`EventKind`] this event encodes, the primary way to examine events.
            #[inline]
            pub fn kind(&self) -> EventKind {
                match self.event_type() {
                    $(
                        EventType::$ty => EventKind::$variant($wrapper(*self)),
                    )+
                    _ => EventKind::Other(*self),
                }
            }
        }

        impl From<EventKind> for InputEvent {
            #[inline]
            fn from(kind: EventKind) -> InputEvent {
                match kind {
                    $(
                        EventKind::$variant(ev) => ev.0,
                    )+
                    EventKind::Other(ev) => ev,
                }
            }
        }
    };
}

decode_table! {
    /// A synchronization marker.
    SYN => SynEvent as Syn,
    /// A key press, release, or repeat.
    KEY => KeyEvent as Key,
    /// A relative axis movement.
    REL => RelEvent as Rel,
    /// An absolute axis change.
    ABS => AbsEvent as Abs,
    /// A switch state change.
    SW => SwitchEvent as Switch,
    /// A miscellaneous event.
    MSC => MiscEvent as Misc,
    /// An LED state change.
    LED => LedEvent as Led,
    /// A change of the autorepeat parameters.
    ///
    /// This does *not* signal a repeating key; those arrive as [`KeyEvent`]s with
    /// [`KeyState::REPEAT`].
    REP => RepeatEvent as Repeat,
    /// A simple sound request.
    SND => SoundEvent as Sound,
}

impl SynEvent {
    #[inline]
    pub fn new(syn: Syn) -> Self {
        Self(InputEvent::new(EventType::SYN, syn.0, 0))
    }

    /// Returns the specific kind of synchronization marker.
    #[inline]
    pub fn syn(&self) -> Syn {
        Syn(self.raw_code())
    }
}
impl fmt::Debug for SynEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynEvent").field("syn", &self.syn()).finish()
    }
}

impl KeyEvent {
    #[inline]
    pub fn new(key: Key, state: KeyState) -> Self {
        Self(InputEvent::new(EventType::KEY, key.0, state.0))
    }

    #[inline]
    pub fn key(&self) -> Key {
        Key(self.raw_code())
    }

    /// Returns whether the key was pressed, released, or repeated.
    #[inline]
    pub fn state(&self) -> KeyState {
        KeyState(self.raw_value())
    }
}
impl fmt::Debug for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEvent")
            .field("key", &self.key())
            .field("state", &self.state())
            .finish()
    }
}

kernel_code! {
    /// State reported by a [`KeyEvent`].
    pub struct KeyState(i32);
    prefix: "";
    values: {
        RELEASED = 0,
        PRESSED = 1,
        /// Still held; the key has auto-repeated.
        REPEAT = 2,
    }
}

impl RelEvent {
    #[inline]
    pub fn new(rel: Rel, delta: i32) -> Self {
        Self(InputEvent::new(EventType::REL, rel.0, delta))
    }

    #[inline]
    pub fn rel(&self) -> Rel {
        Rel(self.raw_code())
    }

    /// Returns the movement delta.
    #[inline]
    pub fn value(&self) -> i32 {
        self.raw_value()
    }
}
impl fmt::Debug for RelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelEvent")
            .field("rel", &self.rel())
            .field("value", &self.value())
            .finish()
    }
}

impl AbsEvent {
    #[inline]
    pub fn new(abs: Abs, value: i32) -> Self {
        Self(InputEvent::new(EventType::ABS, abs.0, value))
    }

    #[inline]
    pub fn abs(&self) -> Abs {
        Abs(self.raw_code())
    }

    #[inline]
    pub fn value(&self) -> i32 {
        self.raw_value()
    }
}
impl fmt::Debug for AbsEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbsEvent")
            .field("abs", &self.abs())
            .field("value", &self.value())
            .finish()
    }
}

impl SwitchEvent {
    #[inline]
    pub fn new(switch: Switch, on: bool) -> Self {
        Self(InputEvent::new(EventType::SW, switch.0, on as i32))
    }

    #[inline]
    pub fn switch(&self) -> Switch {
        Switch(self.raw_code())
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.raw_value() != 0
    }
}
impl fmt::Debug for SwitchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchEvent")
            .field("switch", &self.switch())
            .field("on", &self.is_on())
            .finish()
    }
}

impl MiscEvent {
    #[inline]
    pub fn new(misc: Misc, value: i32) -> Self {
        Self(InputEvent::new(EventType::MSC, misc.0, value))
    }

    #[inline]
    pub fn misc(&self) -> Misc {
        Misc(self.raw_code())
    }
}
impl fmt::Debug for MiscEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiscEvent")
            .field("misc", &self.misc())
            .field("value", &self.raw_value())
            .finish()
    }
}

impl LedEvent {
    #[inline]
    pub fn new(led: Led, on: bool) -> Self {
        Self(InputEvent::new(EventType::LED, led.0, on as i32))
    }

    #[inline]
    pub fn led(&self) -> Led {
        Led(self.raw_code())
    }

    #[inline]
    pub fn is_on(&self) -> bool {
        self.raw_value() != 0
    }
}
impl fmt::Debug for LedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedEvent")
            .field("led", &self.led())
            .field("on", &self.is_on())
            .finish()
    }
}

impl RepeatEvent {
    #[inline]
    pub fn new(repeat: Repeat, value: u32) -> Self {
        Self(InputEvent::new(EventType::REP, repeat.0, value as i32))
    }

    /// Returns which autorepeat parameter this event adjusts.
    #[inline]
    pub fn repeat(&self) -> Repeat {
        Repeat(self.raw_code())
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.raw_value() as u32
    }
}
impl fmt::Debug for RepeatEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatEvent")
            .field("repeat", &self.repeat())
            .field("value", &self.value())
            .finish()
    }
}

impl SoundEvent {
    #[inline]
    pub fn new(sound: Sound, playing: bool) -> Self {
        Self(InputEvent::new(EventType::SND, sound.0, playing as i32))
    }

    #[inline]
    pub fn sound(&self) -> Sound {
        Sound(self.raw_code())
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.raw_value() != 0
    }
}
impl fmt::Debug for SoundEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundEvent")
            .field("sound", &self.sound())
            .field("playing", &self.is_playing())
            .finish()
    }
}

/// A `(type, code)` pair naming one entity a device can report about.
///
/// Used by the capability queries ([`Device::has_event_code`]) and the cached state accessors
/// ([`Device::event_value`], [`Device::set_event_value`]).
///
/// [`Device::has_event_code`]: crate::Device::has_event_code
/// [`Device::event_value`]: crate::Device::event_value
/// [`Device::set_event_value`]: crate::Device::set_event_value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EventCode {
    Syn(Syn),
    Key(Key),
    Rel(Rel),
    Abs(Abs),
    Switch(Switch),
    Misc(Misc),
    Led(Led),
    Repeat(Repeat),
    Sound(Sound),
}

impl EventCode {
    /// Returns the [`EventType`] this code belongs to.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Syn(_) => EventType::SYN,
            Self::Key(_) => EventType::KEY,
            Self::Rel(_) => EventType::REL,
            Self::Abs(_) => EventType::ABS,
            Self::Switch(_) => EventType::SW,
            Self::Misc(_) => EventType::MSC,
            Self::Led(_) => EventType::LED,
            Self::Repeat(_) => EventType::REP,
            Self::Sound(_) => EventType::SND,
        }
    }
}

impl From<Syn> for EventCode {
    fn from(value: Syn) -> Self {
        Self::Syn(value)
    }
}
impl From<Key> for EventCode {
    fn from(value: Key) -> Self {
        Self::Key(value)
    }
}
impl From<Rel> for EventCode {
    fn from(value: Rel) -> Self {
        Self::Rel(value)
    }
}
impl From<Abs> for EventCode {
    fn from(value: Abs) -> Self {
        Self::Abs(value)
    }
}
impl From<Switch> for EventCode {
    fn from(value: Switch) -> Self {
        Self::Switch(value)
    }
}
impl From<Misc> for EventCode {
    fn from(value: Misc) -> Self {
        Self::Misc(value)
    }
}
impl From<Led> for EventCode {
    fn from(value: Led) -> Self {
        Self::Led(value)
    }
}
impl From<Repeat> for EventCode {
    fn from(value: Repeat) -> Self {
        Self::Repeat(value)
    }
}
impl From<Sound> for EventCode {
    fn from(value: Sound) -> Self {
        Self::Sound(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        // The read path reinterprets byte buffers as events, which requires the record to be
        // exactly the kernel's: a timeval plus three packed fields, no padding.
        assert_eq!(
            size_of::<InputEvent>(),
            size_of::<libc::timeval>() + size_of::<u16>() * 2 + size_of::<i32>(),
        );
    }

    #[test]
    fn timestamps() {
        let ev = InputEvent::zeroed().with_time(SystemTime::UNIX_EPOCH);
        assert_eq!(ev.time(), SystemTime::UNIX_EPOCH);

        let later = SystemTime::UNIX_EPOCH + Duration::from_micros(5_000_123);
        assert_eq!(InputEvent::zeroed().with_time(later).time(), later);

        // The kernel should never produce negative microseconds; saturate instead of panicking.
        let mut bad = InputEvent::zeroed();
        bad.0.time.tv_usec = -1;
        assert_eq!(bad.time(), SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn kinds() {
        let ev: InputEvent = KeyEvent::new(Key::KEY_A, KeyState::PRESSED).into();
        match ev.kind() {
            EventKind::Key(key) => {
                assert_eq!(key.key(), Key::KEY_A);
                assert_eq!(key.state(), KeyState::PRESSED);
            }
            other => panic!("expected a key event, got {other:?}"),
        }

        let ev = InputEvent::new(EventType::FF, 1, 1);
        assert!(matches!(ev.kind(), EventKind::Other(_)));
    }
}
