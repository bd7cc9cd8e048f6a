//! Event types, codes, and device properties.
//!
//! Ported from `linux/input-event-codes.h`. The key/button table carries the common keyboard and
//! button blocks; codes without a named constant are still fully usable through
//! [`Key::from_raw`].

kernel_code! {
    /// `INPUT_PROP_*`: input device properties.
    ///
    /// Properties describe the device as a whole rather than individual axes or buttons. Many
    /// devices set none of them.
    pub struct InputProp(u8);
    prefix: "INPUT_PROP_";
    bitmap: 0x1f;
    values: {
        /// Input position needs an on-screen pointer (touchpads, drawing tablets).
        POINTER = 0x00,
        /// Absolute axes map directly onto the screen (touchscreens).
        DIRECT = 0x01,
        /// Button clicks are registered by pressing down on the touch surface.
        BUTTONPAD = 0x02,
        /// The device only reports a bounding rectangle of all contacts.
        SEMI_MT = 0x03,
        TOPBUTTONPAD = 0x04,
        POINTING_STICK = 0x05,
        /// The main absolute axes report acceleration, not position.
        ACCELEROMETER = 0x06,
    }
}

kernel_code! {
    /// `EV_*`: the broad category of an [`InputEvent`][crate::event::InputEvent].
    pub struct EventType(u16);
    prefix: "EV_";
    bitmap: 0x1f;
    values: {
        /// Synchronization markers delimiting and qualifying event batches.
        SYN = 0x00,
        /// Key or button state changes.
        KEY = 0x01,
        /// Relative axis movement (mouse motion, wheels).
        REL = 0x02,
        /// Absolute axis changes (joysticks, touch positions).
        ABS = 0x03,
        /// Miscellaneous events (scancodes, device timestamps).
        MSC = 0x04,
        /// Binary switch changes (lid closed, headphone inserted).
        SW  = 0x05,
        /// LED state reports and requests.
        LED = 0x11,
        /// Simple sound requests (beeps).
        SND = 0x12,
        /// Autorepeat parameter changes.
        REP = 0x14,
        /// Force-feedback control (not interpreted by this crate).
        FF  = 0x15,
        /// Power management events (not interpreted by this crate).
        PWR = 0x16,
        /// Force-feedback status reports (not interpreted by this crate).
        FF_STATUS = 0x17,
    }
}

impl EventType {
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

kernel_code! {
    /// `SYN_*`: synchronization marker codes.
    ///
    /// The *value* of a synchronization event carries no meaning; only the code and the position
    /// in the stream matter.
    pub struct Syn(u16);
    prefix: "SYN_";
    values: {
        /// Frame boundary: all preceding events form one coherent update.
        REPORT = 0,
        CONFIG = 1,
        /// Separates contacts in the legacy ("type A") multitouch protocol.
        MT_REPORT = 2,
        /// The kernel ran out of buffer space and discarded events; the receiver's view of the
        /// device state is now stale and must be refetched.
        DROPPED = 3,
    }
}

impl Syn {
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

kernel_code! {
    /// `KEY_*` / `BTN_*`: a key or button identifier.
    ///
    /// The named constants cover the common keyboard and button blocks; any other code can be
    /// produced with [`Key::from_raw`] and participates in capability and state tracking all the
    /// same.
    pub struct Key(u16);
    prefix: "";
    bitmap: 0x2ff;
    values: {
        KEY_RESERVED   = 0,
        KEY_ESC        = 1,
        KEY_1          = 2,
        KEY_2          = 3,
        KEY_3          = 4,
        KEY_4          = 5,
        KEY_5          = 6,
        KEY_6          = 7,
        KEY_7          = 8,
        KEY_8          = 9,
        KEY_9          = 10,
        KEY_0          = 11,
        KEY_MINUS      = 12,
        KEY_EQUAL      = 13,
        KEY_BACKSPACE  = 14,
        KEY_TAB        = 15,
        KEY_Q          = 16,
        KEY_W          = 17,
        KEY_E          = 18,
        KEY_R          = 19,
        KEY_T          = 20,
        KEY_Y          = 21,
        KEY_U          = 22,
        KEY_I          = 23,
        KEY_O          = 24,
        KEY_P          = 25,
        KEY_LEFTBRACE  = 26,
        KEY_RIGHTBRACE = 27,
        KEY_ENTER      = 28,
        KEY_LEFTCTRL   = 29,
        KEY_A          = 30,
        KEY_S          = 31,
        KEY_D          = 32,
        KEY_F          = 33,
        KEY_G          = 34,
        KEY_H          = 35,
        KEY_J          = 36,
        KEY_K          = 37,
        KEY_L          = 38,
        KEY_SEMICOLON  = 39,
        KEY_APOSTROPHE = 40,
        KEY_GRAVE      = 41,
        KEY_LEFTSHIFT  = 42,
        KEY_BACKSLASH  = 43,
        KEY_Z          = 44,
        KEY_X          = 45,
        KEY_C          = 46,
        KEY_V          = 47,
        KEY_B          = 48,
        KEY_N          = 49,
        KEY_M          = 50,
        KEY_COMMA      = 51,
        KEY_DOT        = 52,
        KEY_SLASH      = 53,
        KEY_RIGHTSHIFT = 54,
        KEY_KPASTERISK = 55,
        KEY_LEFTALT    = 56,
        KEY_SPACE      = 57,
        KEY_CAPSLOCK   = 58,
        KEY_F1         = 59,
        KEY_F2         = 60,
        KEY_F3         = 61,
        KEY_F4         = 62,
        KEY_F5         = 63,
        KEY_F6         = 64,
        KEY_F7         = 65,
        KEY_F8         = 66,
        KEY_F9         = 67,
        KEY_F10        = 68,
        KEY_NUMLOCK    = 69,
        KEY_SCROLLLOCK = 70,
        KEY_KP7        = 71,
        KEY_KP8        = 72,
        KEY_KP9        = 73,
        KEY_KPMINUS    = 74,
        KEY_KP4        = 75,
        KEY_KP5        = 76,
        KEY_KP6        = 77,
        KEY_KPPLUS     = 78,
        KEY_KP1        = 79,
        KEY_KP2        = 80,
        KEY_KP3        = 81,
        KEY_KP0        = 82,
        KEY_KPDOT      = 83,
        KEY_ZENKAKUHANKAKU = 85,
        KEY_102ND      = 86,
        KEY_F11        = 87,
        KEY_F12        = 88,
        KEY_RO         = 89,
        KEY_KATAKANA   = 90,
        KEY_HIRAGANA   = 91,
        KEY_HENKAN     = 92,
        KEY_KATAKANAHIRAGANA = 93,
        KEY_MUHENKAN   = 94,
        KEY_KPJPCOMMA  = 95,
        KEY_KPENTER    = 96,
        KEY_RIGHTCTRL  = 97,
        KEY_KPSLASH    = 98,
        KEY_SYSRQ      = 99,
        KEY_RIGHTALT   = 100,
        KEY_LINEFEED   = 101,
        KEY_HOME       = 102,
        KEY_UP         = 103,
        KEY_PAGEUP     = 104,
        KEY_LEFT       = 105,
        KEY_RIGHT      = 106,
        KEY_END        = 107,
        KEY_DOWN       = 108,
        KEY_PAGEDOWN   = 109,
        KEY_INSERT     = 110,
        KEY_DELETE     = 111,
        KEY_MACRO      = 112,
        KEY_MUTE       = 113,
        KEY_VOLUMEDOWN = 114,
        KEY_VOLUMEUP   = 115,
        KEY_POWER      = 116,
        KEY_KPEQUAL    = 117,
        KEY_KPPLUSMINUS = 118,
        KEY_PAUSE      = 119,
        KEY_SCALE      = 120,
        KEY_KPCOMMA    = 121,
        KEY_HANGEUL    = 122,
        KEY_HANJA      = 123,
        KEY_YEN        = 124,
        KEY_LEFTMETA   = 125,
        KEY_RIGHTMETA  = 126,
        KEY_COMPOSE    = 127,

        BTN_0          = 0x100,
        BTN_1          = 0x101,
        BTN_2          = 0x102,
        BTN_3          = 0x103,
        BTN_4          = 0x104,
        BTN_5          = 0x105,
        BTN_6          = 0x106,
        BTN_7          = 0x107,
        BTN_8          = 0x108,
        BTN_9          = 0x109,
        BTN_LEFT       = 0x110,
        BTN_RIGHT      = 0x111,
        BTN_MIDDLE     = 0x112,
        BTN_SIDE       = 0x113,
        BTN_EXTRA      = 0x114,
        BTN_FORWARD    = 0x115,
        BTN_BACK       = 0x116,
        BTN_TASK       = 0x117,
        BTN_TRIGGER    = 0x120,
        BTN_THUMB      = 0x121,
        BTN_THUMB2     = 0x122,
        BTN_TOP        = 0x123,
        BTN_TOP2       = 0x124,
        BTN_PINKIE     = 0x125,
        BTN_BASE       = 0x126,
        BTN_BASE2      = 0x127,
        BTN_BASE3      = 0x128,
        BTN_BASE4      = 0x129,
        BTN_BASE5      = 0x12a,
        BTN_BASE6      = 0x12b,
        BTN_DEAD       = 0x12f,
        BTN_SOUTH      = 0x130,
        BTN_EAST       = 0x131,
        BTN_C          = 0x132,
        BTN_NORTH      = 0x133,
        BTN_WEST       = 0x134,
        BTN_Z          = 0x135,
        BTN_TL         = 0x136,
        BTN_TR         = 0x137,
        BTN_TL2        = 0x138,
        BTN_TR2        = 0x139,
        BTN_SELECT     = 0x13a,
        BTN_START      = 0x13b,
        BTN_MODE       = 0x13c,
        BTN_THUMBL     = 0x13d,
        BTN_THUMBR     = 0x13e,
        BTN_TOOL_PEN   = 0x140,
        BTN_TOOL_RUBBER = 0x141,
        BTN_TOOL_BRUSH = 0x142,
        BTN_TOOL_PENCIL = 0x143,
        BTN_TOOL_AIRBRUSH = 0x144,
        BTN_TOOL_FINGER = 0x145,
        BTN_TOOL_MOUSE = 0x146,
        BTN_TOOL_LENS  = 0x147,
        BTN_TOOL_QUINTTAP = 0x148,
        BTN_STYLUS3    = 0x149,
        BTN_TOUCH      = 0x14a,
        BTN_STYLUS     = 0x14b,
        BTN_STYLUS2    = 0x14c,
        BTN_TOOL_DOUBLETAP = 0x14d,
        BTN_TOOL_TRIPLETAP = 0x14e,
        BTN_TOOL_QUADTAP = 0x14f,
        BTN_GEAR_DOWN  = 0x150,
        BTN_GEAR_UP    = 0x151,
        BTN_DPAD_UP    = 0x220,
        BTN_DPAD_DOWN  = 0x221,
        BTN_DPAD_LEFT  = 0x222,
        BTN_DPAD_RIGHT = 0x223,
    }
}

impl Key {
    #[inline]
    pub const fn from_raw(code: u16) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

kernel_code! {
    /// `REL_*`: a relative axis identifier.
    pub struct Rel(u16);
    prefix: "REL_";
    bitmap: 0x0f;
    values: {
        X             = 0x00,
        Y             = 0x01,
        Z             = 0x02,
        RX            = 0x03,
        RY            = 0x04,
        RZ            = 0x05,
        HWHEEL        = 0x06,
        DIAL          = 0x07,
        WHEEL         = 0x08,
        MISC          = 0x09,
        RESERVED      = 0x0a,
        WHEEL_HI_RES  = 0x0b,
        HWHEEL_HI_RES = 0x0c,
    }
}

impl Rel {
    #[inline]
    pub const fn from_raw(code: u16) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

kernel_code! {
    /// `ABS_*`: an absolute axis identifier.
    ///
    /// Codes from [`Abs::MT_SLOT`] upward belong to the multitouch protocol: `MT_SLOT` selects
    /// the contact slot that subsequent `MT_*` events apply to.
    pub struct Abs(u16);
    prefix: "ABS_";
    bitmap: 0x3f;
    values: {
        X              = 0x00,
        Y              = 0x01,
        Z              = 0x02,
        RX             = 0x03,
        RY             = 0x04,
        RZ             = 0x05,
        THROTTLE       = 0x06,
        RUDDER         = 0x07,
        WHEEL          = 0x08,
        GAS            = 0x09,
        BRAKE          = 0x0a,
        HAT0X          = 0x10,
        HAT0Y          = 0x11,
        HAT1X          = 0x12,
        HAT1Y          = 0x13,
        HAT2X          = 0x14,
        HAT2Y          = 0x15,
        HAT3X          = 0x16,
        HAT3Y          = 0x17,
        PRESSURE       = 0x18,
        DISTANCE       = 0x19,
        TILT_X         = 0x1a,
        TILT_Y         = 0x1b,
        TOOL_WIDTH     = 0x1c,
        VOLUME         = 0x20,
        PROFILE        = 0x21,
        MISC           = 0x28,
        RESERVED       = 0x2e,
        /// Selects the multitouch slot that following `MT_*` events apply to.
        MT_SLOT        = 0x2f,
        MT_TOUCH_MAJOR = 0x30,
        MT_TOUCH_MINOR = 0x31,
        MT_WIDTH_MAJOR = 0x32,
        MT_WIDTH_MINOR = 0x33,
        MT_ORIENTATION = 0x34,
        MT_POSITION_X  = 0x35,
        MT_POSITION_Y  = 0x36,
        MT_TOOL_TYPE   = 0x37,
        MT_BLOB_ID     = 0x38,
        /// Contact identity: nonnegative while a contact is alive, `-1` when the slot is empty.
        MT_TRACKING_ID = 0x39,
        MT_PRESSURE    = 0x3a,
        MT_DISTANCE    = 0x3b,
        MT_TOOL_X      = 0x3c,
        MT_TOOL_Y      = 0x3d,
    }
}

impl Abs {
    #[inline]
    pub const fn from_raw(code: u16) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns whether this code stores per-slot multitouch data (any `MT_*` code above
    /// [`Abs::MT_SLOT`]).
    #[inline]
    pub const fn is_slot_axis(self) -> bool {
        self.0 > Self::MT_SLOT.0 && self.0 <= Self::MAX.0
    }
}

kernel_code! {
    /// `SW_*`: a binary switch.
    pub struct Switch(u16);
    prefix: "SW_";
    bitmap: 0x11;
    values: {
        LID                  = 0x00,
        TABLET_MODE          = 0x01,
        HEADPHONE_INSERT     = 0x02,
        RFKILL_ALL           = 0x03,
        MICROPHONE_INSERT    = 0x04,
        DOCK                 = 0x05,
        LINEOUT_INSERT       = 0x06,
        JACK_PHYSICAL_INSERT = 0x07,
        VIDEOOUT_INSERT      = 0x08,
        CAMERA_LENS_COVER    = 0x09,
        KEYPAD_SLIDE         = 0x0a,
        FRONT_PROXIMITY      = 0x0b,
        ROTATE_LOCK          = 0x0c,
        LINEIN_INSERT        = 0x0d,
        MUTE_DEVICE          = 0x0e,
        PEN_INSERTED         = 0x0f,
        MACHINE_COVER        = 0x10,
        USB_INSERT           = 0x11,
    }
}

impl Switch {
    #[inline]
    pub const fn from_raw(code: u16) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

kernel_code! {
    /// `MSC_*`: a miscellaneous event code.
    pub struct Misc(u16);
    prefix: "MSC_";
    bitmap: 0x07;
    values: {
        SERIAL    = 0x00,
        PULSELED  = 0x01,
        GESTURE   = 0x02,
        RAW       = 0x03,
        /// Scancode of the key event that follows.
        SCAN      = 0x04,
        /// Device-generated microsecond timestamp.
        TIMESTAMP = 0x05,
    }
}

impl Misc {
    #[inline]
    pub const fn from_raw(code: u16) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

kernel_code! {
    /// `LED_*`: a device LED.
    pub struct Led(u16);
    prefix: "LED_";
    bitmap: 0x0f;
    values: {
        NUML     = 0x00,
        CAPSL    = 0x01,
        SCROLLL  = 0x02,
        COMPOSE  = 0x03,
        KANA     = 0x04,
        SLEEP    = 0x05,
        SUSPEND  = 0x06,
        MUTE     = 0x07,
        MISC     = 0x08,
        MAIL     = 0x09,
        CHARGING = 0x0a,
    }
}

impl Led {
    #[inline]
    pub const fn from_raw(code: u16) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

kernel_code! {
    /// `REP_*`: an autorepeat parameter.
    ///
    /// There is no capability bitmap for these; a device either supports autorepeat
    /// ([`EventType::REP`]) or it does not.
    pub struct Repeat(u16);
    prefix: "REP_";
    values: {
        DELAY  = 0x00,
        PERIOD = 0x01,
    }
}

impl Repeat {
    #[inline]
    pub const fn from_raw(code: u16) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

kernel_code! {
    /// `SND_*`: a simple sound effect.
    pub struct Sound(u16);
    prefix: "SND_";
    bitmap: 0x07;
    values: {
        CLICK = 0x00,
        BELL  = 0x01,
        TONE  = 0x02,
    }
}

impl Sound {
    #[inline]
    pub const fn from_raw(code: u16) -> Self {
        Self(code)
    }

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_repr() {
        assert_eq!(format!("{:?}", EventType::SYN), "EV_SYN");
        assert_eq!(format!("{:?}", EventType::from_raw(0x1e)), "EventType(0x1e)");
        assert_eq!(format!("{:?}", Syn::DROPPED), "SYN_DROPPED");
        assert_eq!(format!("{:?}", Key::KEY_A), "KEY_A");
        assert_eq!(format!("{:?}", Key::BTN_TOUCH), "BTN_TOUCH");
        assert_eq!(format!("{:?}", Key::from_raw(0x2ff)), "Key(0x2ff)");
        assert_eq!(format!("{:?}", Abs::MT_TRACKING_ID), "ABS_MT_TRACKING_ID");
        assert_eq!(format!("{:?}", Rel::WHEEL), "REL_WHEEL");
        assert_eq!(format!("{:?}", Switch::LID), "SW_LID");
        assert_eq!(format!("{:?}", Led::CAPSL), "LED_CAPSL");
        assert_eq!(format!("{:?}", Repeat::PERIOD), "REP_PERIOD");
        assert_eq!(format!("{:?}", Sound::BELL), "SND_BELL");
        assert_eq!(format!("{:?}", InputProp::DIRECT), "INPUT_PROP_DIRECT");
    }

    #[test]
    fn slot_axes() {
        assert!(!Abs::MT_SLOT.is_slot_axis());
        assert!(Abs::MT_TOUCH_MAJOR.is_slot_axis());
        assert!(Abs::MT_TRACKING_ID.is_slot_axis());
        assert!(Abs::MT_TOOL_Y.is_slot_axis());
        assert!(!Abs::X.is_slot_axis());
        assert!(!Abs::RESERVED.is_slot_axis());
    }
}
