#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations)]

#[macro_use]
mod macros;

mod abs_info;
pub mod bits;
mod caps;
mod dev;
mod device;
mod engine;
pub mod event;
mod input_id;
mod key_repeat;
mod raw;
mod state;
mod util;
mod version;

pub use abs_info::AbsInfo;
pub use device::{Device, LedBatch, ReadFlags, ReadStatus};
pub use event::{
    Abs, EventCode, EventType, InputEvent, InputProp, Key, Led, Misc, Rel, Repeat, Sound, Switch,
    Syn,
};
pub use input_id::{Bus, InputId};
pub use key_repeat::KeyRepeat;
pub use version::Version;
