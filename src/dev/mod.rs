//! The device module contains the drivers for each supported device family.
//!
//! In most cases you will not need anything from here explicitly, the exposed types at the root of
//! the crate should be enough.

pub mod gpio;
pub mod pcf8574;
