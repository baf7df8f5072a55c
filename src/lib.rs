//! Virtual pins for model-railway control stations.
//!
//! Command logic reads and writes abstract pin numbers ([`Vpin`]).  A [`Registry`] maps each of
//! them to the device that owns it, which may be a pin of the microcontroller itself
//! ([`GpioPin`]) or one bit of an I2C port-expander ([`Pcf8574`]).  Expanders are never waited
//! on: their bus traffic goes through a [`TransactionQueue`] and is picked up again from the
//! scheduler's periodic [`tick()`][IoDevice::tick].
#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "std", not(test)))]
extern crate std;

mod bus;
mod common;
pub mod dev;
mod error;
mod mutex;
mod pin;
mod registry;
#[cfg(feature = "async")]
pub mod scheduler;
#[cfg(test)]
mod test_util;

pub use bus::{BlockingQueue, Operation, Request, Status, TransactionQueue, MAX_TRANSFER};
pub use common::{ConfigKind, Description, IoDevice, Vpin};
pub use error::Error;
pub use mutex::{IoMutex, Shared};
pub use pin::Pin;
pub use registry::{Dispatch, Registry};

pub use dev::gpio::GpioPin;
pub use dev::pcf8574::{DeviceState, ExpanderConfig, Pcf8574, DEFAULT_SCAN_INTERVAL_US};
#[cfg(feature = "async")]
pub use scheduler::Scheduler;
