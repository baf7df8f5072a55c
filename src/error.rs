use crate::Vpin;

/// Errors surfaced synchronously to the caller.
///
/// Bus failures are not part of this type.  They are recorded in the
/// transaction status of the affected device and recovered by its scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("pin count must be between 1 and 8")]
    InvalidPinCount,
    #[error("bus address must be 7 bits")]
    InvalidAddress,
    #[error("virtual pin {vpin} is already in use")]
    Overlap { vpin: Vpin },
    #[error("no room left for another device")]
    RegistryFull,
    #[error("virtual pin {0} is not mapped to any device")]
    NotFound(Vpin),
    #[error("pin configuration not supported by the device")]
    Unsupported,
}

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}
