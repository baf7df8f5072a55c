use embedded_hal::digital::{self as hal_digital, PinState};

use crate::{ConfigKind, Dispatch, Error, IoMutex, Vpin};

/// Representation of a virtual pin as an `embedded-hal` digital pin.
///
/// Lets code written against the `embedded-hal` traits drive any pin in a
/// [`Registry`][crate::Registry], regardless of which device it lives on.  The registry is
/// reached through a mutex, so several `Pin`s and the scheduler can share it.
pub struct Pin<'a, M> {
    vpin: Vpin,
    registry: &'a M,
}

impl<'a, M> Pin<'a, M>
where
    M: IoMutex,
    M::Inner: Dispatch,
{
    pub fn new(registry: &'a M, vpin: Vpin) -> Self {
        Self { vpin, registry }
    }

    pub fn vpin(&self) -> Vpin {
        self.vpin
    }

    pub fn configure_input(&self, pull_up: bool) -> Result<(), Error> {
        let params = [pull_up as i32];
        self.registry
            .lock(|r| r.configure(self.vpin, ConfigKind::Input, &params))
    }

    pub fn is_high(&self) -> Result<bool, Error> {
        self.registry.lock(|r| r.read(self.vpin))
    }

    pub fn is_low(&self) -> Result<bool, Error> {
        self.is_high().map(|b| !b)
    }

    pub fn set_high(&mut self) -> Result<(), Error> {
        self.set_state(PinState::High)
    }

    pub fn set_low(&mut self) -> Result<(), Error> {
        self.set_state(PinState::Low)
    }

    pub fn set_state(&mut self, state: PinState) -> Result<(), Error> {
        self.registry
            .lock(|r| r.write(self.vpin, state == PinState::High))
    }
}

impl<M> hal_digital::ErrorType for Pin<'_, M> {
    type Error = Error;
}

impl<M> hal_digital::InputPin for Pin<'_, M>
where
    M: IoMutex,
    M::Inner: Dispatch,
{
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Pin::is_high(self)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Pin::is_low(self)
    }
}

impl<M> hal_digital::OutputPin for Pin<'_, M>
where
    M: IoMutex,
    M::Inner: Dispatch,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Pin::set_low(self)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Pin::set_high(self)
    }
}
