//! Directly wired pins, driven through the HAL of the microcontroller.
use core::fmt;

use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::{ConfigKind, IoDevice, Vpin};

/// A single virtual pin backed by a pin of the microcontroller itself.
///
/// `P` must be usable both ways, e.g. a flex/open-drain pin from the HAL.  Direction and pull-ups
/// are fixed when the HAL pin is created, so configuration requests are only checked for
/// plausibility.
pub struct GpioPin<P> {
    pin: P,
    vpin: Vpin,
}

impl<P: InputPin + OutputPin> GpioPin<P> {
    pub fn new(pin: P, vpin: Vpin) -> Self {
        Self { pin, vpin }
    }

    /// Give back the HAL pin.
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin + OutputPin> IoDevice for GpioPin<P> {
    fn first_vpin(&self) -> Vpin {
        self.vpin
    }

    fn pin_count(&self) -> u8 {
        1
    }

    fn configure(&mut self, _vpin: Vpin, kind: ConfigKind, _params: &[i32]) -> bool {
        matches!(kind, ConfigKind::Input | ConfigKind::Output)
    }

    fn write(&mut self, _vpin: Vpin, value: bool) {
        let result = if value {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if let Err(e) = result {
            warn!("GPIO VPin:{} write failed: {:?}", self.vpin, e);
        }
    }

    fn read(&mut self, _vpin: Vpin) -> bool {
        self.pin.is_high().unwrap_or_else(|e| {
            warn!("GPIO VPin:{} read failed: {:?}", self.vpin, e);
            true
        })
    }

    fn describe(&self, f: &mut dyn fmt::Write) -> fmt::Result {
        write!(f, "GPIO VPin:{}", self.vpin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Description;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn drives_and_samples_the_pin() {
        let expectations = [
            Transaction::set(State::High),
            Transaction::set(State::Low),
            Transaction::get(State::High),
            Transaction::get(State::Low),
        ];
        let mut pin = PinMock::new(&expectations);
        let mut gpio = GpioPin::new(pin.clone(), 22);

        assert!(gpio.owns(22));
        assert!(!gpio.owns(23));

        gpio.write(22, true);
        gpio.write(22, false);
        assert!(gpio.read(22));
        assert!(!gpio.read(22));

        pin.done();
    }

    #[test]
    fn configure() {
        let mut pin = PinMock::new(&[]);
        let mut gpio = GpioPin::new(pin.clone(), 3);

        assert!(gpio.configure(3, ConfigKind::Input, &[1]));
        assert!(gpio.configure(3, ConfigKind::Output, &[]));
        assert!(!gpio.configure(3, ConfigKind::Servo, &[0, 180]));
        assert_eq!(format!("{}", Description(&gpio)), "GPIO VPin:3");

        pin.done();
    }
}
