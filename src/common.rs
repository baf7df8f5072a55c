use core::fmt;

/// Virtual pin number, as used by command logic.
pub type Vpin = u16;

/// Pin configuration requests understood across device families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// Declare the pin an input.  Takes one parameter: non-zero to enable the pull-up.
    Input,
    Output,
    Servo,
}

/// Capability interface implemented by every device family.
///
/// Devices own a contiguous range of virtual pins starting at [`first_vpin()`][Self::first_vpin].
/// All methods are called from a single cooperative scheduling context and must never wait for
/// I/O; anything slow goes through the device's bus queue and is picked up again in
/// [`tick()`][Self::tick].
pub trait IoDevice {
    fn first_vpin(&self) -> Vpin;

    fn pin_count(&self) -> u8;

    /// Whether `vpin` falls into this device's range.
    fn owns(&self, vpin: Vpin) -> bool {
        let first = u32::from(self.first_vpin());
        let vpin = u32::from(vpin);
        vpin >= first && vpin < first + u32::from(self.pin_count())
    }

    /// One-time initialisation after registration.
    fn begin(&mut self) {}

    /// Apply a pin configuration.
    ///
    /// Requests the device does not support must return `false` and leave the device untouched.
    fn configure(&mut self, vpin: Vpin, kind: ConfigKind, params: &[i32]) -> bool {
        let _ = (vpin, kind, params);
        false
    }

    fn write(&mut self, vpin: Vpin, value: bool);

    fn read(&mut self, vpin: Vpin) -> bool;

    /// Background work, invoked by the scheduler at high frequency with the current time in
    /// microseconds.
    fn tick(&mut self, now_us: u32) {
        let _ = now_us;
    }

    /// Human-readable identification: device family, address and pin range.
    fn describe(&self, f: &mut dyn fmt::Write) -> fmt::Result;
}

impl<T: IoDevice + ?Sized> IoDevice for &mut T {
    fn first_vpin(&self) -> Vpin {
        (**self).first_vpin()
    }
    fn pin_count(&self) -> u8 {
        (**self).pin_count()
    }
    fn owns(&self, vpin: Vpin) -> bool {
        (**self).owns(vpin)
    }
    fn begin(&mut self) {
        (**self).begin()
    }
    fn configure(&mut self, vpin: Vpin, kind: ConfigKind, params: &[i32]) -> bool {
        (**self).configure(vpin, kind, params)
    }
    fn write(&mut self, vpin: Vpin, value: bool) {
        (**self).write(vpin, value)
    }
    fn read(&mut self, vpin: Vpin) -> bool {
        (**self).read(vpin)
    }
    fn tick(&mut self, now_us: u32) {
        (**self).tick(now_us)
    }
    fn describe(&self, f: &mut dyn fmt::Write) -> fmt::Result {
        (**self).describe(f)
    }
}

/// Adapter to print a device's [`describe()`][IoDevice::describe] output with `{}`.
pub struct Description<'a, D: ?Sized>(pub &'a D);

impl<D: IoDevice + ?Sized> fmt::Display for Description<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.describe(f)
    }
}
