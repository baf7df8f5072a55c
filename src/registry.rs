use log::{debug, error, info};

use crate::{ConfigKind, Description, Error, IoDevice, Vpin};

/// Operations command logic needs on a set of devices, independent of how they are stored.
pub trait Dispatch {
    fn configure(&mut self, vpin: Vpin, kind: ConfigKind, params: &[i32]) -> Result<(), Error>;
    fn write(&mut self, vpin: Vpin, value: bool) -> Result<(), Error>;
    fn read(&mut self, vpin: Vpin) -> Result<bool, Error>;
    /// Run background work of every device once.
    fn tick_all(&mut self, now_us: u32);
}

/// The set of configured devices, mapping each virtual pin to the device that owns it.
///
/// Holds up to `N` devices.  `D` is either a single concrete device type, an enum over the known
/// families, or `&mut dyn IoDevice` to mix families whose storage lives elsewhere.
pub struct Registry<D, const N: usize> {
    devices: heapless::Vec<D, N>,
}

impl<D, const N: usize> Registry<D, N> {
    pub const fn new() -> Self {
        Self {
            devices: heapless::Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Devices in registration order.
    pub fn iter(&self) -> core::slice::Iter<'_, D> {
        self.devices.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, D> {
        self.devices.iter_mut()
    }
}

impl<D, const N: usize> Default for Registry<D, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: IoDevice, const N: usize> Registry<D, N> {
    /// Take ownership of `device`.
    ///
    /// Fails if any of its pins is already owned by another device or if the registry is full.
    pub fn register(&mut self, device: D) -> Result<(), Error> {
        let first = u32::from(device.first_vpin());
        let end = first + u32::from(device.pin_count());
        for existing in self.devices.iter() {
            let other_first = u32::from(existing.first_vpin());
            let other_end = other_first + u32::from(existing.pin_count());
            if first < other_end && other_first < end {
                let vpin = first.max(other_first) as Vpin;
                error!(
                    "{} overlaps {} at VPin:{}",
                    Description(&device),
                    Description(existing),
                    vpin
                );
                return Err(Error::Overlap { vpin });
            }
        }
        self.devices.push(device).map_err(|device| {
            error!("No room for {}", Description(&device));
            Error::RegistryFull
        })
    }

    /// Register `device` and run its [`begin()`][IoDevice::begin].
    pub fn add(&mut self, device: D) -> Result<(), Error> {
        self.register(device)?;
        if let Some(device) = self.devices.last_mut() {
            device.begin();
        }
        Ok(())
    }

    pub fn begin_all(&mut self) {
        self.devices.iter_mut().for_each(IoDevice::begin);
    }

    /// The device owning `vpin` and the pin's offset within that device.
    pub fn lookup(&mut self, vpin: Vpin) -> Result<(&mut D, u8), Error> {
        self.devices
            .iter_mut()
            .find(|d| d.owns(vpin))
            .map(|d| {
                let offset = (vpin - d.first_vpin()) as u8;
                (d, offset)
            })
            .ok_or(Error::NotFound(vpin))
    }

    pub fn exists(&self, vpin: Vpin) -> bool {
        self.devices.iter().any(|d| d.owns(vpin))
    }

    /// Visit every device in registration order.
    pub fn for_each<F: FnMut(&mut D)>(&mut self, f: F) {
        self.devices.iter_mut().for_each(f);
    }

    pub fn configure(&mut self, vpin: Vpin, kind: ConfigKind, params: &[i32]) -> Result<(), Error> {
        let (device, _) = self.lookup(vpin)?;
        if device.configure(vpin, kind, params) {
            Ok(())
        } else {
            debug!("VPin:{} rejected {:?} {:?}", vpin, kind, params);
            Err(Error::Unsupported)
        }
    }

    pub fn write(&mut self, vpin: Vpin, value: bool) -> Result<(), Error> {
        let (device, _) = self.lookup(vpin)?;
        device.write(vpin, value);
        Ok(())
    }

    pub fn read(&mut self, vpin: Vpin) -> Result<bool, Error> {
        let (device, _) = self.lookup(vpin)?;
        Ok(device.read(vpin))
    }

    pub fn tick_all(&mut self, now_us: u32) {
        for device in self.devices.iter_mut() {
            device.tick(now_us);
        }
    }

    /// Log the identification of every device.
    pub fn display_all(&self) {
        for device in self.devices.iter() {
            info!("{}", Description(device));
        }
    }
}

impl<D: IoDevice, const N: usize> Dispatch for Registry<D, N> {
    fn configure(&mut self, vpin: Vpin, kind: ConfigKind, params: &[i32]) -> Result<(), Error> {
        Registry::configure(self, vpin, kind, params)
    }

    fn write(&mut self, vpin: Vpin, value: bool) -> Result<(), Error> {
        Registry::write(self, vpin, value)
    }

    fn read(&mut self, vpin: Vpin) -> Result<bool, Error> {
        Registry::read(self, vpin)
    }

    fn tick_all(&mut self, now_us: u32) {
        Registry::tick_all(self, now_us)
    }
}
