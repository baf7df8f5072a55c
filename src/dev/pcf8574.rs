//! Support for the `PCF8574` & `PCF8574A` "Remote 8-bit I/O expander for I2C-bus with interrupt"
//!
//! The chip has a single quasi-bidirectional port: the same register is written to drive the
//! outputs and read to sample the inputs.  A pin can only be read while its output latch is high
//! (released), so that connected equipment is able to pull it to ground.
//!
//! Input state is not fetched on demand.  The driver scans the port in the background from
//! [`tick()`][crate::IoDevice::tick] and [`read()`][crate::IoDevice::read] returns the result of
//! the last completed scan.  A `read()` right after a `write()` to the same pin may therefore see
//! a value up to one scan interval old.
use core::fmt;

use log::{debug, info, warn};

use crate::{ConfigKind, Error, IoDevice, Request, TransactionQueue, Vpin};

/// Default time between two scans of the input port, or between two probes of a missing device.
pub const DEFAULT_SCAN_INTERVAL_US: u32 = 4000;

/// Startup configuration of one expander.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpanderConfig {
    pub first_vpin: Vpin,
    pub pin_count: u8,
    /// 7-bit I2C address.
    pub address: u8,
    /// Applies to scanning a healthy device and to retrying a dormant one alike.
    pub scan_interval_us: u32,
}

impl ExpanderConfig {
    pub fn new(first_vpin: Vpin, pin_count: u8, address: u8) -> Self {
        Self {
            first_vpin,
            pin_count,
            address,
            scan_interval_us: DEFAULT_SCAN_INTERVAL_US,
        }
    }

    pub fn with_scan_interval(mut self, scan_interval_us: u32) -> Self {
        self.scan_interval_us = scan_interval_us;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.pin_count == 0 || self.pin_count > 8 {
            return Err(Error::InvalidPinCount);
        }
        if self.address > 0x7f {
            return Err(Error::InvalidAddress);
        }
        if u32::from(self.first_vpin) + u32::from(self.pin_count) > u32::from(Vpin::MAX) + 1 {
            return Err(Error::InvalidPinCount);
        }
        Ok(())
    }
}

/// Health of the connection to the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Presumed unreachable; probed again once the scan interval elapses.
    Dormant,
    /// A presence probe is outstanding.
    Probing,
    /// Healthy and idle.
    Normal,
    /// A read of the input port is outstanding.
    Scanning,
}

pub struct Pcf8574<Q> {
    queue: Q,
    config: ExpanderConfig,
    output: u8,
    input: u8,
    state: DeviceState,
    last_attempt_us: u32,
    request: Request,
}

impl<Q: TransactionQueue> Pcf8574<Q> {
    /// Create a driver for the chip described by `config`, talking through `queue`.
    ///
    /// The device starts out [`Dormant`][DeviceState::Dormant] with all outputs driven low; it
    /// is brought up by the first ticks after registration.
    pub fn new(queue: Q, config: ExpanderConfig) -> Result<Self, Error> {
        config.validate()?;
        let mut request = Request::new();
        request.set_write_params(config.address, &[]);
        Ok(Self {
            queue,
            config,
            output: 0x00,
            input: 0x00,
            state: DeviceState::Dormant,
            last_attempt_us: 0,
            request,
        })
    }

    /// Address with all three address pins, for the plain (`a_variant = false`) and the `A`
    /// variant of the chip.
    pub fn address_for(a_variant: bool, a0: bool, a1: bool, a2: bool) -> u8 {
        let base = if a_variant { 0x38 } else { 0x20 };
        base | ((a2 as u8) << 2) | ((a1 as u8) << 1) | (a0 as u8)
    }

    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn output_shadow(&self) -> u8 {
        self.output
    }

    pub fn input_shadow(&self) -> u8 {
        self.input
    }

    /// Give back the bus queue handle.
    pub fn release(self) -> Q {
        self.queue
    }

    fn mask(&self, vpin: Vpin) -> u8 {
        match vpin.checked_sub(self.config.first_vpin) {
            Some(pin) if pin < u16::from(self.config.pin_count) => 1 << pin,
            _ => 0,
        }
    }

    /// Handle the outcome of the transaction that just finished.
    fn complete_transaction(&mut self) {
        let address = self.config.address;
        let status = self.request.status();
        match self.state {
            DeviceState::Scanning => {
                let previous = self.input;
                match status {
                    Ok(()) => {
                        self.input = self.request.reply().first().copied().unwrap_or(0xff);
                        self.state = DeviceState::Normal;
                    }
                    Err(kind) => {
                        // Ones read as "not triggered".
                        self.input = 0xff;
                        warn!("PCF8574 I2C:x{:x} Error {:?}", address, kind);
                        self.state = DeviceState::Dormant;
                    }
                }
                let differences = self.input ^ previous;
                if differences != 0 {
                    debug!("PCF8574 I2C:x{:x} Port Change:x{:x}", address, self.input);
                }
            }
            DeviceState::Probing => {
                if status.is_ok() {
                    info!("PCF8574 I2C:x{:x} Active", address);
                    if let Err(kind) = self.queue.write(address, &[self.output]) {
                        warn!("PCF8574 I2C:x{:x} Error {:?}", address, kind);
                    }
                    self.request.set_read_params(address, 1);
                    self.state = DeviceState::Normal;
                } else {
                    self.state = DeviceState::Dormant;
                }
            }
            DeviceState::Normal | DeviceState::Dormant => (),
        }
    }

    fn start_transaction(&mut self) {
        match self.state {
            DeviceState::Normal => {
                self.queue.queue_request(&mut self.request);
                self.state = DeviceState::Scanning;
            }
            DeviceState::Dormant => {
                self.request.set_write_params(self.config.address, &[]);
                self.queue.queue_request(&mut self.request);
                self.state = DeviceState::Probing;
            }
            DeviceState::Probing | DeviceState::Scanning => (),
        }
    }
}

impl<Q: TransactionQueue> IoDevice for Pcf8574<Q> {
    fn first_vpin(&self) -> Vpin {
        self.config.first_vpin
    }

    fn pin_count(&self) -> u8 {
        self.config.pin_count
    }

    fn begin(&mut self) {
        if self.queue.write(self.config.address, &[]).is_ok() {
            info!(
                "PCF8574 I2C:x{:x} configured Vpins:{}-{}",
                self.config.address,
                self.config.first_vpin,
                u32::from(self.config.first_vpin) + u32::from(self.config.pin_count) - 1
            );
        }
    }

    /// Inputs only work with the pull-up enabled, so that is the only configuration accepted.
    fn configure(&mut self, _vpin: Vpin, kind: ConfigKind, params: &[i32]) -> bool {
        matches!((kind, params), (ConfigKind::Input, [pull_up]) if *pull_up != 0)
    }

    fn write(&mut self, vpin: Vpin, value: bool) {
        let mask = self.mask(vpin);
        debug!(
            "PCF8574 Write I2C:x{:x} Pin:{} Value:{}",
            self.config.address, vpin, value as u8
        );
        if value {
            self.output |= mask;
        } else {
            self.output &= !mask;
        }
        if let Err(kind) = self.queue.write(self.config.address, &[self.output]) {
            warn!("PCF8574 I2C:x{:x} Error {:?}", self.config.address, kind);
        }
    }

    fn read(&mut self, vpin: Vpin) -> bool {
        let mask = self.mask(vpin);
        if mask != 0 && self.output & mask == 0 {
            // Pin is driven low and would always read as zero: release it, then sample the port.
            self.output |= mask;
            let mut buffer = [0x00];
            match self
                .queue
                .write_read(self.config.address, &[self.output], &mut buffer)
            {
                Ok(()) => self.input = buffer[0],
                Err(kind) => {
                    self.input = 0xff;
                    warn!("PCF8574 I2C:x{:x} Error {:?}", self.config.address, kind);
                }
            }
        }
        self.input & mask != 0
    }

    fn tick(&mut self, now_us: u32) {
        self.queue.poll(&mut self.request);
        if self.request.is_busy() {
            return;
        }
        self.complete_transaction();

        if now_us.wrapping_sub(self.last_attempt_us) > self.config.scan_interval_us {
            self.start_transaction();
            self.last_attempt_us = now_us;
        }
    }

    fn describe(&self, f: &mut dyn fmt::Write) -> fmt::Result {
        write!(
            f,
            "PCF8574 I2C:x{:x} VPins:{}-{}",
            self.config.address,
            self.config.first_vpin,
            u32::from(self.config.first_vpin) + u32::from(self.config.pin_count) - 1
        )
    }
}
