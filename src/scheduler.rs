//! Fixed-cadence task driving the background work of all devices.
//!
//! This module is only built if the `"async"` feature is enabled.  Every step ticks all devices
//! of a registry one after the other, inside a single lock, and then sleeps for the configured
//! period.  Devices never get a task of their own, so a device's transaction record is only ever
//! touched from this one place.

use embedded_hal_async::delay::DelayNs;

use crate::{Dispatch, IoMutex};

/// Default time between two steps.
pub const DEFAULT_PERIOD_US: u32 = 100;

pub struct Scheduler<'a, M, C, DL> {
    registry: &'a M,
    clock: C,
    delay: DL,
    period_us: u32,
}

impl<'a, M, C, DL> Scheduler<'a, M, C, DL>
where
    M: IoMutex,
    M::Inner: Dispatch,
    C: FnMut() -> u32,
    DL: DelayNs,
{
    /// `clock` returns the current time in microseconds and is allowed to wrap.
    pub fn new(registry: &'a M, clock: C, delay: DL) -> Self {
        Self {
            registry,
            clock,
            delay,
            period_us: DEFAULT_PERIOD_US,
        }
    }

    pub fn with_period(mut self, period_us: u32) -> Self {
        self.period_us = period_us;
        self
    }

    /// Tick every device once, then wait for one period.
    pub async fn step(&mut self) {
        let now = (self.clock)();
        self.registry.lock(|r| r.tick_all(now));
        self.delay.delay_us(self.period_us).await;
    }

    pub async fn run(&mut self) -> ! {
        loop {
            self.step().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Scheduler;
    use crate::test_util::ScriptedQueue;
    use crate::{DeviceState, ExpanderConfig, Pcf8574, Registry, Shared};
    use core::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingDelay {
        waited_ns: u64,
    }

    impl embedded_hal_async::delay::DelayNs for RecordingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.waited_ns += u64::from(ns);
        }
    }

    #[test]
    fn steps_tick_all_devices() {
        let queue = RefCell::new(ScriptedQueue::new());
        let mut registry: Registry<_, 2> = Registry::new();
        for (vpin, address) in [(0, 0x20), (8, 0x21)] {
            let pcf =
                Pcf8574::new(Shared::new(&queue), ExpanderConfig::new(vpin, 8, address)).unwrap();
            registry.register(pcf).unwrap();
        }
        let registry = RefCell::new(registry);

        let time = Cell::new(0u32);
        let clock = || {
            time.set(time.get() + 3_000);
            time.get()
        };
        let mut scheduler =
            Scheduler::new(&registry, clock, RecordingDelay::default()).with_period(3_000);

        futures::executor::block_on(async {
            scheduler.step().await;
            scheduler.step().await;
        });

        // Nothing happens at t=3000, both devices probe at t=6000.
        assert_eq!(queue.borrow().queued.len(), 2);
        registry.borrow_mut().for_each(|d| assert_eq!(d.state(), DeviceState::Probing));
        assert_eq!(scheduler.delay.waited_ns, 6_000_000);
    }
}
