/// Common interface for mutex implementations.
///
/// `vpin-io` needs a mutex wherever one value is reached from several places: a bus queue shared
/// by all devices hanging off the same wires, or a [`Registry`][crate::Registry] shared between
/// the scheduler and command logic.  The trait is already implemented for a number of existing
/// mutex types.  Some of them are guarded by a feature that needs to be enabled:
///
/// | Mutex | Feature Name | Notes |
/// | --- | --- | --- |
/// | [`core::cell::RefCell`] | _always available_ | For sharing within a single execution context. |
/// | [`std::sync::Mutex`][mutex-std] | `std` | For platforms where `std` is available. |
/// | [`critical_section::Mutex<RefCell<T>>`][mutex-cs] | `critical-section` | For sharing with interrupt handlers. |
///
/// [mutex-std]: https://doc.rust-lang.org/std/sync/struct.Mutex.html
/// [mutex-cs]: https://docs.rs/critical-section/latest/critical_section/struct.Mutex.html
///
/// For other mutex types, a custom implementation is needed.  Due to the orphan rule, it might be
/// necessary to wrap it in a newtype:
///
/// ```
/// struct MyMutex<T>(std::sync::Mutex<T>);
///
/// impl<T> vpin_io::IoMutex for MyMutex<T> {
///     type Inner = T;
///
///     fn create(v: T) -> Self {
///         Self(std::sync::Mutex::new(v))
///     }
///
///     fn lock<R, F: FnOnce(&mut Self::Inner) -> R>(&self, f: F) -> R {
///         let mut v = self.0.lock().unwrap();
///         f(&mut v)
///     }
/// }
/// ```
pub trait IoMutex {
    /// The value wrapped inside this mutex.
    type Inner;

    /// Create a new mutex of this type.
    fn create(v: Self::Inner) -> Self;

    /// Lock the mutex and give a closure access to the value inside.
    fn lock<R, F: FnOnce(&mut Self::Inner) -> R>(&self, f: F) -> R;
}

impl<T> IoMutex for core::cell::RefCell<T> {
    type Inner = T;

    fn create(v: Self::Inner) -> Self {
        core::cell::RefCell::new(v)
    }

    fn lock<R, F: FnOnce(&mut Self::Inner) -> R>(&self, f: F) -> R {
        let mut v = self.borrow_mut();
        f(&mut v)
    }
}

#[cfg(any(test, feature = "std"))]
impl<T> IoMutex for std::sync::Mutex<T> {
    type Inner = T;

    fn create(v: Self::Inner) -> Self {
        std::sync::Mutex::new(v)
    }

    fn lock<R, F: FnOnce(&mut Self::Inner) -> R>(&self, f: F) -> R {
        // A panic elsewhere leaves the value consistent: every lock holder is a single call.
        let mut v = self.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut v)
    }
}

#[cfg(feature = "critical-section")]
impl<T> IoMutex for critical_section::Mutex<core::cell::RefCell<T>> {
    type Inner = T;

    fn create(v: Self::Inner) -> Self {
        critical_section::Mutex::new(core::cell::RefCell::new(v))
    }

    fn lock<R, F: FnOnce(&mut Self::Inner) -> R>(&self, f: F) -> R {
        critical_section::with(|cs| f(&mut self.borrow_ref_mut(cs)))
    }
}

/// Handle to a [`TransactionQueue`][crate::TransactionQueue] living inside a mutex.
///
/// Every device on a shared bus owns one of these; all of them point at the same queue.
pub struct Shared<'a, M>(&'a M);

impl<'a, M: IoMutex> Shared<'a, M> {
    pub fn new(mutex: &'a M) -> Self {
        Self(mutex)
    }
}

impl<M> Clone for Shared<'_, M> {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}

impl<M> crate::TransactionQueue for Shared<'_, M>
where
    M: IoMutex,
    M::Inner: crate::TransactionQueue,
{
    fn queue_request(&mut self, request: &mut crate::Request) {
        self.0.lock(|q| q.queue_request(request))
    }

    fn poll(&mut self, request: &mut crate::Request) {
        self.0.lock(|q| q.poll(request))
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), embedded_hal::i2c::ErrorKind> {
        self.0.lock(|q| q.write(address, bytes))
    }

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), embedded_hal::i2c::ErrorKind> {
        self.0.lock(|q| q.write_read(address, bytes, buffer))
    }
}
