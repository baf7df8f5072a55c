use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use heapless::Vec;

/// Largest payload a single [`Request`] can carry in either direction.
pub const MAX_TRANSFER: usize = 4;

/// Kind of bus transaction described by a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Write,
    Read,
    /// Write the outgoing buffer, then read into the reply buffer without releasing the bus.
    WriteRead,
}

/// Lifecycle of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Never queued.
    Idle,
    /// Handed to the bus and not yet completed.
    Pending,
    Done(Result<(), ErrorKind>),
}

/// Reusable transaction record.
///
/// Every device owns exactly one of these.  It is reconfigured in place with the `set_*_params()`
/// methods and lent to the [`TransactionQueue`] for the duration of one transaction.  The bus
/// only fills in the reply buffer and the completion status.
#[derive(Debug)]
pub struct Request {
    address: u8,
    operation: Operation,
    outgoing: Vec<u8, MAX_TRANSFER>,
    reply: Vec<u8, MAX_TRANSFER>,
    status: Status,
}

impl Request {
    pub const fn new() -> Self {
        Self {
            address: 0,
            operation: Operation::Write,
            outgoing: Vec::new(),
            reply: Vec::new(),
            status: Status::Idle,
        }
    }

    /// Configure a plain write.  An empty `bytes` makes this a presence probe.
    pub fn set_write_params(&mut self, address: u8, bytes: &[u8]) {
        self.address = address;
        self.operation = Operation::Write;
        self.fill_outgoing(bytes);
        self.reply.clear();
    }

    pub fn set_read_params(&mut self, address: u8, len: usize) {
        self.address = address;
        self.operation = Operation::Read;
        self.outgoing.clear();
        self.size_reply(len);
    }

    pub fn set_write_read_params(&mut self, address: u8, bytes: &[u8], len: usize) {
        self.address = address;
        self.operation = Operation::WriteRead;
        self.fill_outgoing(bytes);
        self.size_reply(len);
    }

    fn fill_outgoing(&mut self, bytes: &[u8]) {
        assert!(bytes.len() <= MAX_TRANSFER);
        self.outgoing.clear();
        self.outgoing
            .extend_from_slice(bytes)
            .expect("length checked against MAX_TRANSFER");
    }

    fn size_reply(&mut self, len: usize) {
        assert!(len <= MAX_TRANSFER);
        self.reply.clear();
        self.reply
            .resize(len, 0x00)
            .expect("length checked against MAX_TRANSFER");
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn outgoing(&self) -> &[u8] {
        &self.outgoing
    }

    /// Data received by the last completed read.
    pub fn reply(&self) -> &[u8] {
        &self.reply
    }

    pub fn state(&self) -> Status {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        self.status == Status::Pending
    }

    /// Outcome of the last transaction.  A request that was never queued counts as successful.
    pub fn status(&self) -> Result<(), ErrorKind> {
        match self.status {
            Status::Done(result) => result,
            Status::Idle | Status::Pending => Ok(()),
        }
    }

    /// Bus side: mark the request as handed over.
    pub fn start(&mut self) {
        self.status = Status::Pending;
    }

    /// Bus side: record the outcome of the transaction.
    pub fn complete(&mut self, result: Result<(), ErrorKind>) {
        self.status = Status::Done(result);
    }

    /// Bus side: the outgoing bytes and the reply buffer, borrowed at the same time.
    pub fn buffers_mut(&mut self) -> (&[u8], &mut [u8]) {
        (&self.outgoing, &mut self.reply)
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

/// Asynchronous transaction executor for one physical bus.
///
/// Implementations serialize all work in FIFO order.  `queue_request()` must return without
/// waiting for the bus; the blocking verbs wait until everything queued before them has finished.
pub trait TransactionQueue {
    /// Hand `request` over to the bus.  Its status is `Pending` until the bus completes it.
    fn queue_request(&mut self, request: &mut Request);

    /// Give the bus a chance to write back the outcome of an outstanding `request`.
    fn poll(&mut self, request: &mut Request) {
        let _ = request;
    }

    /// Blocking write of `bytes` to `address`.
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), ErrorKind>;

    /// Blocking combined write-then-read.
    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8])
        -> Result<(), ErrorKind>;
}

/// [`TransactionQueue`] over any blocking `embedded-hal` I2C bus.
///
/// Each request is executed as soon as it is queued, so the queue never holds more than the
/// transaction currently on the wire and FIFO ordering is trivially kept.
pub struct BlockingQueue<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> BlockingQueue<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Give back the wrapped bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn execute(&mut self, request: &mut Request) -> Result<(), ErrorKind> {
        let address = request.address();
        let operation = request.operation();
        let (outgoing, reply) = request.buffers_mut();
        let result = match operation {
            Operation::Write => self.i2c.write(address, outgoing),
            Operation::Read => self.i2c.read(address, reply),
            Operation::WriteRead => self.i2c.write_read(address, outgoing, reply),
        };
        result.map_err(|e| e.kind())
    }
}

impl<I2C: I2c> TransactionQueue for BlockingQueue<I2C> {
    fn queue_request(&mut self, request: &mut Request) {
        request.start();
        let result = self.execute(request);
        request.complete(result);
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), ErrorKind> {
        self.i2c.write(address, bytes).map_err(|e| e.kind())
    }

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), ErrorKind> {
        self.i2c
            .write_read(address, bytes, buffer)
            .map_err(|e| e.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::NoAcknowledgeSource;
    use embedded_hal_mock::eh1::i2c as mock_i2c;

    #[test]
    fn request_is_reused_in_place() {
        let mut request = Request::new();
        assert_eq!(request.state(), Status::Idle);
        assert_eq!(request.status(), Ok(()));

        request.set_write_params(0x20, &[]);
        assert_eq!(request.operation(), Operation::Write);
        assert!(request.outgoing().is_empty());

        request.set_read_params(0x20, 1);
        assert_eq!(request.operation(), Operation::Read);
        assert_eq!(request.reply(), &[0x00]);

        request.set_write_read_params(0x21, &[0xf0], 1);
        assert_eq!(request.address(), 0x21);
        assert_eq!(request.outgoing(), &[0xf0]);
        assert_eq!(request.reply().len(), 1);
    }

    #[test]
    #[should_panic]
    fn request_rejects_oversized_payload() {
        let mut request = Request::new();
        request.set_write_params(0x20, &[0; MAX_TRANSFER + 1]);
    }

    #[test]
    fn blocking_queue_executes_requests() {
        let expectations = [
            mock_i2c::Transaction::write(0x20, vec![]),
            mock_i2c::Transaction::read(0x20, vec![0b0000_0101]),
            mock_i2c::Transaction::write_read(0x20, vec![0xff], vec![0b1111_0000]),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);
        let mut queue = BlockingQueue::new(bus.clone());
        let mut request = Request::new();

        request.set_write_params(0x20, &[]);
        queue.queue_request(&mut request);
        assert!(!request.is_busy());
        assert_eq!(request.state(), Status::Done(Ok(())));

        request.set_read_params(0x20, 1);
        queue.queue_request(&mut request);
        assert_eq!(request.reply(), &[0b0000_0101]);

        request.set_write_read_params(0x20, &[0xff], 1);
        queue.queue_request(&mut request);
        assert_eq!(request.reply(), &[0b1111_0000]);

        bus.done();
    }

    #[test]
    fn blocking_queue_records_errors() {
        let nack = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address);
        let expectations = [
            mock_i2c::Transaction::write(0x27, vec![]).with_error(nack),
            mock_i2c::Transaction::write(0x27, vec![0x55]).with_error(ErrorKind::Bus),
        ];
        let mut bus = mock_i2c::Mock::new(&expectations);
        let mut queue = BlockingQueue::new(bus.clone());
        let mut request = Request::new();

        request.set_write_params(0x27, &[]);
        queue.queue_request(&mut request);
        assert_eq!(request.status(), Err(nack));

        assert_eq!(queue.write(0x27, &[0x55]), Err(ErrorKind::Bus));

        bus.done();
    }
}
