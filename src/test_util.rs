//! Deferred-completion bus queue for exercising device state machines.

use crate::{Operation, Request, TransactionQueue};
use embedded_hal::i2c::ErrorKind;

/// A queue that keeps every request pending until the test resolves it with
/// [`complete()`][ScriptedQueue::complete].
///
/// Panics if a request is queued for an address that still has one in flight.
#[derive(Default)]
pub struct ScriptedQueue {
    /// Every queued request, in order: address, operation, outgoing bytes.
    pub queued: Vec<(u8, Operation, Vec<u8>)>,
    /// Every blocking write: address, bytes.
    pub writes: Vec<(u8, Vec<u8>)>,
    /// Every blocking write-read: address, outgoing bytes.
    pub write_reads: Vec<(u8, Vec<u8>)>,
    /// Outcome of blocking calls.
    pub blocking_result: Option<ErrorKind>,
    /// Reply byte handed out by blocking write-reads.
    pub read_reply: u8,
    outstanding: Vec<u8>,
    completions: Vec<(u8, Result<(), ErrorKind>, Vec<u8>)>,
}

impl ScriptedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the outstanding request for `address` on its next poll.
    pub fn complete(&mut self, address: u8, result: Result<(), ErrorKind>, reply: &[u8]) {
        assert!(
            self.outstanding.contains(&address),
            "nothing in flight for x{:x}",
            address
        );
        self.completions.push((address, result, reply.to_vec()));
    }

    pub fn in_flight(&self, address: u8) -> bool {
        self.outstanding.contains(&address)
    }

    fn blocking(&self) -> Result<(), ErrorKind> {
        match self.blocking_result {
            Some(kind) => Err(kind),
            None => Ok(()),
        }
    }
}

impl TransactionQueue for ScriptedQueue {
    fn queue_request(&mut self, request: &mut Request) {
        let address = request.address();
        assert!(
            !self.outstanding.contains(&address),
            "second request queued for x{:x} while one is in flight",
            address
        );
        request.start();
        self.outstanding.push(address);
        self.queued
            .push((address, request.operation(), request.outgoing().to_vec()));
    }

    fn poll(&mut self, request: &mut Request) {
        if !request.is_busy() {
            return;
        }
        let address = request.address();
        if let Some(pos) = self.completions.iter().position(|c| c.0 == address) {
            let (_, result, reply) = self.completions.remove(pos);
            let (_, buffer) = request.buffers_mut();
            let n = reply.len().min(buffer.len());
            buffer[..n].copy_from_slice(&reply[..n]);
            request.complete(result);
            self.outstanding.retain(|a| *a != address);
        }
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), ErrorKind> {
        self.writes.push((address, bytes.to_vec()));
        self.blocking()
    }

    fn write_read(
        &mut self,
        address: u8,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), ErrorKind> {
        self.write_reads.push((address, bytes.to_vec()));
        self.blocking()?;
        buffer.fill(self.read_reply);
        Ok(())
    }
}
