//! An in-memory [`Transport`] that replays canned reads.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use log::trace;

use super::{ConnectionError, Transport};

/// Replays queued read results in order and records every write.
///
/// Reads honor `max_len`: a queued chunk longer than the request is split and
/// its remainder is served by the next read. Once the queue is empty, reads
/// fail with [`ConnectionError::Timeout`] like an idle device would.
#[derive(Debug, Default)]
pub struct MockTransport {
    reads: VecDeque<Result<Vec<u8>, ConnectionError>>,
    writes: Vec<Vec<u8>>,
    read_calls: usize,
    closed: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues bytes to be returned by a future read.
    pub fn push_read(&mut self, data: impl Into<Vec<u8>>) -> &mut Self {
        self.reads.push_back(Ok(data.into()));
        self
    }

    /// Queues an error to be returned by a future read.
    pub fn push_read_error(&mut self, error: ConnectionError) -> &mut Self {
        self.reads.push_back(Err(error));
        self
    }

    /// Queues `data` split into consecutive reads of `chunk_len` bytes.
    pub fn push_chunked(&mut self, data: &[u8], chunk_len: usize) -> &mut Self {
        for chunk in data.chunks(chunk_len) {
            self.push_read(chunk);
        }
        self
    }

    /// Every frame written so far, oldest first.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls
    }

    pub fn pending_reads(&self) -> usize {
        self.reads.len()
    }

    /// A flag that turns `true` once [`Transport::close`] is called, observable after the mock is moved.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }
}

impl Transport for MockTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, ConnectionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConnectionError::NotConnected);
        }
        trace!("mock write: {:x?}", data);
        self.writes.push(data.to_vec());
        Ok(data.len())
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, ConnectionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConnectionError::NotConnected);
        }
        self.read_calls += 1;

        let mut chunk = self.reads.pop_front().unwrap_or(Err(ConnectionError::Timeout))?;
        if chunk.len() > max_len {
            let rest = chunk.split_off(max_len);
            self.reads.push_front(Ok(rest));
        }
        Ok(chunk)
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::MockTransport;
    use crate::connection::{ConnectionError, Transport};

    #[test]
    fn splits_oversized_reads() {
        let mut mock = MockTransport::new();
        mock.push_read(vec![1; 700]);

        assert_eq!(mock.read(512).unwrap().len(), 512);
        assert_eq!(mock.read(512).unwrap().len(), 188);
        assert!(matches!(mock.read(512), Err(ConnectionError::Timeout)));
        assert_eq!(mock.read_calls(), 3);
    }

    #[test]
    fn rejects_io_after_close() {
        let mut mock = MockTransport::new();
        let closed = mock.closed_flag();
        mock.close();
        mock.close();

        assert!(closed.load(std::sync::atomic::Ordering::SeqCst));
        assert!(matches!(mock.write(&[0]), Err(ConnectionError::NotConnected)));
    }
}
