//! Per-connection message buffer.

use std::io::{self, Read};

/// Result of reading one message from a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The peer closed its side of the connection.
    Closed,
    /// A message of the given length is staged at the start of the buffer.
    Message(usize),
    /// More bytes arrived than the buffer's capacity allows.
    Oversized,
}

/// Fixed-capacity byte buffer reused across one worker's read/process/write
/// cycles.
///
/// One byte of headroom sits past `capacity` so a read that would exceed the
/// capacity is detected instead of silently split across two messages.
#[derive(Debug)]
pub struct MessageBuffer {
    data: Box<[u8]>,
    capacity: usize,
}

impl MessageBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity + 1].into_boxed_slice(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Clear the buffer and read the next message from `reader`.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<ReadOutcome> {
        self.data.fill(0);
        let n = reader.read(&mut self.data)?;
        Ok(match n {
            0 => ReadOutcome::Closed,
            n if n > self.capacity => ReadOutcome::Oversized,
            n => ReadOutcome::Message(n),
        })
    }

    /// The writable region handed to a message handler.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.capacity]
    }

    /// The first `len` bytes, or `None` if `len` exceeds the capacity.
    pub fn response(&self, len: usize) -> Option<&[u8]> {
        (len <= self.capacity).then(|| &self.data[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn message_within_capacity() {
        let mut buffer = MessageBuffer::with_capacity(8);
        let mut input = Cursor::new(b"hello".to_vec());

        assert_eq!(buffer.read_from(&mut input).unwrap(), ReadOutcome::Message(5));
        assert_eq!(buffer.response(5).unwrap(), b"hello");
    }

    #[test]
    fn message_exactly_at_capacity() {
        let mut buffer = MessageBuffer::with_capacity(4);
        let mut input = Cursor::new(b"abcd".to_vec());
        assert_eq!(buffer.read_from(&mut input).unwrap(), ReadOutcome::Message(4));
    }

    #[test]
    fn message_over_capacity() {
        let mut buffer = MessageBuffer::with_capacity(4);
        let mut input = Cursor::new(b"abcdefgh".to_vec());
        assert_eq!(buffer.read_from(&mut input).unwrap(), ReadOutcome::Oversized);
    }

    #[test]
    fn end_of_stream_is_closed() {
        let mut buffer = MessageBuffer::with_capacity(4);
        let mut input = Cursor::new(Vec::new());
        assert_eq!(buffer.read_from(&mut input).unwrap(), ReadOutcome::Closed);
    }

    #[test]
    fn stale_bytes_cleared_between_reads() {
        let mut buffer = MessageBuffer::with_capacity(8);
        buffer.read_from(&mut Cursor::new(b"longer".to_vec())).unwrap();
        buffer.read_from(&mut Cursor::new(b"ab".to_vec())).unwrap();
        assert_eq!(&buffer.as_mut_slice()[..6], b"ab\0\0\0\0");
    }

    #[test]
    fn handler_region_excludes_headroom() {
        let mut buffer = MessageBuffer::with_capacity(16);
        assert_eq!(buffer.as_mut_slice().len(), 16);
        assert!(buffer.response(17).is_none());
        assert_eq!(buffer.response(16).map(<[u8]>::len), Some(16));
    }
}
