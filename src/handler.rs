//! Message processing contract.
//!
//! The server never interprets message bytes. Each received message is handed
//! to a [`MessageHandler`], which transforms the buffer in place and reports
//! how many bytes of it form the response.

/// Processes one received message.
///
/// `buffer` spans the connection's full capacity. The first `received` bytes
/// are the message; the handler may overwrite any part of the buffer and
/// returns the length of the response, which must not exceed `buffer.len()`.
///
/// Calls for one connection never overlap. Calls for different connections
/// run concurrently, so shared state needs its own synchronization.
pub trait MessageHandler: Send + Sync + 'static {
    fn process_message(&self, buffer: &mut [u8], received: usize) -> usize;
}

impl<F> MessageHandler for F
where
    F: Fn(&mut [u8], usize) -> usize + Send + Sync + 'static,
{
    fn process_message(&self, buffer: &mut [u8], received: usize) -> usize {
        self(buffer, received)
    }
}

/// Sends every message back unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

impl MessageHandler for Echo {
    fn process_message(&self, _buffer: &mut [u8], received: usize) -> usize {
        received
    }
}
