use crate::base::error::Result;
use std::time::Duration;

/// Byte-transport contract shared by the RS-232 and Ethernet connections.
///
/// The protocol layers consume this trait polymorphically; no framing is
/// imposed here. A `read` that times out returns `Ok(0)` without advancing
/// the stream.
pub trait Connection {
    /// Returns `true` while the underlying device or socket is usable.
    fn is_open(&self) -> bool;

    /// Releases the underlying device or socket. Idempotent.
    fn close(&mut self);

    /// Reconfigures the host-side baud rate. A no-op for transports that
    /// have no baud rate (Ethernet).
    fn change_baudrate(&mut self, baudrate: u32) -> Result<()>;

    /// Writes raw bytes, returning how many were accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Reads up to `buf.len()` bytes, waiting at most `timeout` for the
    /// first byte. Returns `Ok(0)` on timeout.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Pushes one byte back onto the front of the read stream.
    fn unget(&mut self, byte: u8);
}
