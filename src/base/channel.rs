use crate::base::error::Result;
use crate::base::traits::Connection;
use log::{trace, warn};
use std::time::Duration;

/// SCIP lines fit in 64 data bytes plus separator, checksum and slack.
const MAX_LINE_SIZE: usize = 64 + 2 + 6;

/// Channel owns the byte transport and frames it into SCIP lines.
///
/// All suspension points of the driver live in [`Channel::read_line`]; every
/// other operation only blocks as long as the transport itself does.
pub struct Channel {
    connection: Box<dyn Connection>,
}

impl Channel {
    /// Wraps an opened transport.
    pub fn new(connection: Box<dyn Connection>) -> Channel {
        Channel { connection }
    }

    /// Returns `true` while the transport is usable.
    pub fn is_open(&self) -> bool {
        self.connection.is_open()
    }

    /// Releases the transport.
    pub fn close(&mut self) {
        self.connection.close();
    }

    /// Reconfigures the host-side baud rate.
    pub fn change_baudrate(&mut self, baudrate: u32) -> Result<()> {
        self.connection.change_baudrate(baudrate)
    }

    /// Writes raw bytes to the transport.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.connection.write(data)
    }

    /// Pushes one byte back onto the read stream.
    pub fn unget(&mut self, byte: u8) {
        self.connection.unget(byte);
    }

    /// Reads one SCIP line, stripping the terminating LF.
    ///
    /// Returns `None` on timeout with no payload: a line that stalls before
    /// its LF is discarded, never handed back truncated. A lone LF yields an
    /// empty line; callers tell blocks apart by that distinction. Lines
    /// longer than the protocol allows are discarded up to the next LF and
    /// reported as a receive error.
    pub fn read_line(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::with_capacity(MAX_LINE_SIZE);
        let mut overflowed = false;

        loop {
            let mut byte = [0u8; 1];
            let n = self.connection.read(&mut byte, timeout)?;
            if n == 0 {
                if !line.is_empty() {
                    trace!("timeout inside a line, discarding {} bytes", line.len());
                }
                return Ok(None);
            }

            if byte[0] == b'\n' {
                if overflowed {
                    warn!("discarded an over-long line");
                    return Err(crate::base::Error::Receive);
                }
                return Ok(Some(line));
            }

            if line.len() >= MAX_LINE_SIZE {
                overflowed = true;
            } else {
                line.push(byte[0]);
            }
        }
    }

    /// Reads and discards incoming bytes until the transport stays quiet for
    /// `timeout`. Used to absorb residual response data and to give the
    /// sensor time to settle after a baud change.
    pub fn drain(&mut self, timeout: Duration) {
        let mut scratch = [0u8; 64];
        loop {
            match self.connection.read(&mut scratch, timeout) {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
        }
    }
}
