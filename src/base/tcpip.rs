use crate::base::error::Result;
use crate::base::ring_byte_buffer::RingByteBuffer;
use crate::base::traits::Connection;
use log::trace;
use std::cmp::max;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

const READ_BUFFER_SIZE: usize = 1024;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Ethernet connection to a URG sensor.
///
/// Ethernet models always talk SCIP at a fixed internal rate, so
/// [`Connection::change_baudrate`] is a no-op here.
#[derive(Debug)]
pub struct TcpipConnection {
    stream: Option<TcpStream>,
    buffer: RingByteBuffer,
}

impl TcpipConnection {
    /// Connects to `address:port` (sensors listen on 10940 by default).
    pub fn open(address: &str, port: u16) -> Result<TcpipConnection> {
        trace!("connecting to {}:{}", address, port);
        let target = format!("{}:{}", address, port);
        let mut last_error = None;
        let mut stream = None;
        for addr in std::net::ToSocketAddrs::to_socket_addrs(&target)? {
            match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(err) => last_error = Some(err),
            }
        }
        let stream = match stream {
            Some(stream) => stream,
            None => {
                return Err(last_error
                    .unwrap_or_else(|| {
                        std::io::Error::new(std::io::ErrorKind::NotFound, "address did not resolve")
                    })
                    .into())
            }
        };
        stream.set_nodelay(true)?;

        Ok(TcpipConnection {
            stream: Some(stream),
            buffer: RingByteBuffer::with_capacity(READ_BUFFER_SIZE),
        })
    }
}

impl Connection for TcpipConnection {
    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn close(&mut self) {
        self.stream = None;
        self.buffer.clear();
    }

    fn change_baudrate(&mut self, _baudrate: u32) -> Result<()> {
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or(crate::base::Error::NotConnected)?;
        Ok(stream.write(data)?)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self
            .stream
            .as_mut()
            .ok_or(crate::base::Error::NotConnected)?;

        if self.buffer.is_empty() {
            stream.set_read_timeout(Some(max(timeout, Duration::from_millis(1))))?;
            let mut chunk = [0u8; 256];
            match stream.read(&mut chunk) {
                Ok(0) => return Ok(0),
                Ok(n) => {
                    let _ = self.buffer.write(&chunk[..n]);
                }
                Err(err)
                    if err.kind() == std::io::ErrorKind::WouldBlock
                        || err.kind() == std::io::ErrorKind::TimedOut =>
                {
                    return Ok(0)
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(self.buffer.read(buf)?)
    }

    fn unget(&mut self, byte: u8) {
        self.buffer.push_front(byte);
    }
}
