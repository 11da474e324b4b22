//! Transport infrastructure: the byte-stream contract, its RS-232 and
//! Ethernet implementations, and the line-oriented channel the protocol
//! layers talk through.

mod channel;
mod error;
mod ring_byte_buffer;
mod traits;

pub mod serial;
pub mod tcpip;

#[cfg(test)]
pub(crate) mod testing;

pub use self::channel::Channel;
pub use self::error::{Error, Result};
pub use self::ring_byte_buffer::RingByteBuffer;
pub use self::serial::SerialConnection;
pub use self::tcpip::TcpipConnection;
pub use self::traits::Connection;
