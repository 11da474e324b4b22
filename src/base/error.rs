use std::error;
use std::fmt;
use std::io;

/// Represents errors that can occur while talking to a URG sensor.
///
/// Each protocol-level variant renders a fixed diagnostic message, so callers
/// can show `error.to_string()` to an operator without further mapping.
#[derive(Debug)]
pub enum Error {
    /// An operation was invoked before `open` succeeded or after `close`.
    NotConnected,

    /// The transport accepted fewer bytes than the command required.
    Send,

    /// A mandatory field was missing or the decoder overflowed its range.
    Receive,

    /// The transport timed out before the sensor produced the next line.
    NoResponse,

    /// The echo-back did not match the command, the status line was
    /// malformed, or the status code was not in the expected set. When the
    /// sensor answered with a well-formed but unexpected status, `status`
    /// carries the two-digit code.
    InvalidResponse { status: Option<String> },

    /// A received line failed the SCIP checksum test.
    Checksum,

    /// Every candidate baud rate was probed without a response.
    NotDetectBaudrate,

    /// An argument was out of range or the sensor rejected a setting.
    InvalidParameter,

    /// The sensor answered `10` (state not ready, still booting).
    InvalidState,

    /// Catch-all for failures with no more specific classification.
    Unknown,

    /// An I/O error occurred on the underlying byte transport.
    Io(io::Error),

    /// The serial port layer reported an error.
    SerialPort(serialport::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotConnected => write!(f, "sensor is not opened."),
            Error::Send => write!(f, "send error."),
            Error::Receive => write!(f, "receive error."),
            Error::NoResponse => write!(f, "no response."),
            Error::InvalidResponse { .. } => write!(f, "invalid response."),
            Error::Checksum => write!(f, "checksum error."),
            Error::NotDetectBaudrate => write!(f, "could not connect URG sensor."),
            Error::InvalidParameter => write!(f, "invalid command parameter."),
            Error::InvalidState => write!(f, "could not measurement in this state."),
            Error::Unknown => write!(f, "unknown error."),
            Error::Io(err) => write!(f, "io error: {}", err),
            Error::SerialPort(err) => write!(f, "serial port error: {}", err),
        }
    }
}

impl error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serialport::Error> for Error {
    fn from(err: serialport::Error) -> Self {
        Error::SerialPort(err)
    }
}

/// A specialized `Result` type for URG driver operations.
pub type Result<T> = std::result::Result<T, Error>;
