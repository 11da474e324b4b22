use crate::base::error::Result;
use crate::base::ring_byte_buffer::RingByteBuffer;
use crate::base::traits::Connection;
use log::trace;
use serialport::{SerialPort, SerialPortType};
use std::cmp::max;
use std::io::{self, Read, Write};
use std::time::Duration;

const READ_BUFFER_SIZE: usize = 1024;

/// USB driver names the URG family registers under; used to move likely
/// sensor ports to the front of [`find_ports`] results.
const URG_DRIVER_NAMES: [&str; 2] = [
    "URG Series USB Device Driver",
    "URG-X002 USB Device Driver",
];

/// RS-232 connection to a URG sensor.
///
/// Bytes read from the port are parked in a ring buffer so the line reader
/// can consume them one at a time without hitting the OS for every byte, and
/// so [`Connection::unget`] has somewhere to put bytes back.
pub struct SerialConnection {
    port: Option<Box<dyn SerialPort>>,
    buffer: RingByteBuffer,
}

impl SerialConnection {
    /// Opens `device` (e.g. `/dev/ttyACM0` or `COM3`) at `baudrate`.
    pub fn open(device: &str, baudrate: u32) -> Result<SerialConnection> {
        trace!("opening serial device {} at {} baud", device, baudrate);
        let port = serialport::new(device, baudrate)
            .timeout(Duration::from_millis(10))
            .open()?;

        Ok(SerialConnection {
            port: Some(port),
            buffer: RingByteBuffer::with_capacity(READ_BUFFER_SIZE),
        })
    }
}

impl Connection for SerialConnection {
    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        self.port = None;
        self.buffer.clear();
    }

    fn change_baudrate(&mut self, baudrate: u32) -> Result<()> {
        let port = self.port.as_mut().ok_or(crate::base::Error::NotConnected)?;
        trace!("changing host baudrate to {}", baudrate);
        port.set_baud_rate(baudrate)?;
        // Whatever was buffered was framed at the old rate.
        self.buffer.clear();
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let port = self.port.as_mut().ok_or(crate::base::Error::NotConnected)?;
        Ok(port.write(data)?)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(crate::base::Error::NotConnected)?;

        if self.buffer.is_empty() {
            port.set_timeout(max(timeout, Duration::from_millis(1)))?;
            let mut chunk = [0u8; 256];
            match port.read(&mut chunk) {
                Ok(n) => {
                    let _ = self.buffer.write(&chunk[..n]);
                }
                Err(err) if err.kind() == io::ErrorKind::TimedOut => return Ok(0),
                Err(err) => return Err(err.into()),
            }
        }

        Ok(self.buffer.read(buf)?)
    }

    fn unget(&mut self, byte: u8) {
        self.buffer.push_front(byte);
    }
}

/// Returns the recognized serial port names, with ports that look like URG
/// sensors moved to the front.
pub fn find_ports() -> Vec<String> {
    let mut names: Vec<String> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(|info| info.port_name)
        .collect();

    let mut replaced_index = 0;
    for i in 0..names.len() {
        if is_urg_port(&names[i]) && i > replaced_index {
            names.swap(i, replaced_index);
            replaced_index += 1;
        }
    }

    names
}

/// Advisory check whether `port_name` belongs to a Hokuyo URG device, based
/// on the USB product string the OS reports for the port.
pub fn is_urg_port(port_name: &str) -> bool {
    let Ok(ports) = serialport::available_ports() else {
        return false;
    };

    ports.iter().any(|info| {
        if info.port_name != port_name {
            return false;
        }
        match &info.port_type {
            SerialPortType::UsbPort(usb) => usb
                .product
                .as_deref()
                .map(|product| URG_DRIVER_NAMES.contains(&product))
                .unwrap_or(false),
            _ => false,
        }
    })
}
