//! Scripted transport used by the protocol and driver tests.
//!
//! Bytes can be parked up front with [`ScriptedConnection::feed`], or staged
//! with [`ScriptedConnection::reply`] so they only appear after the driver
//! writes a specific command — which is how a real sensor behaves, and what
//! keeps drains from swallowing responses that have not been provoked yet.
//! Streams are keyed by baud rate so autobaud scenarios can model a sensor
//! that only answers at its real rate.

use crate::base::traits::Connection;
use crate::base::Result;
use crate::checksum;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

struct Reply {
    baudrate: u32,
    command: Vec<u8>,
    response: Vec<u8>,
    used: bool,
}

pub(crate) struct ScriptedConnection {
    pending: HashMap<u32, VecDeque<u8>>,
    replies: Vec<Reply>,
    baudrate: u32,
    pub written: Vec<u8>,
    open: bool,
}

impl ScriptedConnection {
    pub fn new(baudrate: u32) -> ScriptedConnection {
        ScriptedConnection {
            pending: HashMap::new(),
            replies: Vec::new(),
            baudrate,
            written: Vec::new(),
            open: true,
        }
    }

    /// Parks bytes that are readable immediately once the host listens at
    /// `baudrate`.
    pub fn feed(&mut self, baudrate: u32, bytes: &[u8]) {
        self.pending
            .entry(baudrate)
            .or_default()
            .extend(bytes.iter().copied());
    }

    /// Stages `response` to become readable when the host, listening at
    /// `baudrate`, writes exactly `command`. Each staged reply fires once,
    /// in staging order when commands repeat.
    pub fn reply(&mut self, baudrate: u32, command: &[u8], response: &[u8]) {
        self.replies.push(Reply {
            baudrate,
            command: command.to_vec(),
            response: response.to_vec(),
            used: false,
        });
    }

    pub fn remaining(&self, baudrate: u32) -> usize {
        self.pending.get(&baudrate).map_or(0, VecDeque::len)
    }
}

impl Connection for ScriptedConnection {
    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn change_baudrate(&mut self, baudrate: u32) -> Result<()> {
        self.baudrate = baudrate;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.written.extend_from_slice(data);

        let current_baudrate = self.baudrate;
        let response = self
            .replies
            .iter_mut()
            .find(|reply| !reply.used && reply.baudrate == current_baudrate && reply.command == data)
            .map(|reply| {
                reply.used = true;
                reply.response.clone()
            });
        if let Some(response) = response {
            self.feed(current_baudrate, &response);
        }

        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let Some(stream) = self.pending.get_mut(&self.baudrate) else {
            return Ok(0);
        };
        let mut filled = 0;
        while filled < buf.len() {
            match stream.pop_front() {
                Some(byte) => {
                    buf[filled] = byte;
                    filled += 1;
                }
                None => break,
            }
        }
        Ok(filled)
    }

    fn unget(&mut self, byte: u8) {
        self.pending
            .entry(self.baudrate)
            .or_default()
            .push_front(byte);
    }
}

/// Shared handle, so tests can keep inspecting the script after the channel
/// has taken ownership of its clone.
impl Connection for Rc<RefCell<ScriptedConnection>> {
    fn is_open(&self) -> bool {
        self.borrow().is_open()
    }

    fn close(&mut self) {
        self.borrow_mut().close();
    }

    fn change_baudrate(&mut self, baudrate: u32) -> Result<()> {
        self.borrow_mut().change_baudrate(baudrate)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.borrow_mut().write(data)
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        self.borrow_mut().read(buf, timeout)
    }

    fn unget(&mut self, byte: u8) {
        self.borrow_mut().unget(byte);
    }
}

/// Builds a data line: content, checksum over the content, LF.
pub(crate) fn data_line(content: &[u8]) -> Vec<u8> {
    let mut line = content.to_vec();
    line.push(checksum::line_checksum(content));
    line.push(b'\n');
    line
}

/// Builds a key/value response line: content, `;`, checksum over the
/// content, LF. Exercises the minus-two checksum prefix.
pub(crate) fn field_line(content: &str) -> Vec<u8> {
    let mut line = content.as_bytes().to_vec();
    line.push(b';');
    line.push(checksum::line_checksum(content.as_bytes()));
    line.push(b'\n');
    line
}
