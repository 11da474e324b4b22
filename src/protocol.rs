//! The SCIP request/response engine. One call of [`transact`] issues a
//! command, validates the echo-back, classifies the status code against the
//! caller's expected set, checks every payload line's checksum, and consumes
//! the block up to its empty terminating line.

use crate::base::{Channel, Error, Result};
use crate::checksum;
use log::{trace, warn};
use std::time::Duration;

/// Issues `command` and collects the response block.
///
/// On success the returned vector holds the status line followed by the
/// payload lines, checksums still attached. A well-formed but unexpected
/// status is reported only after the block has been consumed, so the
/// transport is left positioned at the byte after the terminating empty line;
/// framing-level failures (echo mismatch, malformed status, bad checksum)
/// abort immediately and the caller is expected to drain.
pub(crate) fn transact(
    channel: &mut Channel,
    command: &str,
    expected: &[&str],
    timeout: Duration,
) -> Result<Vec<String>> {
    let written = channel.write(command.as_bytes())?;
    if written != command.len() {
        return Err(Error::Send);
    }
    trace!("sent {:?}", command.trim_end());

    let echo = command.strip_suffix('\n').unwrap_or(command);
    let Some(line) = channel.read_line(timeout)? else {
        return Err(Error::NoResponse);
    };
    if !line.starts_with(echo.as_bytes()) {
        warn!(
            "echo-back mismatch: sent {:?}, got {:?}",
            echo,
            String::from_utf8_lossy(&line)
        );
        return Err(Error::InvalidResponse { status: None });
    }

    let Some(status) = channel.read_line(timeout)? else {
        return Err(Error::NoResponse);
    };
    let mut rejected_status = None;
    match status.len() {
        // A single character is a SCIP 1.1 answer; accepted as success.
        1 => {}
        3 => {
            if !checksum::verify_line(&status) {
                return Err(Error::Checksum);
            }
            let code = String::from_utf8_lossy(&status[..2]).into_owned();
            if !expected.contains(&code.as_str()) {
                rejected_status = Some(code);
            }
        }
        _ => return Err(Error::InvalidResponse { status: None }),
    }

    let mut lines = vec![String::from_utf8_lossy(&status).into_owned()];
    loop {
        let Some(line) = channel.read_line(timeout)? else {
            return Err(Error::NoResponse);
        };
        if line.is_empty() {
            break;
        }
        if !checksum::verify_line(&line) {
            return Err(Error::Checksum);
        }
        lines.push(String::from_utf8_lossy(&line).into_owned());
    }

    match rejected_status {
        Some(code) => {
            warn!("unexpected status {:?} for {:?}", code, echo);
            Err(Error::InvalidResponse { status: Some(code) })
        }
        None => Ok(lines),
    }
}
