//! Streaming decoder for measurement data lines.
//!
//! The sensor splits a scan across lines at arbitrary byte boundaries, so the
//! parser keeps the undecoded tail of the previous line and is fed one
//! checksummed line at a time. Output arrays are indexed by
//! `step * echo_size + echo_slot`; single-echo modes use an echo size of one.

use crate::base::{Error, Result};
use crate::checksum;
use crate::codec;
use crate::internals::MAX_ECHO_SIZE;
use crate::types::MeasurementType;

pub(crate) struct RangeDataParser {
    line_buf: Vec<u8>,
    step_filled: usize,
    multiecho_index: usize,
    range_bytes: usize,
    data_size: usize,
    is_intensity: bool,
    is_multiecho: bool,
    echo_size: usize,
    max_steps: usize,
}

impl RangeDataParser {
    /// `range_data_byte` comes from the echo-back (2 for legacy `GS`, else
    /// 3); `max_steps` is the received `last_index - first_index`.
    pub fn new(kind: MeasurementType, range_data_byte: usize, max_steps: usize) -> RangeDataParser {
        let is_intensity = kind.has_intensity();
        let is_multiecho = kind.is_multiecho();
        RangeDataParser {
            line_buf: Vec::with_capacity(128),
            step_filled: 0,
            multiecho_index: 0,
            range_bytes: range_data_byte,
            data_size: if is_intensity {
                range_data_byte + 3
            } else {
                range_data_byte
            },
            is_intensity,
            is_multiecho,
            echo_size: if is_multiecho { MAX_ECHO_SIZE } else { 1 },
            max_steps,
        }
    }

    /// Primary-echo steps decoded so far.
    pub fn steps(&self) -> usize {
        self.step_filled
    }

    /// Feeds one data line (checksum byte still attached) and decodes every
    /// complete value it completes. `range` and `intensity` may each be
    /// absent; decoding advances either way.
    pub fn push_line(
        &mut self,
        line: &[u8],
        mut range: Option<&mut [i64]>,
        mut intensity: Option<&mut [u16]>,
    ) -> Result<()> {
        let n = line.len();
        if n < 2 || line[n - 1] != checksum::line_checksum(&line[..n - 1]) {
            return Err(Error::Checksum);
        }
        self.line_buf.extend_from_slice(&line[..n - 1]);

        let mut p = 0;
        while self.line_buf.len() - p >= self.data_size {
            if self.line_buf[p] == b'&' {
                // A continuation echo of the previous step. Wait for more
                // data unless a full value follows the marker.
                if self.line_buf.len() - (p + 1) < self.data_size {
                    break;
                }
                self.step_filled = self.step_filled.checked_sub(1).ok_or(Error::Receive)?;
                self.multiecho_index += 1;
                p += 1;
                if self.multiecho_index >= self.echo_size {
                    return Err(Error::Receive);
                }
            } else {
                self.multiecho_index = 0;
            }

            if self.step_filled > self.max_steps {
                return Err(Error::Receive);
            }
            let index = self.step_filled * self.echo_size + self.multiecho_index;

            // Missing echoes must be explicitly absent, so the trailing
            // slots are cleared when a step starts.
            if self.is_multiecho && self.multiecho_index == 0 {
                if let Some(range) = range.as_deref_mut() {
                    range[index + 1..index + self.echo_size].fill(0);
                }
                if let Some(intensity) = intensity.as_deref_mut() {
                    intensity[index + 1..index + self.echo_size].fill(0);
                }
            }

            if let Some(range) = range.as_deref_mut() {
                range[index] = codec::decode(&self.line_buf[p..p + self.range_bytes]);
            }
            p += self.range_bytes;

            if self.is_intensity {
                if let Some(intensity) = intensity.as_deref_mut() {
                    intensity[index] = codec::decode(&self.line_buf[p..p + 3]) as u16;
                }
                p += 3;
            }

            self.step_filled += 1;
        }

        self.line_buf.drain(..p);
        Ok(())
    }
}
