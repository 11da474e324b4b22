//! Session-internal settings and protocol constants.

/// Baud rates a URG sensor may be parked at; bootstrap probes them in order,
/// after moving the caller-requested rate to the front.
pub(crate) const BAUDRATE_CANDIDATES: [u32; 3] = [19200, 38400, 115200];

/// Ethernet sensors always run SCIP at this fixed rate.
pub(crate) const ETHERNET_BAUDRATE: u32 = 115200;

/// Worst-case wait for a single response line during bootstrap, in
/// milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 140;

/// Hardware ceiling on echoes per step.
pub(crate) const MAX_ECHO_SIZE: usize = 3;

/// Minimum `[status, payload...]` entries of a healthy `PP` response.
pub(crate) const PP_RESPONSE_LINES: usize = 9;

/// Minimum `[status, payload...]` entries of a healthy `VV` response.
pub(crate) const VV_RESPONSE_LINES: usize = 6;

/// How many residual blocks `stop_measurement` will absorb while waiting for
/// the QT acknowledgement.
pub(crate) const STOP_MAX_READ_TIMES: usize = 6;

/// Scan window and cadence as requested by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct IndicatedSettings {
    pub first_step: i32,
    pub last_step: i32,
    pub skip_step: i32,
    /// Scan count as written on the wire; zero means infinite.
    pub scan_times: i32,
    /// Zero means derive the timeout from the scan period.
    pub timeout_ms: u64,
}

/// Scan window as the sensor reported it in the last echo-back. The decoder
/// follows these, not the indicated settings, so a sensor that clamps the
/// request is still decoded correctly.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReceivedSettings {
    pub is_multiecho: bool,
    pub first_index: i32,
    pub last_index: i32,
    pub range_data_byte: usize,
    pub skip_step: i32,
}

impl Default for ReceivedSettings {
    fn default() -> ReceivedSettings {
        ReceivedSettings {
            is_multiecho: false,
            first_index: 0,
            last_index: 0,
            range_data_byte: 3,
            skip_step: 0,
        }
    }
}
