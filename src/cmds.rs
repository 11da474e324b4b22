//! SCIP command strings and the status codes each command may answer with.
//! Every command is plain ASCII terminated by a single LF.

/// Stop measurement / quit streaming.
pub const CMD_QUIT: &str = "QT\n";

/// Switch a SCIP 1.1 sensor into SCIP 2.0.
pub const CMD_SCIP20: &str = "SCIP2.0\n";

/// Leave time-adjustment (TM) mode.
pub const CMD_TM_QUIT: &str = "TM2\n";

/// Sensor parameter query.
pub const CMD_PARAMETER: &str = "PP\n";

/// Version and serial query.
pub const CMD_VERSION: &str = "VV\n";

/// Turn the laser on.
pub const CMD_LASER_ON: &str = "BM\n";

/// Reboot; takes effect after the second issue.
pub const CMD_REBOOT: &str = "RB\n";

/// Enter sleep mode.
pub const CMD_SLEEP: &str = "%SL\n";

/// Operating state query.
pub const CMD_STATE: &str = "%ST\n";

/// Plain success is the only acceptable answer for most short commands.
pub const EXPECTED_OK: &[&str] = &["00"];

/// `SS` also answers 03 (already at that rate) and 04 (unsupported rate but
/// harmless).
pub const EXPECTED_SS: &[&str] = &["00", "03", "04"];

/// `BM` answers 02 when the laser is already lit.
pub const EXPECTED_BM: &[&str] = &["00", "02"];

/// `RB` answers 01 on the first of the two required issues.
pub const EXPECTED_RB: &[&str] = &["00", "01"];

/// Builds the serial baud-rate change command.
pub fn baudrate_command(baudrate: u32) -> String {
    format!("SS{:06}\n", baudrate)
}

/// Builds a single-scan request (`Gx`/`Hx` family).
pub fn single_scan_command(
    scan_ch: char,
    type_ch: char,
    first_step: i32,
    last_step: i32,
    skip_step: i32,
) -> String {
    format!(
        "{}{}{:04}{:04}{:02}\n",
        scan_ch, type_ch, first_step, last_step, skip_step
    )
}

/// Builds a continuous-scan request (`Mx`/`Nx` family).
pub fn continuous_scan_command(
    scan_ch: char,
    type_ch: char,
    first_step: i32,
    last_step: i32,
    skip_step: i32,
    skip_scan: i32,
    scan_times: i32,
) -> String {
    format!(
        "{}{}{:04}{:04}{:02}{:01}{:02}\n",
        scan_ch, type_ch, first_step, last_step, skip_step, skip_scan, scan_times
    )
}
