use crate::base::{Error, Result};
use log::warn;

/// Geometry and timing of the connected sensor, discovered once per session
/// from the `PP` response and immutable afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorParameters {
    /// Smallest measurable distance in millimeters.
    pub min_distance: i64,
    /// Largest measurable distance in millimeters.
    pub max_distance: i64,
    /// Total steps in one full revolution.
    pub area_resolution: i32,
    /// First valid step index.
    pub first_index: i32,
    /// Last valid step index.
    pub last_index: i32,
    /// Step index pointing along the sensor's forward axis.
    pub front_index: i32,
    /// Duration of one scan in microseconds, derived from the motor RPM.
    pub scan_usec: i64,
}

// Bits of the mandatory PP fields, in response order.
const PP_DMIN: u16 = 0x0001;
const PP_DMAX: u16 = 0x0002;
const PP_ARES: u16 = 0x0004;
const PP_AMIN: u16 = 0x0008;
const PP_AMAX: u16 = 0x0010;
const PP_AFRT: u16 = 0x0020;
const PP_SCAN: u16 = 0x0040;
const PP_ALL: u16 = 0x007f;

/// Parses the `PP` response lines into sensor parameters and the product
/// type from the `MODL:` line. Fails with a receive error unless every
/// mandatory field was present.
pub(crate) fn parse_pp_lines(lines: &[String]) -> Result<(SensorParameters, Option<String>)> {
    let mut sensor = SensorParameters::default();
    let mut product_type = None;
    let mut received_bits: u16 = 0;

    for line in lines {
        if let Some(value) = line.strip_prefix("MODL:") {
            product_type = string_value(value).map(|model| strip_vendor(&model).to_owned());
        } else if let Some(value) = line.strip_prefix("DMIN:") {
            sensor.min_distance = numeric_value(value);
            received_bits |= PP_DMIN;
        } else if let Some(value) = line.strip_prefix("DMAX:") {
            sensor.max_distance = numeric_value(value);
            received_bits |= PP_DMAX;
        } else if let Some(value) = line.strip_prefix("ARES:") {
            sensor.area_resolution = numeric_value(value) as i32;
            received_bits |= PP_ARES;
        } else if let Some(value) = line.strip_prefix("AMIN:") {
            sensor.first_index = numeric_value(value) as i32;
            received_bits |= PP_AMIN;
        } else if let Some(value) = line.strip_prefix("AMAX:") {
            sensor.last_index = numeric_value(value) as i32;
            received_bits |= PP_AMAX;
        } else if let Some(value) = line.strip_prefix("AFRT:") {
            sensor.front_index = numeric_value(value) as i32;
            received_bits |= PP_AFRT;
        } else if let Some(value) = line.strip_prefix("SCAN:") {
            let rpm = numeric_value(value);
            if rpm > 0 {
                sensor.scan_usec = 60 * 1000 * 1000 / rpm;
                received_bits |= PP_SCAN;
            }
        }
    }

    if received_bits != PP_ALL {
        warn!(
            "PP response is missing mandatory fields (mask {:#04x})",
            received_bits
        );
        return Err(Error::Receive);
    }

    Ok((sensor, product_type))
}

/// Extracts firmware version (`FIRM:`) and serial id (`SERI:`) from the `VV`
/// response lines. Either may be absent.
pub(crate) fn parse_vv_lines(lines: &[String]) -> (Option<String>, Option<String>) {
    let mut version = None;
    let mut serial_id = None;

    for line in lines {
        if let Some(value) = line.strip_prefix("FIRM:") {
            version = string_value(value).map(|firm| strip_vendor(&firm).to_owned());
        } else if let Some(value) = line.strip_prefix("SERI:") {
            serial_id = string_value(value);
        }
    }

    (version, serial_id)
}

/// A textual value keeps its trailing `;checksum` pair on the wire; drop it.
fn string_value(value: &str) -> Option<String> {
    let cut = value.len().saturating_sub(2);
    if cut > 0 && value.is_char_boundary(cut) {
        Some(value[..cut].to_owned())
    } else {
        None
    }
}

/// A numeric value is the digit run before the semicolon.
fn numeric_value(value: &str) -> i64 {
    let digits: String = value
        .chars()
        .take_while(|ch| ch.is_ascii_digit() || *ch == '-')
        .collect();
    digits.parse().unwrap_or(0)
}

/// Product fields may carry a `(vendor)` subfield; everything from the first
/// parenthesis on is dropped.
fn strip_vendor(value: &str) -> &str {
    match value.find('(') {
        Some(index) => &value[..index],
        None => value,
    }
}
