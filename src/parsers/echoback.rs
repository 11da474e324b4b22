//! Classifies measurement echo-backs. The echo-back is the authoritative
//! record of what the sensor is actually sending, so the decoder trusts it
//! over whatever was requested.

use crate::types::MeasurementType;

/// Scan parameters recovered from a measurement echo-back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EchobackInfo {
    pub kind: MeasurementType,
    /// Bytes per range value: 3, or 2 for the legacy `GS` encoding.
    pub range_data_byte: usize,
    pub first_index: i32,
    pub last_index: i32,
    pub skip_step: i32,
}

/// Parses a measurement echo-back line.
///
/// Single-scan echoes are 12 characters starting with `G` or `H`, continuous
/// ones 15 characters starting with `M` or `N`. Returns `None` for `QT` and
/// for anything unrecognized, which callers treat as a stop acknowledgement.
pub(crate) fn parse_echoback(line: &[u8]) -> Option<EchobackInfo> {
    let recognized = matches!(
        (line.len(), line.first()),
        (12, Some(b'G' | b'H')) | (15, Some(b'M' | b'N'))
    );
    if !recognized {
        return None;
    }

    let scan_ch = line[0];
    let (kind, range_data_byte) = match line[1] {
        // Legacy two-byte encoding; parsed on receipt, never issued.
        b'S' => (MeasurementType::Distance, 2),
        b'D' => match scan_ch {
            b'G' | b'M' => (MeasurementType::Distance, 3),
            _ => (MeasurementType::Multiecho, 3),
        },
        b'E' => match scan_ch {
            b'G' | b'M' => (MeasurementType::DistanceIntensity, 3),
            _ => (MeasurementType::MultiechoIntensity, 3),
        },
        _ => return None,
    };

    Some(EchobackInfo {
        kind,
        range_data_byte,
        first_index: parse_decimal(&line[2..6])?,
        last_index: parse_decimal(&line[6..10])?,
        skip_step: parse_decimal(&line[10..12])?,
    })
}

fn parse_decimal(field: &[u8]) -> Option<i32> {
    std::str::from_utf8(field).ok()?.parse().ok()
}
