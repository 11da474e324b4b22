//! SCIP numeric encoding: values are split into six-bit groups, each offset
//! by 0x30 into printable ASCII. Two bytes carry 12-bit ranges, three bytes
//! 18-bit ranges and intensities, four bytes 24-bit timestamps.

/// Decodes a fixed-width SCIP numeric field, most significant group first.
#[inline]
pub fn decode(data: &[u8]) -> i64 {
    let mut value: i64 = 0;
    for byte in data {
        value <<= 6;
        value |= (*byte as i64 - 0x30) & 0x3f;
    }
    value
}

/// Encodes `value` into `size` SCIP bytes, most significant group first.
/// The receiver-side inverse of [`decode`]; the driver itself transmits
/// plain ASCII commands.
pub fn encode(value: i64, size: usize) -> Vec<u8> {
    (0..size)
        .rev()
        .map(|group| (((value >> (6 * group)) & 0x3f) + 0x30) as u8)
        .collect()
}
