//! Integrity tags for logged samples.
//!
//! A tag is the FNV-1a 32-bit hash of the temperature's decimal text followed by the
//! sample's timestamp text, rendered as 8 lowercase hex digits. It is a cheap
//! tamper/corruption hint for the exported log, not a cryptographic checksum.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Width of a rendered tag in hex digits.
pub const TAG_WIDTH: usize = 8;

/// FNV-1a, 32-bit.
pub fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut h = FNV_OFFSET_BASIS;
    for &b in bytes {
        h ^= u32::from(b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Tag for a reading taken at `timestamp`.
///
/// `timestamp` must be the exact text written to the export file so the tag can be
/// recomputed from a row of the log.
pub fn integrity_tag(temperature: f64, timestamp: &str) -> String {
    let data = format!("{temperature}{timestamp}");
    format!("{:08x}", fnv1a32(data.as_bytes()))
}

/// Recomputes the tag and compares it with `tag`.
pub fn verify_tag(temperature: f64, timestamp: &str, tag: &str) -> bool {
    integrity_tag(temperature, timestamp) == tag
}
