//! 64-bit FNV-1 hashing for filename encoding.
//!
//! Wwise media references are keyed by the FNV-1 hash of the lowercased
//! object path; [`encode_fnv64`] renders that key the way the game data
//! spells it (16 lowercase hex digits). Not used by the pipeline stages
//! themselves.

const FNV64_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Plain FNV-1 (not 1a): multiply first, then xor each byte.
pub fn fnv1_64(input: &[u8]) -> u64 {
    input.iter().fold(FNV64_OFFSET_BASIS, |hash, byte| {
        hash.wrapping_mul(FNV64_PRIME) ^ u64::from(*byte)
    })
}

/// Hash the lowercased input and render it as a zero-padded 16-digit
/// lowercase hex string.
pub fn encode_fnv64(input: &str) -> String {
    format!("{:016x}", fnv1_64(input.to_lowercase().as_bytes()))
}
