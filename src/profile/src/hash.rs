/// 64-bit FNV-1a.
///
/// Used wherever a digest must stay identical across processes and program
/// versions (sample source-file hashes, hypothesis GUIDs). The std and ahash
/// hashers are randomly seeded and unsuitable for that.
const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME : u64 = 0x0000_0100_0000_01b3;

pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}
