//! Hash primitives used by the hash-based sharders and metadata
//! initializers.
//!
//! Both functions must stay bit-exact: loaders, sharders, and metadata
//! initializers on different machines agree on key placement only because
//! they agree on these hashes. Do not replace them with a library hasher.

/// 32-bit FNV hash over `data`.
///
/// Offset basis `0x811c9dc5`, prime `0x01000193`, arithmetic mod 2^32.
/// Each step multiplies before xoring the next byte, so the empty input
/// hashes to the offset basis.
#[must_use]
pub fn fnv_hash_32(data: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for &byte in data {
        hash = hash.wrapping_mul(0x0100_0193);
        hash ^= u32::from(byte);
    }
    hash
}

/// 32-bit MurmurHash3 with seed 42 over `data`.
///
/// Blocks are read little-endian; the tail and finalizer follow the
/// reference x86_32 algorithm.
#[must_use]
pub fn murmur_hash_3(data: &[u8]) -> u32 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;
    const SEED: u32 = 42;

    let mut hash = SEED;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(C1);
        k = k.rotate_left(15);
        k = k.wrapping_mul(C2);

        hash ^= k;
        hash = hash.rotate_left(13);
        hash = hash.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail_bytes = chunks.remainder();
    let mut tail: u32 = 0;
    match tail_bytes.len() {
        3 => tail ^= u32::from(tail_bytes[2]) << 16,
        2 => tail ^= u32::from(tail_bytes[1]) << 8,
        1 => tail ^= u32::from(tail_bytes[0]),
        _ => {}
    }
    tail = tail.wrapping_mul(C1);
    tail = tail.rotate_left(15);
    tail = tail.wrapping_mul(C2);
    hash ^= tail;

    hash ^= data.len() as u32;
    hash ^= hash >> 16;
    hash = hash.wrapping_mul(0x85eb_ca6b);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0xc2b2_ae35);
    hash ^= hash >> 16;
    hash
}
