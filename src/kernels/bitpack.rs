//! This module contains the pure, stateless kernels for horizontal
//! fixed-width bit-packing and unpacking of u32 values, plus the fused
//! unpack-and-delta-decode variant used on the posting-list hot path.
//!
//! The packed form is a single contiguous bit stream: value `i` occupies
//! bits `[i*b, i*b + b)` counted LSB-first from the start of the output,
//! which on the wire means little-endian bytes. Padding bits in the final
//! byte are zero on encode and ignored on decode. Total size is
//! `ceil(n*b/8)` bytes; the tail is written and read with partial words so
//! the stream boundary is never crossed.

use crate::bits;
use crate::error::PforError;

/// Bytes occupied by `n` packed values at width `b`.
#[inline]
pub fn packed_len(n: usize, b: u32) -> usize {
    bits::bytes_for_bits(n * b as usize)
}

/// Packs the low `b` bits of each input value; returns bytes written.
///
/// `b = 0` writes nothing; `b = 32` degenerates to a little-endian copy.
pub fn pack(input: &[u32], b: u32, out: &mut [u8]) -> Result<usize, PforError> {
    debug_assert!(b <= bits::MAX_BITS);
    let total = packed_len(input.len(), b);
    if out.len() < total {
        return Err(PforError::BufferTooSmall {
            need: total,
            have: out.len(),
        });
    }

    match b {
        0 => {}
        32 => bits::copy_u32s_to_le(out, input),
        8 => {
            for (i, &v) in input.iter().enumerate() {
                out[i] = v as u8;
            }
        }
        16 => {
            for (i, &v) in input.iter().enumerate() {
                bits::store_u16_le(out, i * 2, v as u16);
            }
        }
        _ => {
            let m = bits::mask(b) as u64;
            let mut acc: u64 = 0;
            let mut filled: u32 = 0;
            let mut pos = 0usize;
            for &v in input {
                let v = v as u64 & m;
                acc |= v << filled;
                filled += b;
                if filled >= 64 {
                    bits::store_u64_le(out, pos, acc);
                    pos += 8;
                    filled -= 64;
                    // High bits of the straddling value carry into the
                    // fresh accumulator.
                    acc = if filled > 0 { v >> (b - filled) } else { 0 };
                }
            }
            if filled > 0 {
                bits::store_u64_partial(out, pos, acc, bits::bytes_for_bits(filled as usize));
            }
        }
    }
    Ok(total)
}

/// Unpacks `n` values at width `b`; returns bytes consumed.
pub fn unpack(input: &[u8], n: usize, b: u32, out: &mut [u32]) -> Result<usize, PforError> {
    let total = checked_stream(input, n, b, out)?;
    let stream = &input[..total];

    match b {
        0 => out[..n].fill(0),
        32 => bits::copy_u32s_from_le(stream, &mut out[..n]),
        8 => {
            for i in 0..n {
                out[i] = stream[i] as u32;
            }
        }
        16 => {
            for i in 0..n {
                out[i] = bits::load_u16_le(stream, i * 2) as u32;
            }
        }
        _ => {
            let m = bits::mask(b) as u64;
            for (i, slot) in out[..n].iter_mut().enumerate() {
                let bitpos = i * b as usize;
                let w = bits::load_u64_tail(stream, bitpos >> 3);
                *slot = ((w >> (bitpos & 7)) & m) as u32;
            }
        }
    }
    Ok(total)
}

/// Fused unpack + first-order delta decode: extracts each value `v`,
/// advances the accumulator by `v + 1` starting from `start`, and writes
/// the running value. Identical output to [`unpack`] followed by a
/// prefix-sum-with-plus-one pass, in one sweep over the output.
pub fn unpack_d1(
    input: &[u8],
    n: usize,
    b: u32,
    start: u32,
    out: &mut [u32],
) -> Result<usize, PforError> {
    let total = checked_stream(input, n, b, out)?;
    let stream = &input[..total];
    let mut acc = start;

    match b {
        0 => {
            for slot in out[..n].iter_mut() {
                acc = acc.wrapping_add(1);
                *slot = acc;
            }
        }
        32 => {
            for (i, slot) in out[..n].iter_mut().enumerate() {
                acc = acc.wrapping_add(bits::load_u32_le(stream, i * 4)).wrapping_add(1);
                *slot = acc;
            }
        }
        8 => {
            for (i, slot) in out[..n].iter_mut().enumerate() {
                acc = acc.wrapping_add(stream[i] as u32).wrapping_add(1);
                *slot = acc;
            }
        }
        16 => {
            for (i, slot) in out[..n].iter_mut().enumerate() {
                acc = acc.wrapping_add(bits::load_u16_le(stream, i * 2) as u32).wrapping_add(1);
                *slot = acc;
            }
        }
        _ => {
            let m = bits::mask(b) as u64;
            for (i, slot) in out[..n].iter_mut().enumerate() {
                let bitpos = i * b as usize;
                let w = bits::load_u64_tail(stream, bitpos >> 3);
                let v = ((w >> (bitpos & 7)) & m) as u32;
                acc = acc.wrapping_add(v).wrapping_add(1);
                *slot = acc;
            }
        }
    }
    Ok(total)
}

/// Validates width, input length and output capacity; returns the packed
/// stream length in bytes.
fn checked_stream(input: &[u8], n: usize, b: u32, out: &[u32]) -> Result<usize, PforError> {
    if b > bits::MAX_BITS {
        return Err(PforError::MalformedHeader("bit width above 32"));
    }
    if out.len() < n {
        return Err(PforError::BufferTooSmall {
            need: n * 4,
            have: out.len() * 4,
        });
    }
    let total = packed_len(n, b);
    if input.len() < total {
        return Err(PforError::TruncatedInput {
            offset: input.len(),
            needed: total - input.len(),
        });
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Bit-by-bit reference packer; the accumulator path must be
    /// byte-identical to this for every (n, b).
    fn pack_naive(input: &[u32], b: u32) -> Vec<u8> {
        let mut out = vec![0u8; packed_len(input.len(), b)];
        for (i, &v) in input.iter().enumerate() {
            for j in 0..b as usize {
                if (v >> j) & 1 == 1 {
                    let bit = i * b as usize + j;
                    out[bit >> 3] |= 1 << (bit & 7);
                }
            }
        }
        out
    }

    fn random_values(n: usize, b: u32, rng: &mut StdRng) -> Vec<u32> {
        (0..n).map(|_| rng.gen::<u32>() & crate::bits::mask(b)).collect()
    }

    #[test]
    fn test_pack_matches_bit_reference() {
        let mut rng = StdRng::seed_from_u64(7);
        for b in 0..=32 {
            for n in [1usize, 2, 7, 8, 31, 32, 33, 63, 64, 65, 127] {
                let values = random_values(n, b, &mut rng);
                let mut packed = vec![0u8; packed_len(n, b)];
                let written = pack(&values, b, &mut packed).unwrap();
                assert_eq!(written, packed.len());
                assert_eq!(packed, pack_naive(&values, b), "n={n} b={b}");
            }
        }
    }

    #[test]
    fn test_roundtrip_all_widths() {
        let mut rng = StdRng::seed_from_u64(11);
        for b in 0..=32 {
            for n in [1usize, 5, 32, 100, 127] {
                let values = random_values(n, b, &mut rng);
                let mut packed = vec![0u8; packed_len(n, b)];
                pack(&values, b, &mut packed).unwrap();

                let mut back = vec![0u32; n];
                let consumed = unpack(&packed, n, b, &mut back).unwrap();
                assert_eq!(consumed, packed.len());
                assert_eq!(back, values, "n={n} b={b}");
            }
        }
    }

    #[test]
    fn test_fused_delta_equals_sequential() {
        let mut rng = StdRng::seed_from_u64(13);
        for b in [0u32, 1, 7, 8, 16, 31, 32] {
            let n = 96;
            let values = random_values(n, b, &mut rng);
            let mut packed = vec![0u8; packed_len(n, b)];
            pack(&values, b, &mut packed).unwrap();

            let start = 1_000_000;
            let mut fused = vec![0u32; n];
            unpack_d1(&packed, n, b, start, &mut fused).unwrap();

            let mut plain = vec![0u32; n];
            unpack(&packed, n, b, &mut plain).unwrap();
            let mut acc = start;
            for v in plain.iter_mut() {
                acc = acc.wrapping_add(*v).wrapping_add(1);
                *v = acc;
            }
            assert_eq!(fused, plain, "b={b}");
        }
    }

    #[test]
    fn test_zero_width_delta_ramp() {
        let mut out = vec![0u32; 8];
        let consumed = unpack_d1(&[], 8, 0, 41, &mut out).unwrap();
        assert_eq!(consumed, 0);
        assert_eq!(out, vec![42, 43, 44, 45, 46, 47, 48, 49]);
    }

    #[test]
    fn test_unpack_rejects_short_input() {
        let values = [3u32; 16];
        let mut packed = vec![0u8; packed_len(16, 5)];
        pack(&values, 5, &mut packed).unwrap();
        let mut out = vec![0u32; 16];
        let result = unpack(&packed[..packed.len() - 1], 16, 5, &mut out);
        assert!(matches!(result, Err(PforError::TruncatedInput { .. })));
    }

    #[test]
    fn test_padding_bits_are_zero() {
        // 3 values at b=3 leave 7 padding bits in the last of 2 bytes.
        let values = [7u32, 7, 7];
        let mut packed = [0xAAu8; 2];
        pack(&values, 3, &mut packed).unwrap();
        assert_eq!(packed[1] >> 1, 0);
    }
}
