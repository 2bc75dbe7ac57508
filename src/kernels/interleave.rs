//! This module contains the lane-interleaved bit-packing kernels: the
//! 4-lane "128v" and 8-lane "256v" layouts used for the fixed 128- and
//! 256-value block sizes.
//!
//! Values are processed in 32 groups of `LANES` consecutive inputs. Each
//! lane owns a 32-bit accumulator; the low `b` bits of every lane's value
//! are inserted at a shared bit offset, and whenever the offset crosses 32
//! a full stripe (`4 * LANES` bytes, lane 0 first, each lane little-endian)
//! is emitted and the straddling high bits carry into fresh accumulators.
//! A 128-bit or 256-bit SIMD unit can process one stripe per iteration with
//! only shift/or/and operations; the scalar form below is the normative
//! definition of the layout and is bit-identical to such an implementation.
//!
//! Total payload is `16*b` bytes (128v) or `32*b` bytes (256v). `b = 0`
//! has no payload; `b = 32` degenerates to a little-endian copy.

use crate::bits;
use crate::error::PforError;

/// Groups per block; fixed by the layout.
const GROUPS: usize = 32;

/// Packs `LANES * 32` values; returns bytes written.
pub(crate) fn pack_lanes<const LANES: usize>(
    input: &[u32],
    b: u32,
    out: &mut [u8],
) -> Result<usize, PforError> {
    debug_assert_eq!(input.len(), LANES * GROUPS);
    let total = bits::bytes_for_bits(input.len() * b as usize);
    if out.len() < total {
        return Err(PforError::BufferTooSmall {
            need: total,
            have: out.len(),
        });
    }
    if b == 0 {
        return Ok(0);
    }
    if b == 32 {
        bits::copy_u32s_to_le(out, input);
        return Ok(total);
    }

    let m = bits::mask(b);
    let mut acc = [0u32; LANES];
    let mut shift: u32 = 0;
    let mut pos = 0usize;

    for group in input.chunks_exact(LANES) {
        if shift == 0 {
            for (a, &v) in acc.iter_mut().zip(group) {
                *a = v & m;
            }
        } else {
            for (a, &v) in acc.iter_mut().zip(group) {
                *a |= (v & m) << shift;
            }
        }
        shift += b;

        if shift >= 32 {
            for &a in &acc {
                bits::store_u32_le(out, pos, a);
                pos += 4;
            }
            shift -= 32;
            if shift > 0 {
                for (a, &v) in acc.iter_mut().zip(group) {
                    *a = (v & m) >> (b - shift);
                }
            } else {
                acc = [0; LANES];
            }
        }
    }

    if shift > 0 {
        for &a in &acc {
            bits::store_u32_le(out, pos, a);
            pos += 4;
        }
    }
    debug_assert_eq!(pos, total);
    Ok(total)
}

/// Unpacks `LANES * 32` values, optionally fusing the first-order delta
/// decode (`DELTA`), mirroring [`pack_lanes`]. Returns bytes consumed.
pub(crate) fn unpack_lanes<const LANES: usize, const DELTA: bool>(
    input: &[u8],
    b: u32,
    start: u32,
    out: &mut [u32],
) -> Result<usize, PforError> {
    debug_assert_eq!(out.len(), LANES * GROUPS);
    if b > bits::MAX_BITS {
        return Err(PforError::MalformedHeader("bit width above 32"));
    }
    let total = bits::bytes_for_bits(out.len() * b as usize);
    if input.len() < total {
        return Err(PforError::TruncatedInput {
            offset: input.len(),
            needed: total - input.len(),
        });
    }

    let mut acc = start;
    if b == 0 {
        for slot in out.iter_mut() {
            if DELTA {
                acc = acc.wrapping_add(1);
                *slot = acc;
            } else {
                *slot = 0;
            }
        }
        return Ok(0);
    }
    if b == 32 {
        if DELTA {
            for (i, slot) in out.iter_mut().enumerate() {
                acc = acc.wrapping_add(bits::load_u32_le(input, i * 4)).wrapping_add(1);
                *slot = acc;
            }
        } else {
            bits::copy_u32s_from_le(input, out);
        }
        return Ok(total);
    }

    let m = bits::mask(b);
    let mut cur = [0u32; LANES];
    let mut shift: u32 = 0;
    let mut pos = 0usize;

    for group in out.chunks_exact_mut(LANES) {
        if shift == 0 {
            for c in cur.iter_mut() {
                *c = bits::load_u32_le(input, pos);
                pos += 4;
            }
        }

        let mut vals = [0u32; LANES];
        for (v, &c) in vals.iter_mut().zip(&cur) {
            *v = (c >> shift) & m;
        }
        shift += b;

        if shift >= 32 {
            shift -= 32;
            if shift > 0 {
                for (lane, c) in cur.iter_mut().enumerate() {
                    *c = bits::load_u32_le(input, pos);
                    pos += 4;
                    vals[lane] |= (*c << (b - shift)) & m;
                }
            }
        }

        if DELTA {
            for (slot, v) in group.iter_mut().zip(vals) {
                acc = acc.wrapping_add(v).wrapping_add(1);
                *slot = acc;
            }
        } else {
            group.copy_from_slice(&vals);
        }
    }
    Ok(total)
}

pub fn pack_128v(input: &[u32; 128], b: u32, out: &mut [u8]) -> Result<usize, PforError> {
    pack_lanes::<4>(input, b, out)
}

pub fn unpack_128v(input: &[u8], b: u32, out: &mut [u32; 128]) -> Result<usize, PforError> {
    unpack_lanes::<4, false>(input, b, 0, out)
}

pub fn unpack_d1_128v(
    input: &[u8],
    b: u32,
    start: u32,
    out: &mut [u32; 128],
) -> Result<usize, PforError> {
    unpack_lanes::<4, true>(input, b, start, out)
}

pub fn pack_256v(input: &[u32; 256], b: u32, out: &mut [u8]) -> Result<usize, PforError> {
    pack_lanes::<8>(input, b, out)
}

pub fn unpack_256v(input: &[u8], b: u32, out: &mut [u32; 256]) -> Result<usize, PforError> {
    unpack_lanes::<8, false>(input, b, 0, out)
}

pub fn unpack_d1_256v(
    input: &[u8],
    b: u32,
    start: u32,
    out: &mut [u32; 256],
) -> Result<usize, PforError> {
    unpack_lanes::<8, true>(input, b, start, out)
}
