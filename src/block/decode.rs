//! Block decoding with the first-order delta fused in.
//!
//! The decoder is a straight-line classifier: read the control byte, pick
//! one of the four shapes, consume its payload, produce `n` outputs. The
//! simple shape (and a bitmap shape whose auxiliary byte says "no
//! exceptions") runs the fused unpack-and-delta kernel; the patched and
//! constant shapes reconstruct raw values first and apply the delta pass
//! afterwards, which yields the same output. Every read is bounds-checked;
//! malformed or truncated input returns an error without advancing.

use bitvec::prelude::{BitSlice, Lsb0};

use crate::bits;
use crate::block::header::{self, Strategy};
use crate::block::{Layout, MAX_VALUES};
use crate::error::PforError;
use crate::kernels::{bitpack, interleave, vbyte};

/// Decodes a block of `n <= 127` values (horizontal layout) and applies the
/// delta with seed `start`; returns bytes consumed.
pub fn decode_delta1_block(
    input: &[u8],
    n: usize,
    start: u32,
    out: &mut [u32],
) -> Result<usize, PforError> {
    if n > 127 {
        return Err(PforError::UnsupportedBlockSize(n));
    }
    if out.len() < n {
        return Err(PforError::BufferTooSmall {
            need: n * 4,
            have: out.len() * 4,
        });
    }
    if n == 0 {
        return Ok(0);
    }
    decode_any(input, n, start, Layout::Horizontal, &mut out[..n])
}

/// Decodes a 128-value block (4-lane interleaved layout) with delta seed
/// `start`; returns bytes consumed.
pub fn decode_delta1_block_128v(
    input: &[u8],
    start: u32,
    out: &mut [u32; 128],
) -> Result<usize, PforError> {
    decode_any(input, 128, start, Layout::V128, out)
}

/// Decodes a 256-value block (8-lane interleaved layout) with delta seed
/// `start`; returns bytes consumed.
pub fn decode_delta1_block_256v(
    input: &[u8],
    start: u32,
    out: &mut [u32; 256],
) -> Result<usize, PforError> {
    decode_any(input, 256, start, Layout::V256, out)
}

fn decode_any(
    input: &[u8],
    n: usize,
    start: u32,
    layout: Layout,
    out: &mut [u32],
) -> Result<usize, PforError> {
    let (hdr, mut pos) = header::parse(input, n)?;

    match hdr.strategy {
        Strategy::Simple => {
            pos += unpack_base_d1(layout, &input[pos..], n, hdr.b, start, out)?;
            Ok(pos)
        }
        Strategy::Constant => {
            let nbytes = bits::bytes_for_bits(hdr.b as usize);
            if input.len() < pos + nbytes {
                return Err(PforError::TruncatedInput {
                    offset: input.len(),
                    needed: pos + nbytes - input.len(),
                });
            }
            let v = (bits::load_u64_tail(&input[..pos + nbytes], pos) as u32) & bits::mask(hdr.b);
            out.fill(v);
            apply_delta1(out, start);
            Ok(pos + nbytes)
        }
        Strategy::Bitmap { patch_bits } => {
            let bitmap_bytes = bits::bytes_for_bits(n);
            if input.len() < pos + bitmap_bytes {
                return Err(PforError::TruncatedInput {
                    offset: input.len(),
                    needed: pos + bitmap_bytes - input.len(),
                });
            }
            let bitmap = &BitSlice::<u8, Lsb0>::from_slice(&input[pos..pos + bitmap_bytes])[..n];
            pos += bitmap_bytes;

            let count = bitmap.count_ones();
            let mut high = [0u32; MAX_VALUES];
            pos += bitpack::unpack(&input[pos..], count, patch_bits, &mut high)?;
            pos += unpack_base(layout, &input[pos..], n, hdr.b, out)?;

            for (k, i) in bitmap.iter_ones().enumerate() {
                out[i] |= ((high[k] as u64) << hdr.b) as u32;
            }
            apply_delta1(out, start);
            Ok(pos)
        }
        Strategy::VByte { count } => {
            pos += unpack_base(layout, &input[pos..], n, hdr.b, out)?;

            let mut high = [0u32; MAX_VALUES];
            pos += vbyte::decode(&input[pos..], &mut high[..count])?;

            if input.len() < pos + count {
                return Err(PforError::TruncatedInput {
                    offset: input.len(),
                    needed: pos + count - input.len(),
                });
            }
            for (k, &p) in input[pos..pos + count].iter().enumerate() {
                let p = p as usize;
                if p >= n {
                    return Err(PforError::MalformedHeader("exception position out of range"));
                }
                out[p] |= ((high[k] as u64) << hdr.b) as u32;
            }
            pos += count;

            apply_delta1(out, start);
            Ok(pos)
        }
    }
}

fn unpack_base(
    layout: Layout,
    input: &[u8],
    n: usize,
    b: u32,
    out: &mut [u32],
) -> Result<usize, PforError> {
    match layout {
        Layout::Horizontal => bitpack::unpack(input, n, b, out),
        Layout::V128 => interleave::unpack_lanes::<4, false>(input, b, 0, out),
        Layout::V256 => interleave::unpack_lanes::<8, false>(input, b, 0, out),
    }
}

fn unpack_base_d1(
    layout: Layout,
    input: &[u8],
    n: usize,
    b: u32,
    start: u32,
    out: &mut [u32],
) -> Result<usize, PforError> {
    match layout {
        Layout::Horizontal => bitpack::unpack_d1(input, n, b, start, out),
        Layout::V128 => interleave::unpack_lanes::<4, true>(input, b, start, out),
        Layout::V256 => interleave::unpack_lanes::<8, true>(input, b, start, out),
    }
}

/// In-place prefix-sum-with-plus-one over raw deltas.
fn apply_delta1(out: &mut [u32], start: u32) {
    let mut acc = start;
    for v in out.iter_mut() {
        acc = acc.wrapping_add(*v).wrapping_add(1);
        *v = acc;
    }
}
