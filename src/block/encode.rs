//! Block encoding: strategy selection, header emission and the four payload
//! shapes, over the three base layouts.
//!
//! Payload byte order per shape:
//! - simple: packed base stream;
//! - bitmap: exception bitmap, horizontally packed high parts, base stream;
//! - vbyte: base stream, vbyte array of high parts, position list;
//! - constant: the repeated value in `ceil(width/8)` little-endian bytes.

use bitvec::prelude::{BitArray, Lsb0};

use crate::bits;
use crate::block::header::{self, Strategy};
use crate::block::selector::{self, Exceptions};
use crate::block::{Layout, MAX_VALUES};
use crate::error::PforError;
use crate::kernels::{bitpack, interleave, vbyte};

pub use crate::block::selector::max_encoded_len;

/// Encodes a block of up to 127 values in the horizontal layout; returns
/// bytes written. An empty block writes nothing.
pub fn encode_block(input: &[u32], out: &mut [u8]) -> Result<usize, PforError> {
    if input.len() > 127 {
        return Err(PforError::UnsupportedBlockSize(input.len()));
    }
    if input.is_empty() {
        return Ok(0);
    }
    encode_any(input, Layout::Horizontal, out)
}

/// Encodes exactly 128 values in the 4-lane interleaved layout.
pub fn encode_block_128v(input: &[u32; 128], out: &mut [u8]) -> Result<usize, PforError> {
    encode_any(input, Layout::V128, out)
}

/// Encodes exactly 256 values in the 8-lane interleaved layout.
pub fn encode_block_256v(input: &[u32; 256], out: &mut [u8]) -> Result<usize, PforError> {
    encode_any(input, Layout::V256, out)
}

fn encode_any(input: &[u32], layout: Layout, out: &mut [u8]) -> Result<usize, PforError> {
    let n = input.len();
    selector::check_capacity(n, out)?;

    let (b, exceptions) = selector::choose(input);
    match exceptions {
        Exceptions::None => {
            let mut pos = header::write(out, b, Strategy::Simple);
            pos += pack_base(layout, input, b, &mut out[pos..])?;
            Ok(pos)
        }
        Exceptions::Constant => {
            // `b` is the width of the repeated value here.
            let pos = header::write(out, b, Strategy::Constant);
            let nbytes = bits::bytes_for_bits(b as usize);
            let v = input[0] & bits::mask(b);
            bits::store_u64_partial(out, pos, v as u64, nbytes);
            Ok(pos + nbytes)
        }
        Exceptions::Patch { width } => encode_patched(input, layout, b, width, out),
        Exceptions::VByte => encode_vbyte(input, layout, b, out),
    }
}

/// Base/high decomposition of a block at a given base width.
struct Split {
    base: [u32; MAX_VALUES],
    high: [u32; MAX_VALUES],
    positions: [u8; MAX_VALUES],
    count: usize,
}

fn split_exceptions(input: &[u32], b: u32) -> Split {
    let m = bits::mask(b);
    let mut split = Split {
        base: [0; MAX_VALUES],
        high: [0; MAX_VALUES],
        positions: [0; MAX_VALUES],
        count: 0,
    };
    for (i, &v) in input.iter().enumerate() {
        split.base[i] = v & m;
        // Branchless scan: the slot is always written, the cursor only
        // advances past it for an actual exception.
        split.positions[split.count] = i as u8;
        split.high[split.count] = v >> b;
        split.count += (v > m) as usize;
    }
    split
}

fn encode_patched(
    input: &[u32],
    layout: Layout,
    b: u32,
    patch_bits: u32,
    out: &mut [u8],
) -> Result<usize, PforError> {
    let n = input.len();
    let split = split_exceptions(input, b);
    let mut pos = header::write(out, b, Strategy::Bitmap { patch_bits });

    let mut bitmap = BitArray::<[u8; MAX_VALUES / 8], Lsb0>::ZERO;
    for &p in &split.positions[..split.count] {
        bitmap.set(p as usize, true);
    }
    let bitmap_bytes = bits::bytes_for_bits(n);
    out[pos..pos + bitmap_bytes].copy_from_slice(&bitmap.as_raw_slice()[..bitmap_bytes]);
    pos += bitmap_bytes;

    pos += bitpack::pack(&split.high[..split.count], patch_bits, &mut out[pos..])?;
    pos += pack_base(layout, &split.base[..n], b, &mut out[pos..])?;
    Ok(pos)
}

fn encode_vbyte(
    input: &[u32],
    layout: Layout,
    b: u32,
    out: &mut [u8],
) -> Result<usize, PforError> {
    let n = input.len();
    let split = split_exceptions(input, b);
    let mut pos = header::write(out, b, Strategy::VByte { count: split.count });

    pos += pack_base(layout, &split.base[..n], b, &mut out[pos..])?;
    pos += vbyte::encode(&split.high[..split.count], &mut out[pos..])?;
    out[pos..pos + split.count].copy_from_slice(&split.positions[..split.count]);
    Ok(pos + split.count)
}

fn pack_base(layout: Layout, values: &[u32], b: u32, out: &mut [u8]) -> Result<usize, PforError> {
    match layout {
        Layout::Horizontal => bitpack::pack(values, b, out),
        Layout::V128 => interleave::pack_lanes::<4>(values, b, out),
        Layout::V256 => interleave::pack_lanes::<8>(values, b, out),
    }
}
