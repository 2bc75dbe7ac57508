//! Patched frame-of-reference (PFOR) compression for arrays of 32-bit
//! unsigned integers, with the block format used inside inverted-index
//! posting lists and similar sorted-sequence stores.
//!
//! A block of `n` values (`n` in `1..=127` horizontal, exactly 128 or 256
//! interleaved) encodes as a one- or two-byte control header followed by
//! one of four payload shapes: plain bit-packed, bitmap-patched,
//! vbyte-patched, or constant. Decoding is fused with first-order delta
//! reconstruction: for stored deltas `d[i]` and a seed `start`, the output
//! is `out[i] = start + sum(d[0..=i]) + i + 1`, matching strictly
//! increasing sequences stored as gaps-minus-one.
//!
//! The codec holds no state: every call takes caller-provided slices and
//! returns the number of bytes produced or consumed.
//!
//! ```
//! use pfor32::{decode_delta1_block, encode_block, max_encoded_len};
//!
//! let gaps = [0u32; 32]; // a run of consecutive document ids
//! let mut buf = vec![0u8; max_encoded_len(gaps.len())];
//! let written = encode_block(&gaps, &mut buf).unwrap();
//! assert_eq!(&buf[..written], &[0x00]); // all-zero block is one byte
//!
//! let mut ids = [0u32; 32];
//! let consumed = decode_delta1_block(&buf[..written], 32, 0, &mut ids).unwrap();
//! assert_eq!(consumed, written);
//! assert_eq!(ids[..4], [1, 2, 3, 4]);
//! ```

mod bits;
mod block;
pub mod error;
pub mod kernels;

pub use block::{
    decode_delta1_block, decode_delta1_block_128v, decode_delta1_block_256v, encode_block,
    encode_block_128v, encode_block_256v, max_encoded_len,
};
pub use error::PforError;
