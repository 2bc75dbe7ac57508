//! This module contains the pure, stateless kernels for the self-describing
//! variable-byte encoding of single u32 values, plus the array wrappers with
//! the uncompressed escape.
//!
//! The lead byte selects one of four size classes. Class boundaries are
//! chosen so every marker value carries payload bits, which buys a wider
//! 1-byte and 2-byte range than plain LEB128:
//!
//! | lead byte      | total bytes | value range            |
//! |----------------|-------------|------------------------|
//! | `0x00..=0x9B`  | 1           | `[0, 156)`             |
//! | `0x9C..=0xDB`  | 2           | `[156, 16540)`         |
//! | `0xDC..=0xFB`  | 3           | `[16540, 2113692)`     |
//! | `0xFC`         | 4           | `[2113692, 2^24)`      |
//! | `0xFD`         | 5           | `[2^24, 2^32)`         |
//!
//! `0xFE` is never produced. `0xFF` is reserved by the array wrapper as the
//! escape marker for raw little-endian storage.

use crate::bits;
use crate::error::PforError;

const THRESHOLD_2BYTE: u32 = 156;
const THRESHOLD_3BYTE: u32 = 16_540;
const THRESHOLD_4PLUS: u32 = 2_113_692;

const MARKER_2BYTE: u32 = 0x9C;
const MARKER_3BYTE: u32 = 0xDC;
const MARKER_4PLUS: u32 = 0xFC;

/// Escape marker: the array is stored raw, 4 bytes per value.
const ESCAPE_UNCOMPRESSED: u8 = 0xFF;

/// The escape is taken unless variable-byte form saves at least this many
/// bytes over raw storage. Fixed; changing it breaks cross-compatibility.
const ESCAPE_MARGIN: usize = 32;

/// Encoded size in bytes of a single value.
#[inline]
pub fn encoded_len(x: u32) -> usize {
    if x < THRESHOLD_2BYTE {
        1
    } else if x < THRESHOLD_3BYTE {
        2
    } else if x < THRESHOLD_4PLUS {
        3
    } else if x <= 0x00FF_FFFF {
        4
    } else {
        5
    }
}

/// Encodes a single value into the front of `out`; returns bytes written.
pub fn encode_one(x: u32, out: &mut [u8]) -> Result<usize, PforError> {
    let need = encoded_len(x);
    if out.len() < need {
        return Err(PforError::BufferTooSmall {
            need,
            have: out.len(),
        });
    }
    if x < THRESHOLD_2BYTE {
        out[0] = x as u8;
    } else if x < THRESHOLD_3BYTE {
        let delta = x - THRESHOLD_2BYTE;
        out[0] = (MARKER_2BYTE + (delta >> 8)) as u8;
        out[1] = delta as u8;
    } else if x < THRESHOLD_4PLUS {
        let delta = x - THRESHOLD_3BYTE;
        out[0] = (MARKER_3BYTE + (delta >> 16)) as u8;
        out[1] = delta as u8;
        out[2] = (delta >> 8) as u8;
    } else if x <= 0x00FF_FFFF {
        out[0] = MARKER_4PLUS as u8;
        out[1] = x as u8;
        out[2] = (x >> 8) as u8;
        out[3] = (x >> 16) as u8;
    } else {
        out[0] = (MARKER_4PLUS + 1) as u8;
        bits::store_u32_le(out, 1, x);
    }
    Ok(need)
}

/// Decodes a single value from the front of `input`; returns the value and
/// the number of bytes consumed.
pub fn decode_one(input: &[u8]) -> Result<(u32, usize), PforError> {
    let marker = *input.first().ok_or(PforError::TruncatedInput {
        offset: 0,
        needed: 1,
    })? as u32;

    let (data_len, value) = if marker < MARKER_2BYTE {
        return Ok((marker, 1));
    } else if marker < MARKER_3BYTE {
        require(input, 1, 1)?;
        (1, ((marker - MARKER_2BYTE) << 8) + input[1] as u32 + THRESHOLD_2BYTE)
    } else if marker < MARKER_4PLUS {
        require(input, 1, 2)?;
        (
            2,
            bits::load_u16_le(input, 1) as u32 + ((marker - MARKER_3BYTE) << 16) + THRESHOLD_3BYTE,
        )
    } else if marker == MARKER_4PLUS {
        require(input, 1, 3)?;
        (3, bits::load_u24_le(input, 1))
    } else {
        require(input, 1, 4)?;
        (4, bits::load_u32_le(input, 1))
    };
    Ok((value, 1 + data_len))
}

#[inline]
fn require(input: &[u8], at: usize, needed: usize) -> Result<(), PforError> {
    if input.len() < at + needed {
        return Err(PforError::TruncatedInput {
            offset: input.len(),
            needed: at + needed - input.len(),
        });
    }
    Ok(())
}

/// Encodes `values` as a variable-byte array, falling back to the raw
/// escape form when compression would save fewer than 32 bytes.
/// Returns bytes written.
pub fn encode(values: &[u32], out: &mut [u8]) -> Result<usize, PforError> {
    let vb_len: usize = values.iter().map(|&v| encoded_len(v)).sum();
    let raw_len = values.len() * 4;

    if vb_len + ESCAPE_MARGIN > raw_len {
        let need = 1 + raw_len;
        if out.len() < need {
            return Err(PforError::BufferTooSmall {
                need,
                have: out.len(),
            });
        }
        out[0] = ESCAPE_UNCOMPRESSED;
        bits::copy_u32s_to_le(&mut out[1..], values);
        return Ok(need);
    }

    if out.len() < vb_len {
        return Err(PforError::BufferTooSmall {
            need: vb_len,
            have: out.len(),
        });
    }
    let mut pos = 0;
    for &v in values {
        pos += encode_one(v, &mut out[pos..])?;
    }
    Ok(pos)
}

/// Decodes `out.len()` values from the front of `input`; returns bytes
/// consumed. Detects the raw escape form from the first byte.
pub fn decode(input: &[u8], out: &mut [u32]) -> Result<usize, PforError> {
    let first = *input.first().ok_or(PforError::TruncatedInput {
        offset: 0,
        needed: 1,
    })?;

    if first == ESCAPE_UNCOMPRESSED {
        let need = 1 + out.len() * 4;
        if input.len() < need {
            return Err(PforError::TruncatedInput {
                offset: input.len(),
                needed: need - input.len(),
            });
        }
        bits::copy_u32s_from_le(&input[1..], out);
        return Ok(need);
    }

    let mut pos = 0;
    for v in out.iter_mut() {
        let (value, used) = decode_one(&input[pos..])?;
        *v = value;
        pos += used;
    }
    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value_class_boundaries() {
        let cases: &[(u32, &[u8])] = &[
            (0, &[0x00]),
            (155, &[0x9B]),
            (156, &[0x9C, 0x00]),
            (16_539, &[0xDB, 0xFF]),
            (16_540, &[0xDC, 0x00, 0x00]),
            (2_113_691, &[0xFB, 0xFF, 0xFF]),
            (2_113_692, &[0xFC, 0x9C, 0x40, 0x20]),
            (0x00FF_FFFF, &[0xFC, 0xFF, 0xFF, 0xFF]),
            (0x0100_0000, &[0xFD, 0x00, 0x00, 0x00, 0x01]),
            (u32::MAX, &[0xFD, 0xFF, 0xFF, 0xFF, 0xFF]),
        ];
        for &(value, expected) in cases {
            let mut buf = [0u8; 5];
            let written = encode_one(value, &mut buf).unwrap();
            assert_eq!(&buf[..written], expected, "encoding of {value}");
            let (back, consumed) = decode_one(expected).unwrap();
            assert_eq!((back, consumed), (value, expected.len()));
        }
    }

    #[test]
    fn test_array_roundtrip_compressible() {
        // 40 small values compress well below the raw form minus the margin.
        let values: Vec<u32> = (0..40).collect();
        let mut buf = [0u8; 256];
        let written = encode(&values, &mut buf).unwrap();
        assert_eq!(written, 40);
        assert_ne!(buf[0], 0xFF);

        let mut back = vec![0u32; values.len()];
        let consumed = decode(&buf[..written], &mut back).unwrap();
        assert_eq!(consumed, written);
        assert_eq!(back, values);
    }

    #[test]
    fn test_array_escape_when_savings_too_small() {
        // Few values: even maximal compression saves less than the margin.
        let values = [1u32, 2, 3];
        let mut buf = [0u8; 64];
        let written = encode(&values, &mut buf).unwrap();
        assert_eq!(buf[0], 0xFF);
        assert_eq!(written, 1 + 12);

        let mut back = [0u32; 3];
        let consumed = decode(&buf[..written], &mut back).unwrap();
        assert_eq!(consumed, written);
        assert_eq!(back, values);
    }

    #[test]
    fn test_decode_truncated_stream() {
        let mut buf = [0u8; 5];
        let written = encode_one(0x0100_0000, &mut buf).unwrap();
        let result = decode_one(&buf[..written - 1]);
        assert!(matches!(result, Err(PforError::TruncatedInput { .. })));
    }
}
