//! Per-block strategy selection.
//!
//! The selector scans a block once, builds a histogram of value bit widths,
//! and walks candidate base widths from `maxbits - 1` down to zero,
//! maintaining the exception count and a running estimate of the
//! variable-byte cost incrementally. Every candidate is priced with an
//! exact byte count for the bitmap-patched shape and an estimated byte
//! count for the vbyte-patched shape; the running minimum starts at the
//! simple (exception-free) encoding. The result is the `(base width,
//! exception strategy)` pair the payload writer then realizes.

use crate::bits;
use crate::block::MAX_VALUES;
use crate::error::PforError;

/// Exception strategy picked by [`choose`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exceptions {
    /// Every value fits the base width.
    None,
    /// Bitmap-flagged exceptions, high parts packed at `width` bits.
    Patch { width: u32 },
    /// Variable-byte exceptions with a position list.
    VByte,
    /// All values equal.
    Constant,
}

/// Centered index space for the vbyte cost accumulator: entries are written
/// at `bit width - threshold` for the four encoded-size breakpoints and read
/// back when the candidate width walks past them.
const VB_OFFSET: usize = 32;

/// Bit-width breakpoints at which a vbyte-encoded high part grows by
/// 1, 2, 3 and 4 bytes respectively.
const VB_BREAKS: [usize; 4] = [7, 15, 19, 25];

#[inline]
fn vb_charge(vb: &mut [usize; 64], count: usize, width: usize) {
    for (k, brk) in VB_BREAKS.iter().enumerate() {
        vb[width + VB_OFFSET - brk] += count * (k + 1);
    }
}

/// Scans `input` and returns the `(base width, exception strategy)` pair
/// minimizing the encoded size under the cost model. `input` must be
/// non-empty.
pub(crate) fn choose(input: &[u32]) -> (u32, Exceptions) {
    let n = input.len();
    debug_assert!(n >= 1 && n <= 256);

    let first = input[0];
    let mut or_acc = 0u32;
    let mut eq = 0usize;
    for &v in input {
        or_acc |= v;
        eq += (v == first) as usize;
    }

    if or_acc == 0 {
        return (0, Exceptions::None);
    }
    let max_bits = bits::bit_width(or_acc);
    if eq == n {
        return (max_bits, Exceptions::Constant);
    }

    let mut cnt = [0usize; 33];
    for &v in input {
        cnt[bits::bit_width(v) as usize] += 1;
    }

    let mut best_b = max_bits;
    let mut use_vbyte = false;
    let mut min_size = bits::bytes_for_bits(n * max_bits as usize) + 1;

    // Exceptions and vbyte cost at the current candidate width.
    let mut x = cnt[max_bits as usize];
    let mut vv = x;
    let mut vb = [0usize; 64];
    vb_charge(&mut vb, x, max_bits as usize);

    let bitmap_bytes = bits::bytes_for_bits(n);

    let mut beta = max_bits - 1;
    loop {
        let patch_bits = max_bits - beta;
        let base_bytes = bits::bytes_for_bits(n * beta as usize);

        let vbyte_size = base_bytes + 2 + x + vv;
        let patching_size =
            base_bytes + 2 + bitmap_bytes + bits::bytes_for_bits(x * patch_bits as usize);

        // Candidates the header cannot express are never eligible: a
        // 32-bit patch width has no encoding (the decoder rejects it), and
        // the exception count is a single byte, so a vbyte exception set
        // covering an entire 256-value block is unrepresentable.
        if patch_bits <= 31 && patching_size < min_size && patching_size <= vbyte_size {
            min_size = patching_size;
            best_b = beta;
            use_vbyte = false;
        } else if x < MAX_VALUES && vbyte_size < min_size {
            min_size = vbyte_size;
            best_b = beta;
            use_vbyte = true;
        }

        if beta == 0 {
            break;
        }
        x += cnt[beta as usize];
        vv += cnt[beta as usize] + vb[beta as usize + VB_OFFSET];
        vb_charge(&mut vb, cnt[beta as usize], beta as usize);
        beta -= 1;
    }

    let exceptions = if best_b == max_bits {
        Exceptions::None
    } else if use_vbyte {
        Exceptions::VByte
    } else {
        Exceptions::Patch {
            width: max_bits - best_b,
        }
    };
    log::trace!(
        "selector: n={n} maxbits={max_bits} -> b={best_b} {exceptions:?} (predicted {min_size} bytes)"
    );
    (best_b, exceptions)
}

/// Worst-case encoded size of a block of `n` values, covering the widest
/// header, base, patch and position streams any strategy can emit.
pub const fn max_encoded_len(n: usize) -> usize {
    n * 5 + 64
}

/// Guard used by the encode entry points.
pub(crate) fn check_capacity(n: usize, out: &[u8]) -> Result<(), PforError> {
    let need = max_encoded_len(n);
    if out.len() < need {
        return Err(PforError::BufferTooSmall {
            need,
            have: out.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zero_block() {
        assert_eq!(choose(&[0; 32]), (0, Exceptions::None));
    }

    #[test]
    fn test_constant_block() {
        assert_eq!(choose(&[42; 32]), (6, Exceptions::Constant));
        assert_eq!(choose(&[u32::MAX; 7]), (32, Exceptions::Constant));
    }

    #[test]
    fn test_dense_ramp_is_simple() {
        let values: Vec<u32> = (0..32).collect();
        assert_eq!(choose(&values), (5, Exceptions::None));
    }

    #[test]
    fn test_single_outlier_prefers_vbyte() {
        // One exception costs 1 position byte against ceil(n/8) bitmap
        // bytes, so the vbyte shape wins.
        let mut values: Vec<u32> = (0..32).collect();
        values[13] = 1 << 20;
        assert_eq!(choose(&values), (5, Exceptions::VByte));
    }

    #[test]
    fn test_clustered_outliers_prefer_patching() {
        // A quarter of the block is out of range: position bytes would cost
        // 8, the bitmap costs 4 and the high parts pack at 16 bits.
        let mut values: Vec<u32> = (0..24).collect();
        values.extend((0..8).map(|i| (1 << 20) + i));
        let (b, exceptions) = choose(&values);
        assert_eq!(b, 5);
        assert_eq!(exceptions, Exceptions::Patch { width: 16 });
    }

    #[test]
    fn test_large_sparse_outlier_prefers_vbyte() {
        let mut values = vec![5u32; 16];
        values[15] = 100_000;
        assert_eq!(choose(&values), (3, Exceptions::VByte));
    }

    #[test]
    fn test_never_emits_patch_width_32() {
        // Half zeros, half full-width: patching at base 0 would need a
        // 32-bit patch width, which has no header encoding.
        let mut values = vec![0u32; 16];
        for (i, v) in values.iter_mut().enumerate() {
            if i % 2 == 0 {
                *v = 0x8000_0000 | (i as u32);
            }
        }
        let (b, exceptions) = choose(&values);
        if let Exceptions::Patch { width } = exceptions {
            assert!(width <= 31, "patch width {width} at base {b}");
        }
    }
}
