//! This module defines the single, unified error type for the entire crate.
//!
//! By using a single error enum, errors from any kernel or block-level stage
//! propagate unchanged up to the public API. The `thiserror` crate is used to
//! reduce boilerplate.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PforError {
    /// The decoder reached the end of the input slice before the block
    /// contract was satisfied.
    #[error("input truncated at offset {offset}: {needed} more byte(s) required")]
    TruncatedInput { offset: usize, needed: usize },

    /// A control or auxiliary byte describes an impossible block: a base
    /// width above 32, a patch width above 31, or an exception set that
    /// cannot fit the block.
    #[error("malformed block header: {0}")]
    MalformedHeader(&'static str),

    /// The output slice cannot hold the worst-case encoded block.
    #[error("output buffer too small: need {need} bytes, have {have}")]
    BufferTooSmall { need: usize, have: usize },

    /// Block size outside the domain of the chosen layout.
    #[error("unsupported block size: {0}")]
    UnsupportedBlockSize(usize),
}
