//! This module is the collection of pure, stateless packing kernels the
//! block codec is composed from. Each sub-module is one wire-level
//! transform; the `block` layer picks and sequences them per block.

/// Self-describing 1-5 byte integer codec with the uncompressed escape.
pub mod vbyte;

/// Horizontal fixed-width packing and the fused delta-decode variant.
pub mod bitpack;

/// 4-lane (128v) and 8-lane (256v) interleaved packing.
pub mod interleave;
