//! Ready-made hook sets.

pub mod nonce;
