//! Formatting helpers shared by the client crates.

pub mod formatting;

pub use formatting::{format_units, truncate_id, without_0x_prefix};
