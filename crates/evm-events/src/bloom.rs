//! Block bloom filters.
//!
//! A 2048-bit filter over every emitter address and topic in a block. A miss
//! means the value is definitely absent; a hit may be a false positive.

use crate::EventError;
use alloy_primitives::{hex, Address, Bloom, BloomInput, B256};

const BLOOM_BYTES: usize = 256;

/// Parses the hex `logsBloom` field of a block or receipt.
pub fn parse_bloom(raw: &str) -> Result<Bloom, EventError> {
	let bytes = hex::decode(raw)
		.map_err(|e| EventError::Processing(format!("Malformed logs bloom: {}", e)))?;
	if bytes.len() != BLOOM_BYTES {
		return Err(EventError::Processing(format!(
			"Malformed logs bloom: expected {} bytes, got {}",
			BLOOM_BYTES,
			bytes.len()
		)));
	}
	Ok(Bloom::from_slice(&bytes))
}

pub fn may_contain_address(bloom: &Bloom, address: &Address) -> bool {
	bloom.contains_input(BloomInput::Raw(address.as_slice()))
}

pub fn may_contain_topic(bloom: &Bloom, topic: &B256) -> bool {
	bloom.contains_input(BloomInput::Raw(topic.as_slice()))
}
