//! Event filters and parsed event results.

use crate::block::BlockNumber;
use crate::receipt::{EventLog, TransactionReceipt};
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, B256};
use serde::Serialize;
use std::collections::HashMap;

/// Caller-facing filter for event parsing.
///
/// `parameter_filters[i]` restricts the i-th indexed parameter of the event to
/// any of the listed values; `None` leaves that position unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
	pub from_block: Option<BlockNumber>,
	pub to_block: Option<BlockNumber>,
	/// Emitters to accept in addition to the parser's own contract address.
	pub addresses: Vec<Address>,
	pub parameter_filters: Vec<Option<Vec<DynSolValue>>>,
}

impl EventFilter {
	/// True when a block range is part of the filter.
	pub fn has_block_range(&self) -> bool {
		self.from_block.is_some() || self.to_block.is_some()
	}
}

/// Wire-level filter for `eth_getLogs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub from_block: Option<BlockNumber>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub to_block: Option<BlockNumber>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub address: Vec<Address>,
	/// Positional topic constraints; `None` matches anything, a list matches any member.
	pub topics: Vec<Option<Vec<B256>>>,
}

/// A decoded occurrence of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventParserResult {
	pub event_name: String,
	/// Decoded parameters keyed by name, or by position when unnamed.
	pub decoded_result: HashMap<String, DynSolValue>,
	pub contract_address: Address,
	pub transaction_receipt: Option<TransactionReceipt>,
	pub event_log: Option<EventLog>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_log_filter_serialization() {
		let filter = LogFilter {
			from_block: Some(BlockNumber::Exact(16)),
			to_block: Some(BlockNumber::Latest),
			address: vec![Address::repeat_byte(0xaa)],
			topics: vec![Some(vec![B256::repeat_byte(0x01)]), None],
		};

		let value = serde_json::to_value(&filter).unwrap();
		assert_eq!(value["fromBlock"], json!("0x10"));
		assert_eq!(value["toBlock"], json!("latest"));
		assert_eq!(value["topics"][1], json!(null));
		assert_eq!(value["address"].as_array().unwrap().len(), 1);
	}

	#[test]
	fn test_empty_filter_omits_optional_fields() {
		let value = serde_json::to_value(LogFilter::default()).unwrap();
		assert!(value.get("fromBlock").is_none());
		assert!(value.get("address").is_none());
		assert_eq!(value["topics"], json!([]));
		assert!(!EventFilter::default().has_block_range());
	}
}
