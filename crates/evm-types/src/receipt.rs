//! Transaction receipts and raw event logs.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

/// A raw log entry as emitted by a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
	pub address: Address,
	#[serde(default)]
	pub topics: Vec<B256>,
	#[serde(default)]
	pub data: Bytes,
	#[serde(default)]
	pub block_number: Option<U64>,
	#[serde(default)]
	pub block_hash: Option<B256>,
	#[serde(default)]
	pub transaction_hash: Option<B256>,
	#[serde(default)]
	pub transaction_index: Option<U64>,
	#[serde(default)]
	pub log_index: Option<U64>,
	#[serde(default)]
	pub removed: bool,
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
	pub transaction_hash: B256,
	#[serde(default)]
	pub transaction_index: Option<U64>,
	#[serde(default)]
	pub block_hash: Option<B256>,
	#[serde(default)]
	pub block_number: Option<U64>,
	#[serde(default)]
	pub from: Option<Address>,
	#[serde(default)]
	pub to: Option<Address>,
	#[serde(default)]
	pub contract_address: Option<Address>,
	#[serde(default)]
	pub gas_used: Option<U256>,
	#[serde(default)]
	pub effective_gas_price: Option<U256>,
	/// `0x1` on success, `0x0` on revert. Absent on pre-Byzantium receipts.
	#[serde(default)]
	pub status: Option<U64>,
	#[serde(default)]
	pub logs: Vec<EventLog>,
	#[serde(default)]
	pub logs_bloom: Option<String>,
}

impl TransactionReceipt {
	/// Returns true unless the receipt explicitly reports a revert.
	pub fn succeeded(&self) -> bool {
		self.status.map(|s| s != U64::ZERO).unwrap_or(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_receipt_deserialization() {
		let receipt: TransactionReceipt = serde_json::from_value(json!({
			"transactionHash": format!("0x{}", "11".repeat(32)),
			"blockNumber": "0x10",
			"status": "0x0",
			"logs": [{
				"address": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
				"topics": [format!("0x{}", "22".repeat(32))],
				"data": "0x",
				"logIndex": "0x0",
			}],
		}))
		.unwrap();

		assert_eq!(receipt.block_number, Some(U64::from(16)));
		assert!(!receipt.succeeded());
		assert_eq!(receipt.logs.len(), 1);
		assert!(!receipt.logs[0].removed);
	}
}
