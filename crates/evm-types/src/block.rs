//! Block identifiers and block views.
//!
//! The node answers `eth_getBlockByNumber` and `eth_getBlockByHash` with either
//! transaction hashes or full transaction objects depending on the request flag.
//! `Block` accepts both shapes so callers never need to probe the payload.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Block selector used by calls, estimates, fee history and block fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockNumber {
	#[default]
	Latest,
	Pending,
	Earliest,
	Exact(u64),
}

impl BlockNumber {
	/// Returns the JSON-RPC string form: a tag or a 0x-prefixed quantity.
	pub fn as_rpc_string(&self) -> String {
		match self {
			BlockNumber::Latest => "latest".to_string(),
			BlockNumber::Pending => "pending".to_string(),
			BlockNumber::Earliest => "earliest".to_string(),
			BlockNumber::Exact(n) => format!("0x{:x}", n),
		}
	}
}

impl fmt::Display for BlockNumber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BlockNumber::Exact(n) => write!(f, "{}", n),
			other => f.write_str(&other.as_rpc_string()),
		}
	}
}

impl From<u64> for BlockNumber {
	fn from(n: u64) -> Self {
		BlockNumber::Exact(n)
	}
}

impl FromStr for BlockNumber {
	type Err = String;

	/// Accepts the three tags, a 0x-prefixed hex quantity or a decimal number.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"latest" => Ok(BlockNumber::Latest),
			"pending" => Ok(BlockNumber::Pending),
			"earliest" => Ok(BlockNumber::Earliest),
			other => {
				let parsed = match other
					.strip_prefix("0x")
					.or_else(|| other.strip_prefix("0X"))
				{
					Some(hex) => u64::from_str_radix(hex, 16),
					None => other.parse::<u64>(),
				};
				parsed
					.map(BlockNumber::Exact)
					.map_err(|e| format!("Invalid block number '{}': {}", s, e))
			},
		}
	}
}

impl Serialize for BlockNumber {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.as_rpc_string())
	}
}

impl<'de> Deserialize<'de> for BlockNumber {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Number(u64),
			Text(String),
		}

		match Raw::deserialize(deserializer)? {
			Raw::Number(n) => Ok(BlockNumber::Exact(n)),
			Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
		}
	}
}

/// A block as returned by the node.
///
/// Only the fields used by the oracle and the event parser are modelled; the
/// bloom is kept as the raw hex string so a malformed value surfaces as a
/// processing error at the point of use instead of a decode failure here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
	/// `None` for pending blocks.
	#[serde(default)]
	pub number: Option<U64>,
	#[serde(default)]
	pub hash: Option<B256>,
	#[serde(default)]
	pub parent_hash: Option<B256>,
	#[serde(default)]
	pub logs_bloom: Option<String>,
	#[serde(default)]
	pub base_fee_per_gas: Option<U256>,
	#[serde(default)]
	pub gas_used: Option<U256>,
	#[serde(default)]
	pub gas_limit: Option<U256>,
	#[serde(default)]
	pub timestamp: Option<U64>,
	#[serde(default)]
	pub transactions: Vec<BlockTransaction>,
}

impl Block {
	/// Hashes of all transactions in block order, whichever shape was returned.
	pub fn transaction_hashes(&self) -> Vec<B256> {
		self.transactions.iter().map(BlockTransaction::hash).collect()
	}
}

/// A transaction entry in a block: a bare hash or the full object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransaction {
	Hash(B256),
	Full(Box<TransactionDetails>),
}

impl BlockTransaction {
	pub fn hash(&self) -> B256 {
		match self {
			BlockTransaction::Hash(hash) => *hash,
			BlockTransaction::Full(details) => details.hash,
		}
	}

	/// Full transaction details if the block was requested with them.
	pub fn details(&self) -> Option<&TransactionDetails> {
		match self {
			BlockTransaction::Hash(_) => None,
			BlockTransaction::Full(details) => Some(details),
		}
	}
}

/// A mined or pending transaction object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetails {
	pub hash: B256,
	pub from: Address,
	#[serde(default)]
	pub to: Option<Address>,
	pub nonce: U64,
	#[serde(default)]
	pub value: U256,
	#[serde(default)]
	pub input: Bytes,
	#[serde(default)]
	pub gas: Option<U256>,
	#[serde(default)]
	pub gas_price: Option<U256>,
	#[serde(default)]
	pub max_fee_per_gas: Option<U256>,
	#[serde(default)]
	pub max_priority_fee_per_gas: Option<U256>,
	#[serde(default)]
	pub block_number: Option<U64>,
	#[serde(default)]
	pub transaction_index: Option<U64>,
}
