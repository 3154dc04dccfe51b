//! Statically typed node methods.
//!
//! Each method fixes its wire name, parameter layout and response type at the
//! call site, so a response is decoded into exactly one type chosen by the
//! request instead of being probed against several candidates.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use evm_types::{
	AccessList, Block, BlockNumber, EventLog, FeeHistory, LogFilter, TransactionReceipt,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A node method with a fixed name and response type.
pub trait EthMethod {
	/// Wire name, e.g. `eth_blockNumber`.
	const NAME: &'static str;
	/// Type the `result` field is decoded into.
	type Response: DeserializeOwned;

	/// Positional parameters.
	fn params(&self) -> Value;
}

macro_rules! eth_method {
	($(
		$(#[$attr:meta])*
		pub struct $name:ident as $method:literal
			($($field:ident : $ty:ty),*) => $response:ty;
	)*) => {$(
		$(#[$attr])*
		#[derive(Debug, Clone)]
		pub struct $name {
			$(pub $field: $ty,)*
		}

		impl EthMethod for $name {
			const NAME: &'static str = $method;
			type Response = $response;

			fn params(&self) -> Value {
				serde_json::json!([$(&self.$field),*])
			}
		}
	)*};
}

eth_method! {
	/// Number of the most recent block.
	pub struct EthBlockNumber as "eth_blockNumber"
		() => U64;

	/// Chain id of the connected network.
	pub struct EthChainId as "eth_chainId"
		() => U64;

	/// Number of transactions sent from an address at a block.
	pub struct EthGetTransactionCount as "eth_getTransactionCount"
		(address: Address, block: BlockNumber) => U64;

	/// Gas estimate for a call.
	pub struct EthEstimateGas as "eth_estimateGas"
		(request: CallRequest, block: BlockNumber) => U64;

	/// Base fees, gas usage ratios and tip percentiles for a window of blocks.
	pub struct EthFeeHistory as "eth_feeHistory"
		(block_count: U64, newest_block: BlockNumber, reward_percentiles: Vec<f64>) => FeeHistory;

	/// Current gas price suggested by the node.
	pub struct EthGasPrice as "eth_gasPrice"
		() => U256;

	/// Block by number, with full transactions when `full` is set.
	pub struct EthGetBlockByNumber as "eth_getBlockByNumber"
		(block: BlockNumber, full: bool) => Option<Block>;

	/// Block by hash, with full transactions when `full` is set.
	pub struct EthGetBlockByHash as "eth_getBlockByHash"
		(hash: B256, full: bool) => Option<Block>;

	/// Receipt of a mined transaction.
	pub struct EthGetTransactionReceipt as "eth_getTransactionReceipt"
		(hash: B256) => Option<TransactionReceipt>;

	/// Logs matching a filter.
	pub struct EthGetLogs as "eth_getLogs"
		(filter: LogFilter) => Vec<EventLog>;

	/// Submits a signed, EIP-2718 encoded transaction.
	pub struct EthSendRawTransaction as "eth_sendRawTransaction"
		(raw: Bytes) => B256;
}

/// Call object used by `eth_estimateGas`.
///
/// Unset fields are omitted from the request entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub from: Option<Address>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub to: Option<Address>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<U256>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<Bytes>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gas: Option<U64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gas_price: Option<U256>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_fee_per_gas: Option<U256>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub max_priority_fee_per_gas: Option<U256>,
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	pub transaction_type: Option<U64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub access_list: Option<AccessList>,
}
