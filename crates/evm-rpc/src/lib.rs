//! JSON-RPC client for Ethereum-compatible nodes.
//!
//! This module provides the transport abstraction used to reach a node, the
//! request/batch machinery with per-client request ids, and typed helpers for
//! the node methods consumed by the fee oracle, the transaction assembler and
//! the event parser.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use evm_types::{
	Block, BlockNumber, ConfigSchema, EventLog, FeeHistory, ImplementationRegistry, LogFilter,
	NetworkConfig, TransactionReceipt,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod jsonrpc;
pub mod methods;

/// Re-export implementations
pub mod implementations {
	pub mod http;
	#[cfg(any(test, feature = "testing"))]
	pub mod mock;
}

pub use jsonrpc::{JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse, RequestIdGenerator};
pub use methods::{CallRequest, EthMethod};

use methods::*;

/// Errors that can occur while talking to a node.
#[derive(Debug, Error)]
pub enum RpcError {
	/// The node answered with a JSON-RPC error object.
	#[error("Node error {code}: {message}")]
	Node {
		code: i64,
		message: String,
		data: Option<Value>,
	},
	/// Transport-level failure (connection refused, timeout, HTTP status).
	#[error("Connection error: {0}")]
	Connection(String),
	/// The response could not be decoded into the expected type.
	#[error("Decode error: {0}")]
	Decode(String),
	/// Batch responses could not be correlated with their requests.
	#[error("Batch error: {0}")]
	Batch(String),
}

/// Trait defining the interface for JSON-RPC transports.
///
/// A transport moves envelopes to and from a node. It does not interpret
/// results or errors; that is the client's job.
#[async_trait]
pub trait RpcTransport: Send + Sync {
	/// Returns the configuration schema for this transport implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Sends one request and returns its response envelope.
	async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, RpcError>;

	/// Sends several requests in one round trip.
	///
	/// Responses may come back in any order.
	async fn send_batch(
		&self,
		requests: Vec<JsonRpcRequest>,
	) -> Result<Vec<JsonRpcResponse>, RpcError>;
}

/// Type alias for transport factory functions.
pub type RpcFactory = fn(&toml::Value, &NetworkConfig) -> Result<Box<dyn RpcTransport>, RpcError>;

/// Registry trait for transport implementations.
pub trait RpcRegistry: ImplementationRegistry<Factory = RpcFactory> {}

/// Get all registered transport implementations.
///
/// Returns a vector of (name, factory) tuples for all available transports.
pub fn get_all_implementations() -> Vec<(&'static str, RpcFactory)> {
	use implementations::http;

	vec![(http::Registry::NAME, http::Registry::factory())]
}

/// Client issuing typed requests over a transport.
///
/// Cloning is cheap; clones share the transport and the request id sequence.
#[derive(Clone)]
pub struct RpcClient {
	transport: Arc<dyn RpcTransport>,
	ids: Arc<RequestIdGenerator>,
}

impl RpcClient {
	/// Creates a client with its own id sequence starting at 1.
	pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
		Self::with_id_generator(transport, Arc::new(RequestIdGenerator::new()))
	}

	/// Creates a client drawing ids from a shared generator.
	pub fn with_id_generator(
		transport: Arc<dyn RpcTransport>,
		ids: Arc<RequestIdGenerator>,
	) -> Self {
		Self { transport, ids }
	}

	/// Issues a typed request and decodes its result.
	pub async fn request<M: EthMethod>(&self, method: M) -> Result<M::Response, RpcError> {
		let result = self.request_raw(M::NAME, method.params()).await?;
		serde_json::from_value(result)
			.map_err(|e| RpcError::Decode(format!("{} response: {}", M::NAME, e)))
	}

	/// Issues a request with caller-built parameters.
	pub async fn request_raw(&self, method: &str, params: Value) -> Result<Value, RpcError> {
		let id = self.ids.next_id();
		tracing::trace!(method, id, "Sending RPC request");

		let response = self
			.transport
			.send(JsonRpcRequest::new(id, method, params))
			.await?;

		if response.id.is_some_and(|response_id| response_id != id) {
			return Err(RpcError::Decode(format!(
				"{} response id {:?} does not match request id {}",
				method, response.id, id
			)));
		}

		response.into_result().inspect_err(|e| {
			tracing::debug!(method, id, error = %e, "RPC request failed");
		})
	}

	/// Sends several requests in one batch.
	///
	/// Results are returned in request order after correlating responses by
	/// id. Each entry carries its own node error; a response with an unknown
	/// or missing id, or a request left without a response, fails the batch.
	pub async fn batch(
		&self,
		calls: Vec<(String, Value)>,
	) -> Result<Vec<Result<Value, RpcError>>, RpcError> {
		if calls.is_empty() {
			return Ok(Vec::new());
		}

		let requests: Vec<JsonRpcRequest> = calls
			.into_iter()
			.map(|(method, params)| JsonRpcRequest::new(self.ids.next_id(), method, params))
			.collect();
		let positions: HashMap<u64, usize> = requests
			.iter()
			.enumerate()
			.map(|(position, request)| (request.id, position))
			.collect();
		let count = requests.len();
		tracing::trace!(count, "Sending RPC batch");

		let responses = self.transport.send_batch(requests).await?;

		let mut slots: Vec<Option<Result<Value, RpcError>>> = (0..count).map(|_| None).collect();
		for response in responses {
			let id = response
				.id
				.ok_or_else(|| RpcError::Batch("response without id".to_string()))?;
			let position = *positions
				.get(&id)
				.ok_or_else(|| RpcError::Batch(format!("unexpected response id {}", id)))?;
			slots[position] = Some(response.into_result());
		}

		slots
			.into_iter()
			.enumerate()
			.map(|(position, slot)| {
				slot.ok_or_else(|| {
					RpcError::Batch(format!("no response for batch entry {}", position))
				})
			})
			.collect()
	}

	/// Number of the most recent block.
	pub async fn block_number(&self) -> Result<u64, RpcError> {
		Ok(self.request(EthBlockNumber {}).await?.to::<u64>())
	}

	pub async fn chain_id(&self) -> Result<u64, RpcError> {
		Ok(self.request(EthChainId {}).await?.to::<u64>())
	}

	/// Transaction count of `address` at `block`, i.e. its next nonce.
	pub async fn get_transaction_count(
		&self,
		address: Address,
		block: BlockNumber,
	) -> Result<u64, RpcError> {
		Ok(self
			.request(EthGetTransactionCount { address, block })
			.await?
			.to::<u64>())
	}

	pub async fn estimate_gas(
		&self,
		request: &CallRequest,
		block: BlockNumber,
	) -> Result<u64, RpcError> {
		Ok(self
			.request(EthEstimateGas {
				request: request.clone(),
				block,
			})
			.await?
			.to::<u64>())
	}

	pub async fn fee_history(
		&self,
		block_count: u64,
		newest_block: BlockNumber,
		reward_percentiles: &[f64],
	) -> Result<FeeHistory, RpcError> {
		self.request(EthFeeHistory {
			block_count: U64::from(block_count),
			newest_block,
			reward_percentiles: reward_percentiles.to_vec(),
		})
		.await
	}

	pub async fn gas_price(&self) -> Result<U256, RpcError> {
		self.request(EthGasPrice {}).await
	}

	/// Block by number; `None` when the node does not know it.
	pub async fn get_block_by_number(
		&self,
		block: BlockNumber,
		full_transactions: bool,
	) -> Result<Option<Block>, RpcError> {
		self.request(EthGetBlockByNumber {
			block,
			full: full_transactions,
		})
		.await
	}

	/// Block by hash; `None` when the node does not know it.
	pub async fn get_block_by_hash(
		&self,
		hash: B256,
		full_transactions: bool,
	) -> Result<Option<Block>, RpcError> {
		self.request(EthGetBlockByHash {
			hash,
			full: full_transactions,
		})
		.await
	}

	/// Receipt of a transaction; `None` while it is not mined.
	pub async fn get_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<TransactionReceipt>, RpcError> {
		self.request(EthGetTransactionReceipt { hash }).await
	}

	pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<EventLog>, RpcError> {
		self.request(EthGetLogs {
			filter: filter.clone(),
		})
		.await
	}

	/// Submits a signed transaction and returns its hash.
	pub async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, RpcError> {
		self.request(EthSendRawTransaction { raw }).await
	}
}
