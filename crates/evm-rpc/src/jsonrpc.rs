//! JSON-RPC 2.0 envelopes and request id allocation.

use crate::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic request id source.
///
/// One generator is owned per client and shared by every clone of it, so
/// concurrent requests issued through the same client never reuse an id.
#[derive(Debug)]
pub struct RequestIdGenerator {
	next: AtomicU64,
}

impl RequestIdGenerator {
	/// Creates a generator whose first id is 1.
	pub fn new() -> Self {
		Self::starting_at(1)
	}

	pub fn starting_at(first: u64) -> Self {
		Self {
			next: AtomicU64::new(first),
		}
	}

	/// Returns the next id.
	pub fn next_id(&self) -> u64 {
		self.next.fetch_add(1, Ordering::SeqCst)
	}
}

impl Default for RequestIdGenerator {
	fn default() -> Self {
		Self::new()
	}
}

/// A single JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
	pub jsonrpc: String,
	pub id: u64,
	pub method: String,
	pub params: Value,
}

impl JsonRpcRequest {
	pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
		Self {
			jsonrpc: "2.0".to_string(),
			id,
			method: method.into(),
			params,
		}
	}
}

/// Error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// A single JSON-RPC response.
///
/// `result` is `None` both when the field is absent and when the node answered
/// `null`; the latter is a legitimate value (an unknown block or receipt).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
	#[serde(default)]
	pub jsonrpc: String,
	#[serde(default)]
	pub id: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
	pub fn success(id: u64, result: Value) -> Self {
		Self {
			jsonrpc: "2.0".to_string(),
			id: Some(id),
			result: Some(result),
			error: None,
		}
	}

	pub fn failure(id: u64, error: JsonRpcErrorObject) -> Self {
		Self {
			jsonrpc: "2.0".to_string(),
			id: Some(id),
			result: None,
			error: Some(error),
		}
	}

	/// Converts the envelope into the result value or the node's error.
	pub fn into_result(self) -> Result<Value, RpcError> {
		match self.error {
			Some(error) => Err(RpcError::Node {
				code: error.code,
				message: error.message,
				data: error.data,
			}),
			None => Ok(self.result.unwrap_or(Value::Null)),
		}
	}
}
