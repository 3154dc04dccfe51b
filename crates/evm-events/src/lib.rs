//! Event parsing for contract logs.
//!
//! This module finds and decodes occurrences of contract events, either by
//! walking the receipts of a block or transaction, or by querying the node for
//! logs matching indexed parameters. Whole-block parses consult the block's
//! bloom filter first and skip every receipt fetch when the contract or event
//! cannot be present.

use evm_rpc::RpcError;
use thiserror::Error;

pub mod bloom;
pub mod contract;
pub mod decode;
pub mod parser;
pub mod topics;

#[cfg(test)]
pub(crate) mod testing;

pub use contract::ContractEvents;
pub use parser::EventParser;

/// Errors that can occur while parsing events.
#[derive(Debug, Error)]
pub enum EventError {
	/// The request was contradictory or incomplete.
	#[error("Input error: {0}")]
	Input(String),
	/// Decoding or lookup failed locally.
	#[error("Processing error: {0}")]
	Processing(String),
	/// The node answered with a JSON-RPC error.
	#[error("Node error {code}: {message}")]
	Node { code: i64, message: String },
	/// The node could not be reached.
	#[error("Connection error: {0}")]
	Connection(String),
}

impl From<RpcError> for EventError {
	fn from(err: RpcError) -> Self {
		match err {
			RpcError::Node { code, message, .. } => EventError::Node { code, message },
			RpcError::Connection(message) => EventError::Connection(message),
			other => EventError::Processing(other.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_rpc_error_mapping() {
		let node = EventError::from(RpcError::Node {
			code: -32000,
			message: "header not found".into(),
			data: None,
		});
		assert!(matches!(node, EventError::Node { code: -32000, .. }));

		let connection = EventError::from(RpcError::Connection("refused".into()));
		assert!(matches!(connection, EventError::Connection(_)));

		let decode = EventError::from(RpcError::Decode("bad hex".into()));
		assert!(matches!(decode, EventError::Processing(_)));
	}
}
