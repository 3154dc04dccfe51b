//! Transaction assembly and submission for EVM chains.
//!
//! This module turns partially specified transactions into fully resolved ones.
//! Option layers are merged, pre-assembly hooks run, the nonce, gas limit and
//! pricing are resolved against the node and the fee oracle, and post-assembly
//! hooks see the result. The client adds signing and submission on top, and
//! the builder wires everything together from configuration.

use evm_rpc::RpcError;
use thiserror::Error;

pub mod assembler;
pub mod builder;
pub mod client;
pub mod contract;
pub mod hooks;
pub mod middleware;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use assembler::TransactionAssembler;
pub use builder::{BuilderError, ClientBuilder, ClientFactories};
pub use client::{SubmissionResult, Web3Client};
pub use contract::{ContractRef, WriteTransaction};
pub use hooks::{
	AssembledContext, AssemblyContext, Hook, HookChain, HookDecision, Hooks, SubmissionObserver,
};
pub use middleware::nonce::NonceMiddleware;
pub use resolver::PolicyResolver;

/// Errors that can occur while assembling or submitting a transaction.
#[derive(Debug, Error)]
pub enum AssemblyError {
	/// Caller-supplied options are incomplete or contradictory.
	#[error("Input error: {0}")]
	Input(String),
	/// Resolution failed internally, e.g. a hook aborted or no fee suggestion exists.
	#[error("Processing error: {0}")]
	Processing(String),
	/// The node answered with a JSON-RPC error.
	#[error("Node error {code}: {message}")]
	Node { code: i64, message: String },
	/// The node could not be reached.
	#[error("Connection error: {0}")]
	Connection(String),
	/// The account failed to sign.
	#[error("Signing error: {0}")]
	Signing(String),
}

impl From<RpcError> for AssemblyError {
	fn from(err: RpcError) -> Self {
		match err {
			RpcError::Node { code, message, .. } => AssemblyError::Node { code, message },
			RpcError::Connection(msg) => AssemblyError::Connection(msg),
			other => AssemblyError::Processing(other.to_string()),
		}
	}
}
