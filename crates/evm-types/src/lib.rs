//! Common types module for the EVM client workspace.
//!
//! This module defines the core data types shared by the RPC client, the fee
//! oracle, the transaction assembler and the event parser. Keeping them in one
//! crate ensures every component agrees on the wire shapes returned by the node
//! and on the policy model used to describe transactions.

/// Block identifiers and block views returned by the node.
pub mod block;
/// Event filters and parsed event results.
pub mod events;
/// Fee history data returned by `eth_feeHistory`.
pub mod fees;
/// Network configuration types.
pub mod networks;
/// Transaction option overlays and their merge semantics.
pub mod options;
/// Transaction receipts and raw logs.
pub mod receipt;
/// Registry trait for named implementations.
pub mod registry;
/// Secure string type for private keys.
pub mod secret_string;
/// Transaction drafts, policies and finalized transactions.
pub mod transaction;
/// Utility functions for common type conversions.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use alloy_primitives::{Address, Bytes, B256, U256, U64};

pub use block::{Block, BlockNumber, BlockTransaction, TransactionDetails};
pub use events::{EventFilter, EventParserResult, LogFilter};
pub use fees::{FeeHistory, OracleSettings};
pub use networks::{deserialize_networks, NetworkConfig, NetworksConfig};
pub use options::TransactionOptions;
pub use receipt::{EventLog, TransactionReceipt};
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use transaction::{
	AccessList, FeePerGasPolicy, GasLimitPolicy, GasPricePolicy, NoncePolicy, Pricing,
	ResolvedTransaction, TransactionIntent, TransactionType,
};
pub use utils::{format_units, truncate_id, without_0x_prefix};
pub use validation::*;
