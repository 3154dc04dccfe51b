//! Network configuration types.
//!
//! This module defines the per-chain settings the client needs to reach a
//! node: the RPC endpoint and an optional human readable name.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Configuration for a single blockchain network.
///
/// # Fields
///
/// * `rpc_url` - The HTTP(S) RPC endpoint of the node
/// * `name` - Optional display name such as "mainnet" or "sepolia"
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
	pub rpc_url: String,
	#[serde(default)]
	pub name: Option<String>,
}

/// Networks configuration mapping chain IDs to their configurations.
///
/// TOML tables cannot have numeric keys, so chain IDs are written as string
/// keys and converted by [`deserialize_networks`].
pub type NetworksConfig = HashMap<u64, NetworkConfig>;

/// Deserializes network configurations keyed by chain ID strings.
///
/// # Errors
///
/// Returns a deserialization error if a chain ID key cannot be parsed as a u64
/// or if a network entry is invalid.
pub fn deserialize_networks<'de, D>(deserializer: D) -> Result<NetworksConfig, D::Error>
where
	D: Deserializer<'de>,
{
	let string_map: HashMap<String, NetworkConfig> = HashMap::deserialize(deserializer)?;
	let mut result = HashMap::new();

	for (key, value) in string_map {
		let chain_id = key
			.parse::<u64>()
			.map_err(|e| serde::de::Error::custom(format!("Invalid chain_id '{}': {}", key, e)))?;
		result.insert(chain_id, value);
	}

	Ok(result)
}
