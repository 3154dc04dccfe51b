//! Configuration module for the EVM client.
//!
//! This module provides structures and utilities for managing client
//! configuration. It supports loading configuration from TOML files and
//! validates that every value the client depends on is properly set.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

use evm_types::{
	deserialize_networks, GasLimitPolicy, GasPricePolicy, NetworksConfig, OracleSettings,
	TransactionOptions,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this client and the network it talks to.
	pub client: ClientConfig,
	/// Network configurations keyed by chain id.
	#[serde(deserialize_with = "deserialize_networks")]
	pub networks: NetworksConfig,
	/// Transport used to reach the node.
	#[serde(default)]
	pub rpc: RpcConfig,
	/// Fee oracle window and percentiles.
	#[serde(default)]
	pub oracle: OracleSettings,
	/// Default transaction options, above the library defaults.
	#[serde(default)]
	pub transaction: TransactionOptions,
	/// Signing account; without it the client can assemble but not send.
	pub account: Option<AccountConfig>,
}

/// Configuration specific to the client instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
	/// Identifier used in logs.
	pub id: String,
	/// Chain id of the network to use, a key of `[networks]`.
	pub network: u64,
}

/// Configuration for the JSON-RPC transport.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RpcConfig {
	/// Name of the transport implementation.
	#[serde(default = "default_rpc_implementation")]
	pub implementation: String,
	/// Overrides the network's RPC URL.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rpc_url: Option<String>,
	/// Per-request timeout.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub timeout_seconds: Option<u64>,
}

impl Default for RpcConfig {
	fn default() -> Self {
		Self {
			implementation: default_rpc_implementation(),
			rpc_url: None,
			timeout_seconds: None,
		}
	}
}

fn default_rpc_implementation() -> String {
	"http".to_string()
}

/// Configuration for account management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Limit input size to prevent ReDoS attacks
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

fn validate_url(context: &str, url: &str) -> Result<(), ConfigError> {
	if !(url.starts_with("http://") || url.starts_with("https://")) {
		return Err(ConfigError::Validation(format!(
			"{} must be an http(s) URL, got '{}'",
			context, url
		)));
	}
	Ok(())
}

fn validate_margin(field: &str, factor: f64) -> Result<(), ConfigError> {
	if !factor.is_finite() || factor < 1.0 {
		return Err(ConfigError::Validation(format!(
			"transaction.{} margin must be at least 1.0, got {}",
			field, factor
		)));
	}
	Ok(())
}

impl Config {
	/// Loads configuration from a file with async environment variable resolution.
	///
	/// This method supports modular configuration through include directives:
	/// - `include = ["file1.toml", "file2.toml"]` - Include specific files
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// - Ensures the client ID is not empty and its network is configured
	/// - Checks every RPC URL is http(s)
	/// - Bounds the transport timeout, the oracle window and its percentiles
	/// - Rejects margins below 1.0 in the default transaction options
	/// - Verifies the primary account names a configured implementation
	fn validate(&self) -> Result<(), ConfigError> {
		if self.client.id.is_empty() {
			return Err(ConfigError::Validation("Client ID cannot be empty".into()));
		}

		// Validate networks config
		if self.networks.is_empty() {
			return Err(ConfigError::Validation(
				"Networks configuration cannot be empty".into(),
			));
		}
		if !self.networks.contains_key(&self.client.network) {
			return Err(ConfigError::Validation(format!(
				"Client network {} not found in networks",
				self.client.network
			)));
		}
		for (chain_id, network) in &self.networks {
			validate_url(&format!("Network {} rpc_url", chain_id), &network.rpc_url)?;
		}

		// Validate rpc config
		if self.rpc.implementation.is_empty() {
			return Err(ConfigError::Validation(
				"RPC implementation cannot be empty".into(),
			));
		}
		if let Some(url) = &self.rpc.rpc_url {
			validate_url("rpc.rpc_url", url)?;
		}
		if let Some(timeout) = self.rpc.timeout_seconds {
			if !(1..=600).contains(&timeout) {
				return Err(ConfigError::Validation(format!(
					"rpc.timeout_seconds must be between 1 and 600, got {}",
					timeout
				)));
			}
		}

		// Validate oracle config
		if !(1..=1024).contains(&self.oracle.block_count) {
			return Err(ConfigError::Validation(format!(
				"oracle.block_count must be between 1 and 1024, got {}",
				self.oracle.block_count
			)));
		}
		if self.oracle.percentiles.is_empty() {
			return Err(ConfigError::Validation(
				"oracle.percentiles cannot be empty".into(),
			));
		}
		if let Some(invalid) = self
			.oracle
			.percentiles
			.iter()
			.find(|p| !(p.is_finite() && **p > 0.0 && **p <= 100.0))
		{
			return Err(ConfigError::Validation(format!(
				"oracle.percentiles must be in (0, 100], got {}",
				invalid
			)));
		}

		// Validate transaction defaults
		if let Some(GasLimitPolicy::WithMargin(factor)) = self.transaction.gas_limit {
			validate_margin("gas_limit", factor)?;
		}
		if let Some(GasPricePolicy::WithMargin(factor)) = self.transaction.gas_price {
			validate_margin("gas_price", factor)?;
		}

		// Validate account config
		if let Some(account) = &self.account {
			if account.primary.is_empty() {
				return Err(ConfigError::Validation(
					"Account primary implementation cannot be empty".into(),
				));
			}
			if !account.implementations.contains_key(&account.primary) {
				return Err(ConfigError::Validation(format!(
					"Primary account '{}' not found in implementations",
					account.primary
				)));
			}
		}

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// This allows configuration to be parsed from TOML strings using the standard
/// string parsing interface. Environment variables are resolved and the
/// configuration is automatically validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use evm_types::{BlockNumber, NoncePolicy, TransactionType};

	const MINIMAL: &str = r#"
[client]
id = "test-client"
network = 1

[networks.1]
rpc_url = "http://localhost:8545"
"#;

	fn with(extra: &str) -> String {
		format!("{}\n{}", MINIMAL, extra)
	}

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("EVM_TEST_HOST", "localhost");
		std::env::set_var("EVM_TEST_PORT", "8545");

		let input = "url = \"http://${EVM_TEST_HOST}:${EVM_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8545\"");

		std::env::remove_var("EVM_TEST_HOST");
		std::env::remove_var("EVM_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${EVM_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${EVM_MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("EVM_MISSING_VAR"));
	}

	#[test]
	fn test_minimal_config_uses_defaults() {
		let config: Config = MINIMAL.parse().unwrap();
		assert_eq!(config.client.id, "test-client");
		assert_eq!(config.rpc, RpcConfig::default());
		assert_eq!(config.oracle, OracleSettings::default());
		assert!(config.transaction.is_empty());
		assert!(config.account.is_none());
	}

	#[test]
	fn test_full_config() {
		std::env::set_var("EVM_TEST_PRIVATE_KEY", "0x01");
		let config: Config = with(
			r#"
[rpc]
implementation = "http"
timeout_seconds = 10

[oracle]
block = "pending"
block_count = 10
percentiles = [25.0, 75.0]

[transaction]
type = "eip1559"
nonce = "latest"
gas_limit = { with_margin = 1.2 }

[account]
primary = "local"
[account.implementations.local]
private_key = "${EVM_TEST_PRIVATE_KEY}"
"#,
		)
		.parse()
		.unwrap();
		std::env::remove_var("EVM_TEST_PRIVATE_KEY");

		assert_eq!(config.rpc.timeout_seconds, Some(10));
		assert_eq!(config.oracle.block, BlockNumber::Pending);
		assert_eq!(config.oracle.percentiles, vec![25.0, 75.0]);
		assert_eq!(config.transaction.tx_type, Some(TransactionType::Eip1559));
		assert_eq!(config.transaction.nonce, Some(NoncePolicy::Latest));

		let account = config.account.unwrap();
		assert_eq!(
			account.implementations["local"].get("private_key").and_then(|v| v.as_str()),
			Some("0x01")
		);
	}

	#[test]
	fn test_unknown_client_network() {
		let result: Result<Config, _> = MINIMAL.replace("network = 1", "network = 5").parse();
		let err = result.unwrap_err().to_string();
		assert!(err.contains("Client network 5"));
	}

	#[test]
	fn test_rejects_invalid_values() {
		let cases = [
			"[rpc]\ntimeout_seconds = 0",
			"[rpc]\nrpc_url = \"ws://localhost:8546\"",
			"[oracle]\nblock_count = 0",
			"[oracle]\npercentiles = [0.0]",
			"[oracle]\npercentiles = [101.0]",
			"[oracle]\npercentiles = []",
			"[transaction]\ngas_limit = { with_margin = 0.9 }",
			"[account]\nprimary = \"local\"\n[account.implementations.other]\nkey = 1",
		];
		for case in cases {
			let result: Result<Config, _> = with(case).parse();
			assert!(
				matches!(result, Err(ConfigError::Validation(_))),
				"expected validation error for {:?}",
				case
			);
		}
	}

	#[test]
	fn test_rejects_bad_network_url() {
		let result: Result<Config, _> = MINIMAL
			.replace("http://localhost:8545", "localhost:8545")
			.parse();
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}
}
