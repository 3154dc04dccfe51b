//! Builder pattern for constructing clients.
//!
//! Composes a [`Web3Client`] from configuration using named factory functions
//! for the transport and the account, so binaries decide which
//! implementations are available.

use crate::assembler::TransactionAssembler;
use crate::client::Web3Client;
use crate::hooks::Hooks;
use crate::resolver::PolicyResolver;
use evm_account::{AccountError, AccountInterface, AccountService};
use evm_config::Config;
use evm_oracle::Oracle;
use evm_rpc::{RpcClient, RpcError, RpcTransport};
use evm_types::{NetworkConfig, TransactionOptions};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during client construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct ClientFactories<RF, AF> {
	pub rpc_factories: HashMap<String, RF>,
	pub account_factories: HashMap<String, AF>,
}

/// Builder for constructing a [`Web3Client`] with pluggable implementations.
pub struct ClientBuilder {
	config: Config,
	hooks: Hooks,
}

impl ClientBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			hooks: Hooks::new(),
		}
	}

	/// Hooks installed on the built client.
	pub fn with_hooks(mut self, hooks: Hooks) -> Self {
		self.hooks = hooks;
		self
	}

	pub async fn build<RF, AF>(
		self,
		factories: ClientFactories<RF, AF>,
	) -> Result<Web3Client, BuilderError>
	where
		RF: Fn(&toml::Value, &NetworkConfig) -> Result<Box<dyn RpcTransport>, RpcError>,
		AF: Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>,
	{
		let chain_id = self.config.client.network;
		let network = self.config.networks.get(&chain_id).ok_or_else(|| {
			BuilderError::Config(format!("Network {} is not configured", chain_id))
		})?;

		// Create the transport
		let implementation = &self.config.rpc.implementation;
		let factory = factories.rpc_factories.get(implementation).ok_or_else(|| {
			BuilderError::MissingComponent(format!("RPC implementation '{}'", implementation))
		})?;
		let rpc_config = toml::Value::try_from(&self.config.rpc)
			.map_err(|e| BuilderError::Config(format!("Invalid rpc section: {}", e)))?;
		let transport = factory(&rpc_config, network).map_err(|e| {
			tracing::error!(
				component = "rpc",
				implementation = %implementation,
				error = %e,
				"Failed to create RPC transport"
			);
			BuilderError::Config(format!(
				"Failed to create RPC implementation '{}': {}",
				implementation, e
			))
		})?;
		tracing::info!(
			component = "rpc",
			implementation = %implementation,
			network = chain_id,
			"Loaded"
		);
		let rpc = RpcClient::new(Arc::from(transport));

		let oracle = Oracle::new(rpc.clone(), self.config.oracle.clone());
		tracing::info!(
			component = "oracle",
			block = %self.config.oracle.block,
			block_count = self.config.oracle.block_count,
			"Loaded"
		);

		// Create the signing account, if any
		let account = match &self.config.account {
			Some(account_config) => {
				let mut account_impls = HashMap::new();
				for (name, config) in &account_config.implementations {
					if let Some(factory) = factories.account_factories.get(name) {
						match factory(config) {
							Ok(implementation) => {
								account_impls.insert(name.clone(), implementation);
								let is_primary = &account_config.primary == name;
								tracing::info!(
									component = "account",
									implementation = %name,
									enabled = %is_primary,
									"Loaded"
								);
							},
							Err(e) => {
								tracing::error!(
									component = "account",
									implementation = %name,
									error = %e,
									"Failed to create account implementation"
								);
								return Err(BuilderError::Config(format!(
									"Failed to create account implementation '{}': {}",
									name, e
								)));
							},
						}
					}
				}

				let implementation = account_impls.remove(&account_config.primary).ok_or_else(|| {
					BuilderError::Config(format!(
						"Primary account '{}' failed to load or has invalid configuration",
						account_config.primary
					))
				})?;
				Some(Arc::new(AccountService::new(implementation)))
			},
			None => None,
		};

		let from = match &account {
			Some(service) => Some(
				service
					.get_address()
					.await
					.map_err(|e| {
						BuilderError::Config(format!("Failed to get account address: {}", e))
					})?,
			),
			None => None,
		};

		// Network and account fill in what the transaction section leaves unset
		let derived = TransactionOptions {
			chain_id: Some(chain_id),
			from,
			..Default::default()
		};
		let options = derived.merge(Some(&self.config.transaction));

		let oracle_handle: Arc<dyn evm_oracle::FeeOracle> = Arc::new(oracle.clone());
		let resolver = PolicyResolver::new(rpc.clone(), oracle_handle);
		let assembler = TransactionAssembler::new(resolver, Arc::new(self.hooks), options);

		tracing::info!(client = %self.config.client.id, "Client ready");
		Ok(Web3Client::new(rpc, oracle, assembler, account))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::DEV_ADDRESS;
	use evm_account::implementations::local;
	use evm_rpc::implementations::mock::MockTransport;
	use evm_types::{ImplementationRegistry, TransactionType};
	use std::str::FromStr;

	fn mock_factory(
		_config: &toml::Value,
		_network: &NetworkConfig,
	) -> Result<Box<dyn RpcTransport>, RpcError> {
		Ok(Box::new(MockTransport::new()))
	}

	type RpcFn = fn(&toml::Value, &NetworkConfig) -> Result<Box<dyn RpcTransport>, RpcError>;
	type AccountFn = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

	fn factories() -> ClientFactories<RpcFn, AccountFn> {
		ClientFactories {
			rpc_factories: HashMap::from([("mock".to_string(), mock_factory as RpcFn)]),
			account_factories: HashMap::from([(
				local::Registry::NAME.to_string(),
				local::Registry::factory(),
			)]),
		}
	}

	const CONFIG: &str = r#"
		[client]
		id = "test-client"
		network = 31337

		[networks.31337]
		rpc_url = "http://localhost:8545"

		[rpc]
		implementation = "mock"

		[transaction]
		type = "eip1559"

		[account]
		primary = "local"

		[account.implementations.local]
		private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
	"#;

	#[tokio::test]
	async fn test_build_derives_chain_and_sender() {
		let config = Config::from_str(CONFIG).unwrap();
		let client = ClientBuilder::new(config).build(factories()).await.unwrap();

		let base = client.assembler().base_options();
		assert_eq!(base.chain_id, Some(31337));
		assert_eq!(base.from, Some(DEV_ADDRESS.parse().unwrap()));
		assert_eq!(base.tx_type, Some(TransactionType::Eip1559));
		assert!(client.account().is_some());
	}

	#[tokio::test]
	async fn test_unknown_rpc_implementation() {
		let config = Config::from_str(&CONFIG.replace("\"mock\"", "\"http\"")).unwrap();
		let result = ClientBuilder::new(config).build(factories()).await;
		assert!(matches!(result, Err(BuilderError::MissingComponent(_))));
	}

	#[tokio::test]
	async fn test_build_without_account() {
		let without_account = CONFIG
			.split("[account]")
			.next()
			.unwrap()
			.to_string();
		let config = Config::from_str(&without_account).unwrap();
		let client = ClientBuilder::new(config).build(factories()).await.unwrap();

		assert!(client.account().is_none());
		assert_eq!(client.assembler().base_options().from, None);
	}
}
