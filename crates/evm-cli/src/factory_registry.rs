//! Dynamic factory registry for client implementations.
//!
//! This module provides a centralized registry for all factory functions,
//! allowing dynamic instantiation of implementations based on configuration.

use evm_account::AccountFactory;
use evm_config::Config;
use evm_core::{ClientBuilder, ClientFactories, Hooks, Web3Client};
use evm_rpc::RpcFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Global registry for all implementation factories
pub struct FactoryRegistry {
	pub rpc: HashMap<String, RpcFactory>,
	pub account: HashMap<String, AccountFactory>,
}

impl FactoryRegistry {
	/// Create a new empty registry
	pub fn new() -> Self {
		Self {
			rpc: HashMap::new(),
			account: HashMap::new(),
		}
	}

	/// Register a transport implementation
	pub fn register_rpc(&mut self, name: impl Into<String>, factory: RpcFactory) {
		self.rpc.insert(name.into(), factory);
	}

	/// Register an account implementation
	pub fn register_account(&mut self, name: impl Into<String>, factory: AccountFactory) {
		self.account.insert(name.into(), factory);
	}
}

// Global registry instance
static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Initialize the global registry with all available implementations
pub fn initialize_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in evm_rpc::get_all_implementations() {
			tracing::debug!("Registering rpc implementation: {}", name);
			registry.register_rpc(name, factory);
		}

		for (name, factory) in evm_account::get_all_implementations() {
			tracing::debug!("Registering account implementation: {}", name);
			registry.register_account(name, factory);
		}

		registry
	})
}

/// Get the global factory registry
pub fn get_registry() -> &'static FactoryRegistry {
	initialize_registry()
}

/// Macro to build factories from config implementation names
macro_rules! build_factories {
	($registry:expr, $names:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $names {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Build a client using the registry and config
pub async fn build_client_from_config(
	config: Config,
	hooks: Hooks,
) -> Result<Web3Client, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let rpc_factories = build_factories!(
		registry,
		std::iter::once(&config.rpc.implementation),
		rpc,
		"rpc"
	);
	let account_factories = build_factories!(
		registry,
		config.account.iter().flat_map(|account| account.implementations.keys()),
		account,
		"account"
	);

	let factories = ClientFactories {
		rpc_factories,
		account_factories,
	};

	Ok(ClientBuilder::new(config)
		.with_hooks(hooks)
		.build(factories)
		.await?)
}
