//! Local private-key account.
//!
//! Signs in-process with a secp256k1 key taken from configuration. The key is
//! kept in a `SecretString` while being parsed and never logged.

use crate::{AccountError, AccountInterface};
use alloy_consensus::{SignableTransaction, TxEip1559, TxEip2930, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, Bytes, Signature, TxKind, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use evm_types::{
	without_0x_prefix, ConfigSchema, Field, FieldType, Pricing, ResolvedTransaction, Schema,
	SecretString, ValidationError,
};

/// Account backed by a private key held in memory.
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Creates a wallet from a hex encoded private key, with or without `0x`.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		let signer = private_key.with_exposed(|key| {
			without_0x_prefix(key)
				.parse::<PrivateKeySigner>()
				.map_err(|_| AccountError::InvalidKey("Invalid private key format".to_string()))
		})?;
		Ok(Self { signer })
	}

	fn sign_hash(&self, hash: &B256) -> Result<Signature, AccountError> {
		self.signer
			.sign_hash_sync(hash)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))
	}

	fn encode_signed(&self, tx: &ResolvedTransaction) -> Result<Bytes, AccountError> {
		if let Some(from) = tx.from {
			if from != self.signer.address() {
				return Err(AccountError::SigningFailed(format!(
					"Transaction sender {} does not match account {}",
					from,
					self.signer.address()
				)));
			}
		}

		let to = TxKind::from(tx.to);
		let access_list = tx.access_list.clone().unwrap_or_default();
		let envelope = match tx.pricing {
			Pricing::Legacy { gas_price } => {
				let unsigned = TxLegacy {
					chain_id: tx.chain_id,
					nonce: tx.nonce,
					gas_price: to_u128(gas_price, "gas price")?,
					gas_limit: tx.gas_limit,
					to,
					value: tx.value,
					input: tx.data.clone(),
				};
				let signature = self.sign_hash(&unsigned.signature_hash())?;
				TxEnvelope::from(unsigned.into_signed(signature))
			},
			Pricing::Eip2930 { gas_price } => {
				let unsigned = TxEip2930 {
					chain_id: require_chain_id(tx)?,
					nonce: tx.nonce,
					gas_price: to_u128(gas_price, "gas price")?,
					gas_limit: tx.gas_limit,
					to,
					value: tx.value,
					access_list,
					input: tx.data.clone(),
				};
				let signature = self.sign_hash(&unsigned.signature_hash())?;
				TxEnvelope::from(unsigned.into_signed(signature))
			},
			Pricing::Eip1559 {
				max_fee_per_gas,
				max_priority_fee_per_gas,
			} => {
				let unsigned = TxEip1559 {
					chain_id: require_chain_id(tx)?,
					nonce: tx.nonce,
					gas_limit: tx.gas_limit,
					max_fee_per_gas: to_u128(max_fee_per_gas, "max fee per gas")?,
					max_priority_fee_per_gas: to_u128(
						max_priority_fee_per_gas,
						"max priority fee per gas",
					)?,
					to,
					value: tx.value,
					access_list,
					input: tx.data.clone(),
				};
				let signature = self.sign_hash(&unsigned.signature_hash())?;
				TxEnvelope::from(unsigned.into_signed(signature))
			},
		};

		tracing::debug!(
			component = "account",
			hash = %envelope.tx_hash(),
			tx_type = ?tx.tx_type(),
			"Signed transaction"
		);
		Ok(envelope.encoded_2718().into())
	}
}

fn to_u128(value: U256, field: &str) -> Result<u128, AccountError> {
	u128::try_from(value).map_err(|_| {
		AccountError::SigningFailed(format!("{} {} does not fit in 128 bits", field, value))
	})
}

fn require_chain_id(tx: &ResolvedTransaction) -> Result<u64, AccountError> {
	tx.chain_id.ok_or_else(|| {
		AccountError::SigningFailed(format!("{:?} transactions require a chain id", tx.tx_type()))
	})
}

/// Configuration schema for the local account.
pub struct LocalWalletSchema;

impl LocalWalletSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("private_key", FieldType::String).with_validator(|value| {
				let key = value.as_str().unwrap_or_default();
				let hex_part = without_0x_prefix(key);
				if hex_part.len() != 64 {
					return Err("Private key must be 64 hex characters (32 bytes)".to_string());
				}
				if hex::decode(hex_part).is_err() {
					return Err("Private key must be valid hexadecimal".to_string());
				}
				Ok(())
			})],
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalWalletSchema)
	}

	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	async fn sign_transaction(&self, tx: &ResolvedTransaction) -> Result<Bytes, AccountError> {
		self.encode_signed(tx)
	}
}

/// Factory function to create a local account from configuration.
///
/// Configuration parameters:
/// - `private_key`: hex encoded secp256k1 key, with or without `0x`
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	LocalWalletSchema::validate_config(config)
		.map_err(|e| AccountError::InvalidKey(format!("Invalid configuration: {}", e)))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| AccountError::InvalidKey("private_key is required".to_string()))?;

	Ok(Box::new(LocalWallet::new(&private_key)?))
}

/// Registry for the local account implementation.
pub struct Registry;

impl evm_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl crate::AccountRegistry for Registry {}
