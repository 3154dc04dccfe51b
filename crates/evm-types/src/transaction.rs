//! Transaction drafts, resolution policies and finalized transactions.
//!
//! A [`TransactionIntent`] is a partially specified transaction: the payload
//! plus a sparse [`TransactionOptions`] overlay whose policy fields describe
//! how each missing parameter should be resolved. Resolution turns it into a
//! [`ResolvedTransaction`] in which every field is concrete and exactly one
//! pricing model is populated.

use crate::block::BlockNumber;
use crate::options::TransactionOptions;
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

pub use alloy_eips::eip2930::AccessList;

/// Envelope type of a transaction, selecting its pricing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
	#[default]
	Legacy,
	Eip2930,
	Eip1559,
}

impl TransactionType {
	/// EIP-2718 type byte.
	pub fn type_byte(&self) -> u8 {
		match self {
			TransactionType::Legacy => 0,
			TransactionType::Eip2930 => 1,
			TransactionType::Eip1559 => 2,
		}
	}

	/// True for the envelopes priced with a single `gasPrice`.
	pub fn uses_gas_price(&self) -> bool {
		!matches!(self, TransactionType::Eip1559)
	}
}

/// How the nonce is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoncePolicy {
	/// Transaction count including the sender's pending transactions.
	#[default]
	Pending,
	/// Transaction count as of the latest mined block.
	Latest,
	/// Use this value, no node query.
	Exact(u64),
}

/// How the gas limit is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasLimitPolicy {
	/// Use the node's estimate.
	#[default]
	Automatic,
	/// Multiply the node's estimate by the factor, rounding up.
	WithMargin(f64),
	/// Use this value, no node query.
	Manual(u64),
	/// Use the node's estimate, failing if it exceeds the cap.
	Limited(u64),
}

/// How the legacy gas price is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasPricePolicy {
	/// Highest of the oracle's legacy gas price suggestions.
	#[default]
	Automatic,
	/// Oracle suggestion multiplied by the factor.
	WithMargin(f64),
	Manual(U256),
}

/// How an EIP-1559 fee field is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeePerGasPolicy {
	#[default]
	Automatic,
	Manual(U256),
}

/// A partially specified transaction.
///
/// `to` absent in the options means contract creation. Every unset policy is
/// filled from lower option layers before resolution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionIntent {
	/// Call payload or init code.
	pub data: Bytes,
	/// Per-transaction options, the draft's own layer.
	pub options: TransactionOptions,
}

impl TransactionIntent {
	/// Creates an empty draft.
	pub fn new() -> Self {
		Self::default()
	}

	/// Plain value transfer.
	pub fn transfer(to: Address, value: U256) -> Self {
		Self::new().with_to(to).with_value(value)
	}

	/// Contract call with an already encoded payload.
	pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
		Self::new().with_to(to).with_data(data)
	}

	/// Contract creation with the given init code.
	pub fn deploy(init_code: impl Into<Bytes>) -> Self {
		Self::new().with_data(init_code)
	}

	pub fn with_to(mut self, to: Address) -> Self {
		self.options.to = Some(to);
		self
	}

	pub fn with_from(mut self, from: Address) -> Self {
		self.options.from = Some(from);
		self
	}

	pub fn with_value(mut self, value: U256) -> Self {
		self.options.value = Some(value);
		self
	}

	pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
		self.data = data.into();
		self
	}

	pub fn with_type(mut self, tx_type: TransactionType) -> Self {
		self.options.tx_type = Some(tx_type);
		self
	}

	pub fn with_chain_id(mut self, chain_id: u64) -> Self {
		self.options.chain_id = Some(chain_id);
		self
	}

	pub fn with_nonce(mut self, policy: NoncePolicy) -> Self {
		self.options.nonce = Some(policy);
		self
	}

	pub fn with_gas_limit(mut self, policy: GasLimitPolicy) -> Self {
		self.options.gas_limit = Some(policy);
		self
	}

	pub fn with_gas_price(mut self, policy: GasPricePolicy) -> Self {
		self.options.gas_price = Some(policy);
		self
	}

	pub fn with_max_fee_per_gas(mut self, policy: FeePerGasPolicy) -> Self {
		self.options.max_fee_per_gas = Some(policy);
		self
	}

	pub fn with_max_priority_fee_per_gas(mut self, policy: FeePerGasPolicy) -> Self {
		self.options.max_priority_fee_per_gas = Some(policy);
		self
	}

	pub fn with_access_list(mut self, access_list: AccessList) -> Self {
		self.options.access_list = Some(access_list);
		self
	}

	pub fn with_call_on_block(mut self, block: BlockNumber) -> Self {
		self.options.call_on_block = Some(block);
		self
	}

	/// The address that will sign the transaction, if known.
	pub fn sender(&self) -> Option<Address> {
		self.options.from
	}
}

/// Concrete pricing of a finalized transaction.
///
/// The variant is the envelope type, so legacy and EIP-1559 fields can never
/// be populated at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Pricing {
	Legacy {
		gas_price: U256,
	},
	Eip2930 {
		gas_price: U256,
	},
	Eip1559 {
		max_fee_per_gas: U256,
		max_priority_fee_per_gas: U256,
	},
}

/// A fully resolved transaction, ready for signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTransaction {
	pub chain_id: Option<u64>,
	pub from: Option<Address>,
	/// `None` for contract creation.
	pub to: Option<Address>,
	pub value: U256,
	pub data: Bytes,
	pub nonce: u64,
	pub gas_limit: u64,
	pub pricing: Pricing,
	pub access_list: Option<AccessList>,
}

impl ResolvedTransaction {
	pub fn tx_type(&self) -> TransactionType {
		match self.pricing {
			Pricing::Legacy { .. } => TransactionType::Legacy,
			Pricing::Eip2930 { .. } => TransactionType::Eip2930,
			Pricing::Eip1559 { .. } => TransactionType::Eip1559,
		}
	}

	/// Gas price for legacy and EIP-2930 envelopes.
	pub fn gas_price(&self) -> Option<U256> {
		match self.pricing {
			Pricing::Legacy { gas_price } | Pricing::Eip2930 { gas_price } => Some(gas_price),
			Pricing::Eip1559 { .. } => None,
		}
	}

	pub fn max_fee_per_gas(&self) -> Option<U256> {
		match self.pricing {
			Pricing::Eip1559 {
				max_fee_per_gas, ..
			} => Some(max_fee_per_gas),
			_ => None,
		}
	}

	pub fn max_priority_fee_per_gas(&self) -> Option<U256> {
		match self.pricing {
			Pricing::Eip1559 {
				max_priority_fee_per_gas,
				..
			} => Some(max_priority_fee_per_gas),
			_ => None,
		}
	}
}
