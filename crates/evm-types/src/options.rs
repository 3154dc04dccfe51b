//! Sparse transaction option overlays.
//!
//! Options are layered from lowest to highest priority: library defaults,
//! client configuration, contract defaults, the draft's own options and the
//! per-call overlay. Merging takes each field from the right-hand overlay when
//! it is set and falls back to the left-hand base otherwise.

use crate::block::BlockNumber;
use crate::transaction::{
	AccessList, FeePerGasPolicy, GasLimitPolicy, GasPricePolicy, NoncePolicy, TransactionType,
};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Transaction options where every field is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionOptions {
	pub from: Option<Address>,
	pub to: Option<Address>,
	pub value: Option<U256>,
	#[serde(rename = "type")]
	pub tx_type: Option<TransactionType>,
	pub chain_id: Option<u64>,
	pub nonce: Option<NoncePolicy>,
	pub gas_limit: Option<GasLimitPolicy>,
	pub gas_price: Option<GasPricePolicy>,
	pub max_fee_per_gas: Option<FeePerGasPolicy>,
	pub max_priority_fee_per_gas: Option<FeePerGasPolicy>,
	pub access_list: Option<AccessList>,
	/// Block used for gas estimation.
	pub call_on_block: Option<BlockNumber>,
}

impl TransactionOptions {
	/// The lowest layer: legacy envelope, automatic pricing and gas limit,
	/// pending nonce and estimation against the pending block.
	pub fn defaults() -> Self {
		Self {
			tx_type: Some(TransactionType::Legacy),
			nonce: Some(NoncePolicy::Pending),
			gas_limit: Some(GasLimitPolicy::Automatic),
			gas_price: Some(GasPricePolicy::Automatic),
			max_fee_per_gas: Some(FeePerGasPolicy::Automatic),
			max_priority_fee_per_gas: Some(FeePerGasPolicy::Automatic),
			call_on_block: Some(BlockNumber::Pending),
			..Self::default()
		}
	}

	/// Returns a new overlay where every field set in `other` wins.
	///
	/// Merging `None` or an empty overlay returns `self` unchanged.
	pub fn merge(&self, other: Option<&TransactionOptions>) -> TransactionOptions {
		let Some(other) = other else {
			return self.clone();
		};

		TransactionOptions {
			from: other.from.or(self.from),
			to: other.to.or(self.to),
			value: other.value.or(self.value),
			tx_type: other.tx_type.or(self.tx_type),
			chain_id: other.chain_id.or(self.chain_id),
			nonce: other.nonce.or(self.nonce),
			gas_limit: other.gas_limit.or(self.gas_limit),
			gas_price: other.gas_price.or(self.gas_price),
			max_fee_per_gas: other.max_fee_per_gas.or(self.max_fee_per_gas),
			max_priority_fee_per_gas: other
				.max_priority_fee_per_gas
				.or(self.max_priority_fee_per_gas),
			access_list: other
				.access_list
				.clone()
				.or_else(|| self.access_list.clone()),
			call_on_block: other.call_on_block.or(self.call_on_block),
		}
	}

	/// Merges a sequence of layers onto `self`, left to right.
	pub fn merge_all<'a, I>(&self, layers: I) -> TransactionOptions
	where
		I: IntoIterator<Item = Option<&'a TransactionOptions>>,
	{
		layers
			.into_iter()
			.fold(self.clone(), |acc, layer| acc.merge(layer))
	}

	/// True when no field is set.
	pub fn is_empty(&self) -> bool {
		*self == TransactionOptions::default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fully_populated(seed: u8) -> TransactionOptions {
		TransactionOptions {
			from: Some(Address::repeat_byte(seed)),
			to: Some(Address::repeat_byte(seed + 1)),
			value: Some(U256::from(seed)),
			tx_type: Some(TransactionType::Eip1559),
			chain_id: Some(seed as u64),
			nonce: Some(NoncePolicy::Exact(seed as u64)),
			gas_limit: Some(GasLimitPolicy::Manual(21_000 + seed as u64)),
			gas_price: Some(GasPricePolicy::Manual(U256::from(seed))),
			max_fee_per_gas: Some(FeePerGasPolicy::Manual(U256::from(100 + seed as u64))),
			max_priority_fee_per_gas: Some(FeePerGasPolicy::Manual(U256::from(seed))),
			access_list: Some(AccessList::default()),
			call_on_block: Some(BlockNumber::Exact(seed as u64)),
		}
	}

	#[test]
	fn test_merge_empty_overlay_keeps_base() {
		let base = fully_populated(1);
		assert_eq!(base.merge(Some(&TransactionOptions::default())), base);
		assert_eq!(base.merge(None), base);
	}

	#[test]
	fn test_merge_full_overlay_replaces_base() {
		let base = fully_populated(1);
		let overlay = fully_populated(7);
		assert_eq!(base.merge(Some(&overlay)), overlay);
		assert_eq!(TransactionOptions::defaults().merge(Some(&overlay)), overlay);
	}

	#[test]
	fn test_merge_is_field_wise() {
		let base = TransactionOptions::defaults();
		let overlay = TransactionOptions {
			gas_limit: Some(GasLimitPolicy::Limited(50_000)),
			..Default::default()
		};

		let merged = base.merge(Some(&overlay));
		assert_eq!(merged.gas_limit, Some(GasLimitPolicy::Limited(50_000)));
		assert_eq!(merged.nonce, Some(NoncePolicy::Pending));
		assert_eq!(merged.tx_type, Some(TransactionType::Legacy));
		assert_eq!(merged.call_on_block, Some(BlockNumber::Pending));
	}

	#[test]
	fn test_merge_all_rightmost_wins() {
		let contract = TransactionOptions {
			tx_type: Some(TransactionType::Eip2930),
			nonce: Some(NoncePolicy::Latest),
			..Default::default()
		};
		let call = TransactionOptions {
			tx_type: Some(TransactionType::Eip1559),
			..Default::default()
		};

		let merged = TransactionOptions::defaults().merge_all([Some(&contract), None, Some(&call)]);
		assert_eq!(merged.tx_type, Some(TransactionType::Eip1559));
		assert_eq!(merged.nonce, Some(NoncePolicy::Latest));
	}

	#[test]
	fn test_options_from_toml() {
		let options: TransactionOptions = toml::from_str(
			r#"
			type = "eip1559"
			nonce = "pending"
			gas_limit = { limited = 100000 }
			max_fee_per_gas = { manual = "30000000000" }
			"#,
		)
		.unwrap();

		assert_eq!(options.tx_type, Some(TransactionType::Eip1559));
		assert_eq!(options.gas_limit, Some(GasLimitPolicy::Limited(100_000)));
		assert_eq!(
			options.max_fee_per_gas,
			Some(FeePerGasPolicy::Manual(U256::from(30_000_000_000u64)))
		);
		assert!(options.gas_price.is_none());
		assert!(!options.is_empty());
		assert!(TransactionOptions::default().is_empty());
	}
}
