//! Fee oracle for EIP-1559 and legacy transactions.
//!
//! The oracle samples a window of recent blocks and suggests base fees, priority
//! fees and legacy gas prices at the configured percentiles. Samples are always
//! cropped of their single smallest and largest value before any statistic is
//! computed.
//!
//! The percentile API never fails at the call site: a failure of any kind is
//! logged and collapses to an empty suggestion list. Callers that need the
//! reason use the `try_*` methods, which return [`OracleError`].

use alloy_primitives::U256;
use async_trait::async_trait;
use evm_rpc::{RpcClient, RpcError};
use evm_types::{BlockNumber, FeeHistory, OracleSettings};
use thiserror::Error;

pub mod stats;

pub use stats::Statistic;

/// Errors that can occur while computing fee suggestions.
#[derive(Debug, Error)]
pub enum OracleError {
	/// The node request failed.
	#[error("RPC error: {0}")]
	Rpc(#[from] RpcError),
	/// The fee history does not have the shape that was requested.
	#[error("Malformed fee history: {0}")]
	MalformedHistory(String),
	/// Too few samples remain once anomalies are cropped.
	#[error("Not enough samples to compute a statistic: {0}")]
	InsufficientData(usize),
	/// A percentile is zero, negative or not finite.
	#[error("Invalid percentile: {0}")]
	InvalidPercentile(f64),
	/// The configured block cannot be resolved to a number.
	#[error("Unable to resolve block '{0}' to a block number")]
	UnsupportedBlock(BlockNumber),
	/// The node does not know a block inside the window.
	#[error("Block {0} not found")]
	BlockNotFound(BlockNumber),
}

/// Source of fee suggestions used by the transaction resolver.
///
/// Each list has one entry per configured percentile, or is empty when no
/// suggestion is available.
#[async_trait]
pub trait FeeOracle: Send + Sync {
	async fn base_fee_percentiles(&self) -> Vec<U256>;

	async fn tip_fee_percentiles(&self) -> Vec<U256>;

	/// Base fee and tip suggestions from a single fee history fetch.
	async fn both_fee_percentiles(&self) -> (Vec<U256>, Vec<U256>);

	async fn gas_price_legacy_percentiles(&self) -> Vec<U256>;
}

/// Node-backed fee oracle.
#[derive(Clone)]
pub struct Oracle {
	client: RpcClient,
	settings: OracleSettings,
}

fn collapse<T: Default>(operation: &'static str, result: Result<T, OracleError>) -> T {
	result.unwrap_or_else(|e| {
		tracing::warn!(component = "oracle", operation, error = %e, "Fee suggestion unavailable");
		T::default()
	})
}

impl Oracle {
	pub fn new(client: RpcClient, settings: OracleSettings) -> Self {
		Self { client, settings }
	}

	pub fn settings(&self) -> &OracleSettings {
		&self.settings
	}

	/// Fetches and validates the fee history window.
	pub async fn fee_history(&self) -> Result<FeeHistory, OracleError> {
		let history = self
			.client
			.fee_history(
				self.settings.block_count,
				self.settings.block,
				&self.settings.percentiles,
			)
			.await?;
		history
			.validate(self.settings.percentiles.len())
			.map_err(OracleError::MalformedHistory)?;

		tracing::debug!(
			component = "oracle",
			oldest_block = %history.oldest_block,
			blocks = history.block_count(),
			"Fetched fee history"
		);
		Ok(history)
	}

	fn base_fees_from(&self, history: &FeeHistory) -> Result<Vec<U256>, OracleError> {
		stats::cropped_percentiles(&history.base_fee_per_gas, &self.settings.percentiles)
	}

	fn tips_from(&self, history: &FeeHistory) -> Result<Vec<U256>, OracleError> {
		stats::soft(&stats::transpose(&history.reward))
	}

	pub async fn try_base_fee_percentiles(&self) -> Result<Vec<U256>, OracleError> {
		let history = self.fee_history().await?;
		self.base_fees_from(&history)
	}

	pub async fn try_tip_fee_percentiles(&self) -> Result<Vec<U256>, OracleError> {
		let history = self.fee_history().await?;
		self.tips_from(&history)
	}

	/// Both suggestion lists from one fetch; fails if either cannot be computed.
	pub async fn try_both_fee_percentiles(&self) -> Result<(Vec<U256>, Vec<U256>), OracleError> {
		let history = self.fee_history().await?;
		Ok((self.base_fees_from(&history)?, self.tips_from(&history)?))
	}

	pub async fn try_gas_price_legacy_percentiles(&self) -> Result<Vec<U256>, OracleError> {
		let gas_prices = self.legacy_gas_prices().await?;
		if gas_prices.is_empty() {
			return Ok(Vec::new());
		}
		stats::cropped_percentiles(&gas_prices, &self.settings.percentiles)
	}

	/// Resolves the configured block to a number.
	async fn newest_block_number(&self) -> Result<u64, OracleError> {
		match self.settings.block {
			BlockNumber::Latest => Ok(self.client.block_number().await?),
			BlockNumber::Exact(number) => Ok(number),
			other => Err(OracleError::UnsupportedBlock(other)),
		}
	}

	/// Gas prices of every transaction in the window, in block order.
	///
	/// Windows reaching back past genesis yield no samples.
	async fn legacy_gas_prices(&self) -> Result<Vec<U256>, OracleError> {
		let newest = self.newest_block_number().await?;
		let block_count = self.settings.block_count;
		if newest <= block_count {
			return Ok(Vec::new());
		}

		let fetches = (newest - block_count..=newest).map(|number| {
			let client = self.client.clone();
			async move {
				let block = BlockNumber::Exact(number);
				client
					.get_block_by_number(block, true)
					.await?
					.ok_or(OracleError::BlockNotFound(block))
			}
		});
		let blocks = futures::future::try_join_all(fetches).await?;

		Ok(blocks
			.iter()
			.flat_map(|block| block.transactions.iter())
			.filter_map(|tx| tx.details().and_then(|details| details.gas_price))
			.collect())
	}

	/// Base fee statistic over the fee history window.
	///
	/// `Maximum` is never below the base fee of the block after the window,
	/// so a transaction priced with it stays includable in that block.
	pub async fn try_predict_base_fee(&self, statistic: Statistic) -> Result<U256, OracleError> {
		let history = self.fee_history().await?;
		let value = stats::calculate_statistic(&history.base_fee_per_gas, statistic)?;
		match (statistic, history.base_fee_per_gas.last()) {
			(Statistic::Maximum, Some(next)) => Ok(value.max(*next)),
			_ => Ok(value),
		}
	}

	/// Priority fee statistic over the transactions of the configured block.
	pub async fn try_predict_tip(&self, statistic: Statistic) -> Result<U256, OracleError> {
		let block = self
			.client
			.get_block_by_number(self.settings.block, true)
			.await?
			.ok_or(OracleError::BlockNotFound(self.settings.block))?;
		let tips: Vec<U256> = block
			.transactions
			.iter()
			.filter_map(|tx| tx.details().and_then(|details| details.max_priority_fee_per_gas))
			.collect();
		stats::calculate_statistic(&tips, statistic)
	}

	pub async fn try_predict_gas_price_legacy(
		&self,
		statistic: Statistic,
	) -> Result<U256, OracleError> {
		let gas_prices = self.legacy_gas_prices().await?;
		stats::calculate_statistic(&gas_prices, statistic)
	}

	pub async fn predict_base_fee(&self, statistic: Statistic) -> Option<U256> {
		collapse("predict_base_fee", self.try_predict_base_fee(statistic).await.map(Some))
	}

	pub async fn predict_tip(&self, statistic: Statistic) -> Option<U256> {
		collapse("predict_tip", self.try_predict_tip(statistic).await.map(Some))
	}

	/// Paired prediction; `None` if either half cannot be computed.
	pub async fn predict_both_fees(
		&self,
		base_fee: Statistic,
		tip: Statistic,
	) -> Option<(U256, U256)> {
		let base_fee = self.predict_base_fee(base_fee).await?;
		let tip = self.predict_tip(tip).await?;
		Some((base_fee, tip))
	}

	pub async fn predict_gas_price_legacy(&self, statistic: Statistic) -> Option<U256> {
		collapse(
			"predict_gas_price_legacy",
			self.try_predict_gas_price_legacy(statistic).await.map(Some),
		)
	}
}

#[async_trait]
impl FeeOracle for Oracle {
	async fn base_fee_percentiles(&self) -> Vec<U256> {
		collapse("base_fee_percentiles", self.try_base_fee_percentiles().await)
	}

	async fn tip_fee_percentiles(&self) -> Vec<U256> {
		collapse("tip_fee_percentiles", self.try_tip_fee_percentiles().await)
	}

	async fn both_fee_percentiles(&self) -> (Vec<U256>, Vec<U256>) {
		let history = match self.fee_history().await {
			Ok(history) => history,
			Err(e) => return collapse("both_fee_percentiles", Err(e)),
		};
		(
			collapse("base_fee_percentiles", self.base_fees_from(&history)),
			collapse("tip_fee_percentiles", self.tips_from(&history)),
		)
	}

	async fn gas_price_legacy_percentiles(&self) -> Vec<U256> {
		collapse(
			"gas_price_legacy_percentiles",
			self.try_gas_price_legacy_percentiles().await,
		)
	}
}
