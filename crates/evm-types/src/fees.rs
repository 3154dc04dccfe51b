//! Fee history returned by `eth_feeHistory`.

use crate::block::BlockNumber;
use alloy_primitives::{U256, U64};
use serde::{Deserialize, Serialize};

/// Window and percentiles used by the fee oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
	/// Newest block of the window.
	pub block: BlockNumber,
	/// Number of blocks in the window.
	pub block_count: u64,
	/// Percentiles in (0, 100] to sample each block at.
	pub percentiles: Vec<f64>,
}

impl Default for OracleSettings {
	fn default() -> Self {
		Self {
			block: BlockNumber::Latest,
			block_count: 20,
			percentiles: vec![75.0],
		}
	}
}

/// Historical per-block fee data for a contiguous window of blocks.
///
/// `base_fee_per_gas` holds one more entry than the window size: the last
/// value is the base fee of the block following the newest one in the window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeHistory {
	pub oldest_block: U64,
	#[serde(default)]
	pub base_fee_per_gas: Vec<U256>,
	#[serde(default)]
	pub gas_used_ratio: Vec<f64>,
	/// Block-major tip samples: `reward[block][percentile]`.
	#[serde(default)]
	pub reward: Vec<Vec<U256>>,
}

impl FeeHistory {
	/// Number of blocks covered by the window.
	pub fn block_count(&self) -> usize {
		self.gas_used_ratio.len()
	}

	/// Checks the shape of the history against the requested percentile count.
	///
	/// Mismatched lengths are rejected, never truncated or padded.
	pub fn validate(&self, percentile_count: usize) -> Result<(), String> {
		let blocks = self.block_count();
		if self.base_fee_per_gas.len() != blocks + 1 {
			return Err(format!(
				"expected {} base fee entries for {} blocks, got {}",
				blocks + 1,
				blocks,
				self.base_fee_per_gas.len()
			));
		}
		if percentile_count == 0 {
			return Ok(());
		}
		if self.reward.len() != blocks {
			return Err(format!(
				"expected {} reward rows, got {}",
				blocks,
				self.reward.len()
			));
		}
		if let Some((index, row)) = self
			.reward
			.iter()
			.enumerate()
			.find(|(_, row)| row.len() != percentile_count)
		{
			return Err(format!(
				"reward row {} has {} entries, expected {}",
				index,
				row.len(),
				percentile_count
			));
		}
		Ok(())
	}
}
