//! Test doubles shared by the module tests.

use alloy_json_abi::JsonAbi;
use alloy_primitives::U256;
use async_trait::async_trait;
use evm_oracle::FeeOracle;
use evm_rpc::implementations::mock::MockTransport;
use evm_rpc::RpcClient;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Oracle answering with fixed suggestions and counting its calls.
#[derive(Default)]
pub struct FixedOracle {
	pub base_fees: Vec<U256>,
	pub tips: Vec<U256>,
	pub gas_prices: Vec<U256>,
	calls: AtomicUsize,
}

impl FixedOracle {
	pub fn new(base_fees: &[u64], tips: &[u64], gas_prices: &[u64]) -> Self {
		let values = |raw: &[u64]| raw.iter().map(|v| U256::from(*v)).collect();
		Self {
			base_fees: values(base_fees),
			tips: values(tips),
			gas_prices: values(gas_prices),
			calls: AtomicUsize::new(0),
		}
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn record(&self) {
		self.calls.fetch_add(1, Ordering::SeqCst);
	}
}

#[async_trait]
impl FeeOracle for FixedOracle {
	async fn base_fee_percentiles(&self) -> Vec<U256> {
		self.record();
		self.base_fees.clone()
	}

	async fn tip_fee_percentiles(&self) -> Vec<U256> {
		self.record();
		self.tips.clone()
	}

	async fn both_fee_percentiles(&self) -> (Vec<U256>, Vec<U256>) {
		self.record();
		(self.base_fees.clone(), self.tips.clone())
	}

	async fn gas_price_legacy_percentiles(&self) -> Vec<U256> {
		self.record();
		self.gas_prices.clone()
	}
}

pub fn mock_client() -> (RpcClient, Arc<MockTransport>) {
	let mock = Arc::new(MockTransport::new());
	(RpcClient::new(mock.clone()), mock)
}

/// Well-known development key and its address.
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// ABI with one state-changing and one read-only method.
pub fn token_abi() -> Arc<JsonAbi> {
	let abi: JsonAbi = serde_json::from_str(
		r#"[
			{"type":"function","name":"transfer","stateMutability":"nonpayable",
			 "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
			 "outputs":[{"name":"","type":"bool"}]},
			{"type":"function","name":"balanceOf","stateMutability":"view",
			 "inputs":[{"name":"owner","type":"address"}],
			 "outputs":[{"name":"","type":"uint256"}]}
		]"#,
	)
	.unwrap();
	Arc::new(abi)
}
