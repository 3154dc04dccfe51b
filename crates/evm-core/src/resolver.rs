//! Policy resolution.
//!
//! Turns merged transaction options into concrete values. Manual and exact
//! policies never touch the node. The nonce query and the gas estimate are
//! independent and issued together; fee suggestions are requested once both
//! have succeeded.

use crate::AssemblyError;
use alloy_primitives::{Address, Bytes, U256, U64};
use evm_oracle::FeeOracle;
use evm_rpc::{CallRequest, RpcClient};
use evm_types::{
	BlockNumber, FeePerGasPolicy, GasLimitPolicy, GasPricePolicy, NoncePolicy, Pricing,
	ResolvedTransaction, TransactionOptions, TransactionType,
};
use std::sync::Arc;

/// Resolves nonce, gas limit and pricing policies.
#[derive(Clone)]
pub struct PolicyResolver {
	client: RpcClient,
	oracle: Arc<dyn FeeOracle>,
}

/// Fixed-point scale used to apply fractional margins to fee values.
const MARGIN_SCALE: u64 = 1_000_000;

fn check_margin(factor: f64) -> Result<(), AssemblyError> {
	if !factor.is_finite() || factor < 1.0 {
		return Err(AssemblyError::Input(format!(
			"Margin factor must be a finite number of at least 1.0, got {}",
			factor
		)));
	}
	Ok(())
}

/// `ceil(estimate * factor)`.
fn gas_with_margin(estimate: u64, factor: f64) -> Result<u64, AssemblyError> {
	let scaled = (estimate as f64 * factor).ceil();
	if scaled >= u64::MAX as f64 {
		return Err(AssemblyError::Input(format!(
			"Gas limit {} with margin {} overflows",
			estimate, factor
		)));
	}
	Ok(scaled as u64)
}

/// `ceil(value * factor)`, computed in fixed point.
fn price_with_margin(value: U256, factor: f64) -> U256 {
	let scale = U256::from(MARGIN_SCALE);
	let scaled_factor = U256::from((factor * MARGIN_SCALE as f64).round() as u64);
	value
		.saturating_mul(scaled_factor)
		.div_ceil(scale)
}

fn highest(suggestions: Vec<U256>, what: &str) -> Result<U256, AssemblyError> {
	suggestions
		.into_iter()
		.max()
		.ok_or_else(|| AssemblyError::Processing(format!("Failed to get {} suggestion", what)))
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AssemblyError> {
	value.ok_or_else(|| AssemblyError::Input(format!("No '{}' policy provided", field)))
}

impl PolicyResolver {
	pub fn new(client: RpcClient, oracle: Arc<dyn FeeOracle>) -> Self {
		Self { client, oracle }
	}

	pub fn client(&self) -> &RpcClient {
		&self.client
	}

	/// Resolves every policy in `options` for a transaction carrying `data`.
	///
	/// Fails before any node call when a required policy or the sender is
	/// missing, or a margin factor is invalid.
	pub async fn resolve(
		&self,
		data: &Bytes,
		options: &TransactionOptions,
	) -> Result<ResolvedTransaction, AssemblyError> {
		let tx_type = required(options.tx_type, "type")?;
		let nonce_policy = required(options.nonce, "nonce")?;
		let gas_policy = required(options.gas_limit, "gas_limit")?;
		if options.from.is_none() && !matches!(nonce_policy, NoncePolicy::Exact(_)) {
			return Err(AssemblyError::Input("No 'from' field provided".to_string()));
		}
		if let GasLimitPolicy::WithMargin(factor) = gas_policy {
			check_margin(factor)?;
		}
		if tx_type.uses_gas_price() {
			if let Some(GasPricePolicy::WithMargin(factor)) = options.gas_price {
				check_margin(factor)?;
			}
		}

		let (nonce, gas_limit) = tokio::try_join!(
			self.resolve_nonce(nonce_policy, options.from),
			self.resolve_gas_limit(gas_policy, tx_type, data, options),
		)?;

		let pricing = self.resolve_pricing(tx_type, options).await?;

		tracing::debug!(
			component = "resolver",
			nonce,
			gas_limit,
			tx_type = ?tx_type,
			"Resolved transaction policies"
		);

		Ok(ResolvedTransaction {
			chain_id: options.chain_id,
			from: options.from,
			to: options.to,
			value: options.value.unwrap_or_default(),
			data: data.clone(),
			nonce,
			gas_limit,
			pricing,
			access_list: options.access_list.clone(),
		})
	}

	pub async fn resolve_nonce(
		&self,
		policy: NoncePolicy,
		from: Option<Address>,
	) -> Result<u64, AssemblyError> {
		let block = match policy {
			NoncePolicy::Exact(nonce) => return Ok(nonce),
			NoncePolicy::Pending => BlockNumber::Pending,
			NoncePolicy::Latest => BlockNumber::Latest,
		};
		let from =
			from.ok_or_else(|| AssemblyError::Input("No 'from' field provided".to_string()))?;
		Ok(self.client.get_transaction_count(from, block).await?)
	}

	pub async fn resolve_gas_limit(
		&self,
		policy: GasLimitPolicy,
		tx_type: TransactionType,
		data: &Bytes,
		options: &TransactionOptions,
	) -> Result<u64, AssemblyError> {
		match policy {
			GasLimitPolicy::Manual(gas_limit) => return Ok(gas_limit),
			GasLimitPolicy::WithMargin(factor) => check_margin(factor)?,
			_ => {},
		}

		let request = estimate_request(tx_type, data, options);
		let block = options.call_on_block.unwrap_or(BlockNumber::Pending);
		let estimate = self.client.estimate_gas(&request, block).await?;

		match policy {
			GasLimitPolicy::Manual(gas_limit) => Ok(gas_limit),
			GasLimitPolicy::Automatic => Ok(estimate),
			GasLimitPolicy::WithMargin(factor) => gas_with_margin(estimate, factor),
			GasLimitPolicy::Limited(cap) if cap < estimate => Err(AssemblyError::Input(format!(
				"Gas limit cap {} is below the estimated {}",
				cap, estimate
			))),
			GasLimitPolicy::Limited(_) => Ok(estimate),
		}
	}

	pub async fn resolve_pricing(
		&self,
		tx_type: TransactionType,
		options: &TransactionOptions,
	) -> Result<Pricing, AssemblyError> {
		if tx_type.uses_gas_price() {
			let policy = required(options.gas_price, "gas_price")?;
			if let GasPricePolicy::WithMargin(factor) = policy {
				check_margin(factor)?;
			}
			let gas_price = match policy {
				GasPricePolicy::Manual(price) => price,
				GasPricePolicy::Automatic => {
					highest(self.oracle.gas_price_legacy_percentiles().await, "gas price")?
				},
				GasPricePolicy::WithMargin(factor) => {
					let suggestion =
						highest(self.oracle.gas_price_legacy_percentiles().await, "gas price")?;
					price_with_margin(suggestion, factor)
				},
			};
			return Ok(match tx_type {
				TransactionType::Eip2930 => Pricing::Eip2930 { gas_price },
				_ => Pricing::Legacy { gas_price },
			});
		}

		let tip_policy = required(options.max_priority_fee_per_gas, "max_priority_fee_per_gas")?;
		let max_fee_policy = required(options.max_fee_per_gas, "max_fee_per_gas")?;

		let (max_priority_fee_per_gas, max_fee_per_gas) = match (tip_policy, max_fee_policy) {
			(FeePerGasPolicy::Manual(tip), FeePerGasPolicy::Manual(max_fee)) => (tip, max_fee),
			(FeePerGasPolicy::Manual(tip), FeePerGasPolicy::Automatic) => {
				let base_fee = highest(self.oracle.base_fee_percentiles().await, "base fee")?;
				(tip, base_fee.saturating_add(tip))
			},
			(FeePerGasPolicy::Automatic, FeePerGasPolicy::Manual(max_fee)) => {
				let tip = highest(self.oracle.tip_fee_percentiles().await, "priority fee")?;
				(tip, max_fee)
			},
			(FeePerGasPolicy::Automatic, FeePerGasPolicy::Automatic) => {
				let (base_fees, tips) = self.oracle.both_fee_percentiles().await;
				let tip = highest(tips, "priority fee")?;
				let base_fee = highest(base_fees, "base fee")?;
				(tip, base_fee.saturating_add(tip))
			},
		};

		Ok(Pricing::Eip1559 {
			max_fee_per_gas,
			max_priority_fee_per_gas,
		})
	}
}

/// Estimation request carrying only what affects execution.
///
/// Unset gas prices are replaced with 1 wei so nodes do not reject a zero
/// priced call; EIP-1559 fees are only sent when set manually.
pub fn estimate_request(
	tx_type: TransactionType,
	data: &Bytes,
	options: &TransactionOptions,
) -> CallRequest {
	let mut request = CallRequest {
		from: options.from,
		to: options.to,
		value: options.value,
		data: Some(data.clone()),
		transaction_type: Some(U64::from(tx_type.type_byte())),
		access_list: options.access_list.clone(),
		..Default::default()
	};

	if tx_type.uses_gas_price() {
		request.gas_price = Some(match options.gas_price {
			Some(GasPricePolicy::Manual(price)) => price,
			_ => U256::from(1),
		});
	} else {
		if let Some(FeePerGasPolicy::Manual(max_fee)) = options.max_fee_per_gas {
			request.max_fee_per_gas = Some(max_fee);
		}
		if let Some(FeePerGasPolicy::Manual(tip)) = options.max_priority_fee_per_gas {
			request.max_priority_fee_per_gas = Some(tip);
		}
	}
	request
}
