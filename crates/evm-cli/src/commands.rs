//! Subcommand implementations.

use alloy_json_abi::JsonAbi;
use alloy_primitives::{Address, U256};
use evm_core::Web3Client;
use evm_events::ContractEvents;
use evm_oracle::FeeOracle;
use evm_types::{
	format_units, BlockNumber, ResolvedTransaction, TransactionIntent, TransactionOptions,
	TransactionType,
};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

fn gwei(values: &[U256]) -> String {
	if values.is_empty() {
		return "unavailable".to_string();
	}
	values
		.iter()
		.map(|v| format!("{} gwei", format_units(*v, 9)))
		.collect::<Vec<_>>()
		.join(", ")
}

pub async fn fees(client: &Web3Client) -> Result<(), Box<dyn Error>> {
	let oracle = client.oracle();
	let settings = oracle.settings();
	let (base_fees, tips) = oracle.both_fee_percentiles().await;
	let legacy = oracle.gas_price_legacy_percentiles().await;
	let node_price = client.rpc().gas_price().await?;

	println!(
		"window:       {} blocks up to {}, percentiles {:?}",
		settings.block_count, settings.block, settings.percentiles
	);
	println!("base fee:     {}", gwei(&base_fees));
	println!("priority tip: {}", gwei(&tips));
	println!("legacy price: {}", gwei(&legacy));
	println!("eth_gasPrice: {} gwei", format_units(node_price, 9));
	Ok(())
}

pub async fn transfer(
	client: &Web3Client,
	to: Address,
	value: U256,
	eip1559: bool,
	send: bool,
) -> Result<(), Box<dyn Error>> {
	let intent = TransactionIntent::transfer(to, value);
	let overlay = TransactionOptions {
		tx_type: eip1559.then_some(TransactionType::Eip1559),
		..Default::default()
	};

	if send {
		let result = client.send(&intent, Some(&overlay)).await?;
		print!("{}", render_transaction(&result.transaction));
		println!("hash:      {}", result.hash);
	} else {
		let transaction = client.assemble(&intent, Some(&overlay)).await?;
		print!("{}", render_transaction(&transaction));
	}
	Ok(())
}

pub async fn events(
	client: &Web3Client,
	abi_path: &Path,
	event: &str,
	address: Option<Address>,
	block: BlockNumber,
) -> Result<(), Box<dyn Error>> {
	let abi = load_abi(abi_path).await?;
	let contract = ContractEvents::new(client.rpc().clone(), Arc::new(abi), address);
	let parser = contract.parser(event, None)?;
	let results = parser.parse_block_by_number(block).await?;

	println!("{} {} event(s) in block {}", results.len(), event, block);
	for result in results {
		let tx_hash = result
			.event_log
			.as_ref()
			.and_then(|log| log.transaction_hash)
			.map(|hash| hash.to_string())
			.unwrap_or_default();
		println!("- {} from {} in {}", result.event_name, result.contract_address, tx_hash);

		let mut params: Vec<_> = result.decoded_result.iter().collect();
		params.sort_by(|a, b| a.0.cmp(b.0));
		for (name, value) in params {
			println!("    {}: {:?}", name, value);
		}
	}
	Ok(())
}

/// Reads a JSON ABI, either a bare array or a build artifact with an `abi` key.
pub async fn load_abi(path: &Path) -> Result<JsonAbi, Box<dyn Error>> {
	let content = tokio::fs::read_to_string(path).await?;
	let mut value: serde_json::Value = serde_json::from_str(&content)?;
	if let Some(abi) = value.get_mut("abi") {
		value = abi.take();
	}
	Ok(serde_json::from_value(value)?)
}

fn render_transaction(tx: &ResolvedTransaction) -> String {
	let mut out = String::new();
	let mut line = |label: &str, value: String| {
		out.push_str(&format!("{:<10} {}\n", format!("{}:", label), value));
	};

	line("type", format!("{:?}", tx.tx_type()));
	if let Some(chain_id) = tx.chain_id {
		line("chain", chain_id.to_string());
	}
	if let Some(from) = tx.from {
		line("from", from.to_string());
	}
	if let Some(to) = tx.to {
		line("to", to.to_string());
	}
	line("value", tx.value.to_string());
	line("nonce", tx.nonce.to_string());
	line("gas", tx.gas_limit.to_string());
	if let Some(price) = tx.gas_price() {
		line("gasPrice", format!("{} gwei", format_units(price, 9)));
	}
	if let Some(max_fee) = tx.max_fee_per_gas() {
		line("maxFee", format!("{} gwei", format_units(max_fee, 9)));
	}
	if let Some(tip) = tx.max_priority_fee_per_gas() {
		line("tip", format!("{} gwei", format_units(tip, 9)));
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::Bytes;
	use evm_types::Pricing;
	use tempfile::TempDir;

	#[test]
	fn test_render_dynamic_fee_transaction() {
		let tx = ResolvedTransaction {
			chain_id: Some(1),
			from: None,
			to: Some(Address::repeat_byte(0x42)),
			value: U256::from(5),
			data: Bytes::new(),
			nonce: 3,
			gas_limit: 21_000,
			pricing: Pricing::Eip1559 {
				max_fee_per_gas: U256::from(30_000_000_000u64),
				max_priority_fee_per_gas: U256::from(1_000_000_000u64),
			},
			access_list: None,
		};

		let rendered = render_transaction(&tx);
		assert!(rendered.contains("nonce:     3"));
		assert!(rendered.contains("gas:       21000"));
		assert!(rendered.contains("maxFee:"));
		assert!(!rendered.contains("gasPrice:"));
		assert!(!rendered.contains("from:"));
	}

	#[test]
	fn test_gwei_formatting_of_empty_suggestions() {
		assert_eq!(gwei(&[]), "unavailable");
	}

	#[tokio::test]
	async fn test_load_abi_accepts_artifacts() {
		let dir = TempDir::new().unwrap();
		let entries = r#"[{"type":"event","name":"Ping","anonymous":false,"inputs":[]}]"#;

		let bare = dir.path().join("bare.json");
		std::fs::write(&bare, entries).unwrap();
		let artifact = dir.path().join("artifact.json");
		let wrapped = format!(r#"{{"contractName":"Pinger","abi":{}}}"#, entries);
		std::fs::write(&artifact, wrapped).unwrap();

		for path in [bare, artifact] {
			let abi = load_abi(&path).await.unwrap();
			assert!(abi.event("Ping").is_some());
		}
	}

	#[tokio::test]
	async fn test_load_abi_rejects_garbage() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("broken.json");
		std::fs::write(&path, "not json").unwrap();
		assert!(load_abi(&path).await.is_err());
	}
}
