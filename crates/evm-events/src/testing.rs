//! Fixtures shared by the module tests.

use alloy_json_abi::{Event, JsonAbi};
use alloy_primitives::{hex, Address, Bloom, BloomInput, Bytes, B256, U256};
use evm_rpc::implementations::mock::MockTransport;
use evm_rpc::RpcClient;
use evm_types::EventLog;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn token_abi() -> Arc<JsonAbi> {
	let abi: JsonAbi = serde_json::from_str(
		r#"[
			{"type":"event","name":"Transfer","anonymous":false,"inputs":[
				{"name":"from","type":"address","indexed":true},
				{"name":"to","type":"address","indexed":true},
				{"name":"value","type":"uint256","indexed":false}]},
			{"type":"event","name":"Approval","anonymous":false,"inputs":[
				{"name":"owner","type":"address","indexed":true},
				{"name":"spender","type":"address","indexed":true},
				{"name":"value","type":"uint256","indexed":false}]},
			{"type":"function","name":"transfer","stateMutability":"nonpayable",
			 "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
			 "outputs":[{"name":"","type":"bool"}]}
		]"#,
	)
	.unwrap();
	Arc::new(abi)
}

pub fn transfer_event() -> Event {
	token_abi().event("Transfer").unwrap()[0].clone()
}

pub fn approval_event() -> Event {
	token_abi().event("Approval").unwrap()[0].clone()
}

fn log_of(
	event: &Event,
	emitter: Address,
	first: Address,
	second: Address,
	value: u64,
) -> EventLog {
	EventLog {
		address: emitter,
		topics: vec![event.selector(), first.into_word(), second.into_word()],
		data: Bytes::from(B256::from(U256::from(value)).to_vec()),
		block_number: None,
		block_hash: None,
		transaction_hash: Some(B256::repeat_byte(value as u8)),
		transaction_index: None,
		log_index: None,
		removed: false,
	}
}

/// A `Transfer(from, to, value)` log whose transaction hash repeats `value`'s low byte.
pub fn transfer_log(emitter: Address, from: Address, to: Address, value: u64) -> EventLog {
	log_of(&transfer_event(), emitter, from, to, value)
}

pub fn approval_log(emitter: Address, owner: Address, spender: Address, value: u64) -> EventLog {
	log_of(&approval_event(), emitter, owner, spender, value)
}

/// Hex bloom covering the emitters and topics of `logs`.
pub fn bloom_of(logs: &[&EventLog]) -> String {
	let mut bloom = Bloom::default();
	for log in logs {
		bloom.accrue(BloomInput::Raw(log.address.as_slice()));
		for topic in &log.topics {
			bloom.accrue(BloomInput::Raw(topic.as_slice()));
		}
	}
	hex::encode_prefixed(bloom.as_slice())
}

pub fn receipt_json(hash: B256, logs: &[EventLog]) -> Value {
	json!({
		"transactionHash": hash,
		"blockNumber": "0x10",
		"status": "0x1",
		"logs": logs,
	})
}

pub fn block_json(bloom: &str, hashes: &[B256]) -> Value {
	json!({
		"number": "0x10",
		"hash": B256::repeat_byte(0xbb),
		"logsBloom": bloom,
		"transactions": hashes,
	})
}

pub fn mock_client() -> (RpcClient, Arc<MockTransport>) {
	let mock = Arc::new(MockTransport::new());
	(RpcClient::new(mock.clone()), mock)
}
