//! Parsing one event out of blocks, transactions and receipts.

use crate::bloom::{may_contain_address, may_contain_topic, parse_bloom};
use crate::decode::{decode_log, find_event};
use crate::topics::{event_topics, topics_match, TopicFilter};
use crate::EventError;
use alloy_json_abi::{Event, JsonAbi};
use alloy_primitives::{Address, Bloom, B256};
use evm_rpc::RpcClient;
use evm_types::{Block, BlockNumber, EventFilter, EventParserResult, TransactionReceipt};
use futures::future::join_all;
use std::sync::Arc;
use tracing::instrument;

/// Fetches a receipt, treating an unknown transaction as a processing error.
pub(crate) async fn fetch_receipt(
	client: &RpcClient,
	hash: B256,
) -> Result<TransactionReceipt, EventError> {
	client
		.get_transaction_receipt(hash)
		.await?
		.ok_or_else(|| EventError::Processing(format!("No receipt for transaction {}", hash)))
}

/// Parser for the occurrences of one event of one contract ABI.
#[derive(Clone)]
pub struct EventParser {
	client: RpcClient,
	abi: Arc<JsonAbi>,
	event: Event,
	/// Only logs emitted here are accepted when set.
	address: Option<Address>,
	filter: EventFilter,
	topics: TopicFilter,
}

impl EventParser {
	/// Creates a parser for `event_name`, which must be present in `abi`.
	pub fn new(
		client: RpcClient,
		abi: Arc<JsonAbi>,
		address: Option<Address>,
		event_name: &str,
		filter: Option<EventFilter>,
	) -> Result<Self, EventError> {
		let event = find_event(&abi, event_name)?.clone();
		let filter = filter.unwrap_or_default();
		let topics = event_topics(&event, &filter.parameter_filters)?;

		Ok(Self {
			client,
			abi,
			event,
			address,
			filter,
			topics,
		})
	}

	pub fn event(&self) -> &Event {
		&self.event
	}

	pub fn abi(&self) -> &JsonAbi {
		&self.abi
	}

	/// Parses every transaction of the block at `number`.
	#[instrument(skip_all, fields(event = %self.event.name, block = %number))]
	pub async fn parse_block_by_number(
		&self,
		number: BlockNumber,
	) -> Result<Vec<EventParserResult>, EventError> {
		self.check_single_block()?;
		let block = self
			.client
			.get_block_by_number(number, false)
			.await?
			.ok_or_else(|| EventError::Processing(format!("Block {} not found", number)))?;
		self.parse_block(&block).await
	}

	/// Parses every transaction of the block with `hash`.
	#[instrument(skip_all, fields(event = %self.event.name, block = %hash))]
	pub async fn parse_block_by_hash(
		&self,
		hash: B256,
	) -> Result<Vec<EventParserResult>, EventError> {
		self.check_single_block()?;
		let block = self
			.client
			.get_block_by_hash(hash, false)
			.await?
			.ok_or_else(|| EventError::Processing(format!("Block {} not found", hash)))?;
		self.parse_block(&block).await
	}

	/// Parses every transaction of `block`, in block order.
	///
	/// Returns nothing without fetching any receipt when the block's bloom
	/// rules out every accepted emitter or the event. Receipts are fetched
	/// concurrently; if any fetch fails the whole parse fails once all have
	/// finished.
	pub async fn parse_block(&self, block: &Block) -> Result<Vec<EventParserResult>, EventError> {
		let raw_bloom = block
			.logs_bloom
			.as_deref()
			.ok_or_else(|| EventError::Processing("Block has no logs bloom".to_string()))?;
		let bloom = parse_bloom(raw_bloom)?;

		if !self.bloom_may_contain_emitter(&bloom) {
			tracing::debug!(address = ?self.address, "No accepted emitter in block bloom");
			return Ok(Vec::new());
		}
		if !self.event.anonymous && !may_contain_topic(&bloom, &self.event.selector()) {
			tracing::debug!(event = %self.event.name, "Event absent from block bloom");
			return Ok(Vec::new());
		}

		let hashes = block.transaction_hashes();
		let outcomes = join_all(
			hashes
				.iter()
				.map(|hash| self.parse_transaction_by_hash(*hash)),
		)
		.await;

		let mut results = Vec::new();
		for outcome in outcomes {
			results.extend(outcome?);
		}
		tracing::debug!(
			transactions = hashes.len(),
			events = results.len(),
			"Parsed block"
		);
		Ok(results)
	}

	/// Parses the receipt of the transaction with `hash`.
	pub async fn parse_transaction_by_hash(
		&self,
		hash: B256,
	) -> Result<Vec<EventParserResult>, EventError> {
		let receipt = fetch_receipt(&self.client, hash).await?;
		Ok(self.parse_receipt(&receipt))
	}

	/// Decodes the matching logs of `receipt`; issues no requests.
	pub fn parse_receipt(&self, receipt: &TransactionReceipt) -> Vec<EventParserResult> {
		receipt
			.logs
			.iter()
			.filter(|log| self.accepts_emitter(&log.address))
			.filter(|log| topics_match(&self.topics, &log.topics))
			.filter_map(|log| match decode_log(&self.event, log) {
				Ok(decoded) => Some(EventParserResult {
					event_name: self.event.name.clone(),
					decoded_result: decoded,
					contract_address: log.address,
					transaction_receipt: Some(receipt.clone()),
					event_log: Some(log.clone()),
				}),
				Err(e) => {
					tracing::debug!(error = %e, "Skipping undecodable log");
					None
				},
			})
			.collect()
	}

	/// The emitter must be the contract address when one is bound, and one of
	/// `filter.addresses` when that list is non-empty.
	fn accepts_emitter(&self, emitter: &Address) -> bool {
		if self.address.is_some_and(|address| address != *emitter) {
			return false;
		}
		self.filter.addresses.is_empty() || self.filter.addresses.contains(emitter)
	}

	/// Whether some emitter `accepts_emitter` would keep can appear in `bloom`.
	fn bloom_may_contain_emitter(&self, bloom: &Bloom) -> bool {
		match &self.address {
			Some(address) => self.accepts_emitter(address) && may_contain_address(bloom, address),
			None if self.filter.addresses.is_empty() => true,
			None => self
				.filter
				.addresses
				.iter()
				.any(|address| may_contain_address(bloom, address)),
		}
	}

	fn check_single_block(&self) -> Result<(), EventError> {
		if self.filter.has_block_range() {
			return Err(EventError::Input(
				"Can not mix parsing a specific block with a block range filter".to_string(),
			));
		}
		Ok(())
	}
}
