//! Contract-level event queries.

use crate::decode::{decode_any, decode_log, find_event};
use crate::parser::{fetch_receipt, EventParser};
use crate::topics::event_topics;
use crate::EventError;
use alloy_json_abi::JsonAbi;
use alloy_primitives::Address;
use evm_rpc::RpcClient;
use evm_types::{EventFilter, EventParserResult, LogFilter};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::instrument;

/// The events of one contract ABI, optionally bound to a deployed address.
#[derive(Clone)]
pub struct ContractEvents {
	client: RpcClient,
	abi: Arc<JsonAbi>,
	address: Option<Address>,
}

impl ContractEvents {
	pub fn new(client: RpcClient, abi: Arc<JsonAbi>, address: Option<Address>) -> Self {
		Self {
			client,
			abi,
			address,
		}
	}

	/// Parser for one event of this contract.
	pub fn parser(
		&self,
		event_name: &str,
		filter: Option<EventFilter>,
	) -> Result<EventParser, EventError> {
		EventParser::new(
			self.client.clone(),
			self.abi.clone(),
			self.address,
			event_name,
			filter,
		)
	}

	/// Queries the node for logs matching `filter` and decodes them.
	///
	/// With an event name, the indexed parameter filters become topic
	/// constraints and only that event is returned. Without one, every log
	/// whose first topic is an event of the ABI is decoded; the rest are
	/// skipped. With `join_with_receipts` every result carries the receipt
	/// of its transaction, fetched concurrently.
	#[instrument(skip_all, fields(event = event_name.unwrap_or("*")))]
	pub async fn get_indexed_events(
		&self,
		event_name: Option<&str>,
		filter: &EventFilter,
		join_with_receipts: bool,
	) -> Result<Vec<EventParserResult>, EventError> {
		let event = event_name
			.map(|name| find_event(&self.abi, name))
			.transpose()?;
		let topics = match event {
			Some(event) => event_topics(event, &filter.parameter_filters)?,
			None => Vec::new(),
		};

		let mut address: Vec<Address> = self.address.into_iter().collect();
		for extra in &filter.addresses {
			if !address.contains(extra) {
				address.push(*extra);
			}
		}

		let logs = self
			.client
			.get_logs(&LogFilter {
				from_block: filter.from_block,
				to_block: filter.to_block,
				address,
				topics,
			})
			.await?;
		let fetched = logs.len();

		let mut results: Vec<EventParserResult> = logs
			.into_iter()
			.filter_map(|log| {
				let (event_name, decoded_result) = match event {
					Some(event) => (event.name.clone(), decode_log(event, &log).ok()?),
					None => decode_any(&self.abi, &log)?,
				};
				Some(EventParserResult {
					event_name,
					decoded_result,
					contract_address: log.address,
					transaction_receipt: None,
					event_log: Some(log),
				})
			})
			.collect();
		tracing::debug!(logs = fetched, decoded = results.len(), "Fetched indexed events");

		if join_with_receipts {
			let receipts = try_join_all(results.iter().map(|result| {
				let hash = result.event_log.as_ref().and_then(|log| log.transaction_hash);
				async move {
					let hash = hash.ok_or_else(|| {
						EventError::Processing("Log has no transaction hash".to_string())
					})?;
					fetch_receipt(&self.client, hash).await
				}
			}))
			.await?;
			for (result, receipt) in results.iter_mut().zip(receipts) {
				result.transaction_receipt = Some(receipt);
			}
		}

		Ok(results)
	}
}
