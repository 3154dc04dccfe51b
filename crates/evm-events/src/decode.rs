//! Log decoding against an event ABI.

use crate::EventError;
use alloy_dyn_abi::{DynSolValue, EventExt};
use alloy_json_abi::{Event, JsonAbi};
use evm_types::EventLog;
use std::collections::HashMap;

/// Looks up an event by name, taking the first of any overloads.
pub fn find_event<'a>(abi: &'a JsonAbi, name: &str) -> Result<&'a Event, EventError> {
	abi.event(name)
		.and_then(|overloads| overloads.first())
		.ok_or_else(|| EventError::Processing(format!("No event named '{}' in the ABI", name)))
}

/// Decodes `log` as an occurrence of `event`.
///
/// Parameters are keyed by name; unnamed parameters by their position.
pub fn decode_log(
	event: &Event,
	log: &EventLog,
) -> Result<HashMap<String, DynSolValue>, EventError> {
	let decoded = event
		.decode_log_parts(log.topics.iter().copied(), &log.data)
		.map_err(|e| {
			EventError::Processing(format!("Failed to decode {} log: {}", event.name, e))
		})?;

	let mut indexed = decoded.indexed.into_iter();
	let mut body = decoded.body.into_iter();
	let mut values = HashMap::with_capacity(event.inputs.len());
	for (position, param) in event.inputs.iter().enumerate() {
		let value = if param.indexed {
			indexed.next()
		} else {
			body.next()
		};
		let Some(value) = value else {
			return Err(EventError::Processing(format!(
				"Missing value for parameter {} of {}",
				position, event.name
			)));
		};
		let key = if param.name.is_empty() {
			position.to_string()
		} else {
			param.name.clone()
		};
		values.insert(key, value);
	}
	Ok(values)
}

/// Finds the ABI event whose selector is the log's first topic and decodes it.
///
/// Returns `None` for anonymous logs, unknown selectors and logs that do not
/// decode.
pub fn decode_any(abi: &JsonAbi, log: &EventLog) -> Option<(String, HashMap<String, DynSolValue>)> {
	let topic0 = log.topics.first()?;
	abi.events()
		.filter(|event| !event.anonymous && event.selector() == *topic0)
		.find_map(|event| {
			decode_log(event, log)
				.ok()
				.map(|values| (event.name.clone(), values))
		})
}
