//! Topic encoding for indexed event parameters.

use crate::EventError;
use alloy_dyn_abi::DynSolValue;
use alloy_json_abi::Event;
use alloy_primitives::{keccak256, B256};

/// Positional topic constraints; `None` matches anything.
pub type TopicFilter = Vec<Option<Vec<B256>>>;

/// Encodes a value the way it appears as an indexed topic.
///
/// Word-sized values are stored as-is; strings, bytes, arrays and tuples are
/// stored as the hash of their packed encoding.
pub fn encode_topic(value: &DynSolValue) -> B256 {
	match value.as_word() {
		Some(word) => word,
		None => keccak256(value.abi_encode_packed()),
	}
}

fn indexed_count(event: &Event) -> usize {
	event.inputs.iter().filter(|param| param.indexed).count()
}

/// Builds the topic constraints for `event`: its selector followed by one
/// entry per indexed parameter, with trailing wildcards dropped.
pub fn event_topics(
	event: &Event,
	parameter_filters: &[Option<Vec<DynSolValue>>],
) -> Result<TopicFilter, EventError> {
	let indexed = indexed_count(event);
	if parameter_filters.len() > indexed {
		return Err(EventError::Input(format!(
			"Event {} has {} indexed parameters but {} filters were given",
			event.name,
			indexed,
			parameter_filters.len()
		)));
	}

	let mut topics: TopicFilter = Vec::with_capacity(parameter_filters.len() + 1);
	if !event.anonymous {
		topics.push(Some(vec![event.selector()]));
	}
	for filter in parameter_filters {
		topics.push(
			filter
				.as_ref()
				.map(|values| values.iter().map(encode_topic).collect()),
		);
	}

	while matches!(topics.last(), Some(None)) {
		topics.pop();
	}
	Ok(topics)
}

/// True when every constrained position of `filter` is satisfied by `topics`.
pub fn topics_match(filter: &TopicFilter, topics: &[B256]) -> bool {
	filter
		.iter()
		.enumerate()
		.all(|(position, allowed)| match allowed {
			None => true,
			Some(allowed) => topics
				.get(position)
				.is_some_and(|topic| allowed.contains(topic)),
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::transfer_event;
	use alloy_primitives::{Address, U256};

	#[test]
	fn test_word_values_are_padded() {
		let address = Address::repeat_byte(0xab);
		assert_eq!(encode_topic(&DynSolValue::Address(address)), address.into_word());
		assert_eq!(
			encode_topic(&DynSolValue::Uint(U256::from(5), 256)),
			B256::from(U256::from(5))
		);
		assert_eq!(
			encode_topic(&DynSolValue::Bool(true)),
			B256::from(U256::from(1))
		);
	}

	#[test]
	fn test_dynamic_values_are_hashed() {
		assert_eq!(
			encode_topic(&DynSolValue::String("hello".into())),
			keccak256("hello")
		);
		assert_eq!(
			encode_topic(&DynSolValue::Bytes(vec![1, 2, 3])),
			keccak256([1u8, 2, 3])
		);
	}

	#[test]
	fn test_event_topics() {
		let event = transfer_event();
		let to = Address::repeat_byte(0x02);

		let topics = event_topics(&event, &[None, Some(vec![DynSolValue::Address(to)])]).unwrap();
		assert_eq!(
			topics,
			vec![Some(vec![event.selector()]), None, Some(vec![to.into_word()])]
		);

		// Trailing wildcards are dropped
		let topics = event_topics(&event, &[None, None]).unwrap();
		assert_eq!(topics, vec![Some(vec![event.selector()])]);

		// Transfer has two indexed parameters
		let err = event_topics(&event, &[None, None, None]).unwrap_err();
		assert!(matches!(err, EventError::Input(_)));
	}

	#[test]
	fn test_topics_match() {
		let a = B256::repeat_byte(0x0a);
		let b = B256::repeat_byte(0x0b);
		let filter = vec![Some(vec![a]), None, Some(vec![a, b])];

		assert!(topics_match(&filter, &[a, b, b]));
		assert!(!topics_match(&filter, &[b, b, b]));
		assert!(!topics_match(&filter, &[a, b]));
		assert!(topics_match(&Vec::new(), &[]));
	}
}
