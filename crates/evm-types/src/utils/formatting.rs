//! Display helpers for hashes, hex strings and token quantities.

use alloy_primitives::U256;

/// Shortens a hash for log lines: the `0x` prefix and four bytes, then "..".
pub fn truncate_id(id: &str) -> String {
	match id.get(..10) {
		Some(head) if id.len() > 10 => format!("{}..", head),
		_ => id.to_string(),
	}
}

/// Strips a leading `0x` or `0X`.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Renders `amount` scaled down by `10^decimals`, without trailing zeros.
///
/// `format_units(amount, 9)` gives gwei, `format_units(amount, 18)` ether.
pub fn format_units(amount: U256, decimals: u8) -> String {
	let Some(scale) = U256::from(10u8).checked_pow(U256::from(decimals)) else {
		return amount.to_string();
	};
	let (whole, fraction) = amount.div_rem(scale);
	if fraction.is_zero() {
		return whole.to_string();
	}

	let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
	format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("0x12345678"), "0x12345678");
		assert_eq!(truncate_id("0x1234567890abcdef"), "0x12345678..");
	}

	#[test]
	fn test_without_prefix() {
		assert_eq!(without_0x_prefix("0xabc"), "abc");
		assert_eq!(without_0x_prefix("0Xabc"), "abc");
		assert_eq!(without_0x_prefix("abc"), "abc");
	}

	#[test]
	fn test_format_units() {
		assert_eq!(format_units(U256::from(1_000_000_000u64), 9), "1");
		assert_eq!(format_units(U256::from(1_500_000_000u64), 9), "1.5");
		assert_eq!(format_units(U256::from(7u64), 9), "0.000000007");
		assert_eq!(
			format_units(U256::from(102_000_000_000_000_000_000u128), 18),
			"102"
		);
		assert_eq!(format_units(U256::from(100_000_000_000_000_000u64), 18), "0.1");
		assert_eq!(format_units(U256::from(21_000u64), 0), "21000");
		assert_eq!(format_units(U256::ZERO, 9), "0");
	}
}
