//! Private key material loaded from configuration.
//!
//! The buffer is zeroed on drop and never shows up in `Debug` or serialized
//! output, so a `Config` can be logged without leaking signing keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "***REDACTED***";

/// A string that zeroes its memory on drop and never prints its contents.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	/// Lends the secret to `f`, keeping the exposure scoped to one call.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString({})", REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self(Zeroizing::new(s))
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::from(s.to_string())
	}
}

impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		String::deserialize(deserializer).map(SecretString::from)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	#[test]
	fn test_private_key_is_redacted() {
		let secret = SecretString::from(ANVIL_KEY);
		assert_eq!(format!("{:?}", secret), "SecretString(***REDACTED***)");
		assert_eq!(
			serde_json::to_string(&secret).unwrap(),
			"\"***REDACTED***\""
		);
	}

	#[test]
	fn test_deserialized_key_is_exposed_on_demand() {
		#[derive(Deserialize)]
		struct Account {
			private_key: SecretString,
		}

		let account: Account =
			toml::from_str(&format!("private_key = \"{}\"", ANVIL_KEY)).unwrap();
		assert!(account.private_key.with_exposed(|key| key == ANVIL_KEY));
		assert_eq!(account.private_key, SecretString::from(ANVIL_KEY));
		assert_ne!(account.private_key, SecretString::from("0x01"));
	}
}
