//! HTTP transport backed by reqwest.
//!
//! Requests are POSTed as JSON to the network's RPC URL. The per-request
//! timeout lives here; nothing above the transport imposes one.

use crate::{JsonRpcRequest, JsonRpcResponse, RpcError, RpcTransport};
use async_trait::async_trait;
use evm_types::{ConfigSchema, Field, FieldType, NetworkConfig, Schema, ValidationError};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Timeout applied when the configuration does not set one.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// JSON-RPC over HTTP(S).
pub struct HttpTransport {
	client: reqwest::Client,
	url: String,
}

impl HttpTransport {
	/// Creates a transport for `url` with the given request timeout.
	pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| RpcError::Connection(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			url: url.into(),
		})
	}

	async fn post<B, R>(&self, body: &B) -> Result<R, RpcError>
	where
		B: serde::Serialize + ?Sized,
		R: DeserializeOwned,
	{
		let response = self
			.client
			.post(&self.url)
			.json(body)
			.send()
			.await
			.map_err(|e| RpcError::Connection(e.to_string()))?;

		let status = response.status();
		let text = response
			.text()
			.await
			.map_err(|e| RpcError::Connection(e.to_string()))?;

		// Nodes often send JSON-RPC error bodies with non-2xx statuses
		match serde_json::from_str::<R>(&text) {
			Ok(parsed) => Ok(parsed),
			Err(_) if !status.is_success() => Err(RpcError::Connection(format!(
				"HTTP {} from {}",
				status, self.url
			))),
			Err(e) => Err(RpcError::Decode(format!("Invalid JSON-RPC response: {}", e))),
		}
	}
}

/// Configuration schema for the HTTP transport.
///
/// The transport reads the `[rpc]` table; `rpc_url` overrides the network's URL.
pub struct HttpTransportSchema;

impl HttpTransportSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for HttpTransportSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("implementation", FieldType::String),
				Field::new("rpc_url", FieldType::Url),
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(600),
					},
				),
			],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl RpcTransport for HttpTransport {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpTransportSchema)
	}

	async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, RpcError> {
		self.post(&request).await
	}

	async fn send_batch(
		&self,
		requests: Vec<JsonRpcRequest>,
	) -> Result<Vec<JsonRpcResponse>, RpcError> {
		self.post(&requests).await
	}
}

/// Factory function to create an HTTP transport from configuration.
///
/// Configuration parameters:
/// - `rpc_url`: optional override of the network's RPC URL
/// - `timeout_seconds`: request timeout, 1 to 600 (default: 30)
pub fn create_http_transport(
	config: &toml::Value,
	network: &NetworkConfig,
) -> Result<Box<dyn RpcTransport>, RpcError> {
	HttpTransportSchema::validate_config(config)
		.map_err(|e| RpcError::Connection(format!("Invalid configuration: {}", e)))?;

	let url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.unwrap_or(&network.rpc_url);

	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|secs| secs as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

	tracing::debug!(url = %url, timeout_seconds = timeout, "Creating HTTP transport");
	Ok(Box::new(HttpTransport::new(
		url,
		Duration::from_secs(timeout),
	)?))
}

/// Registry for the HTTP transport implementation.
pub struct Registry;

impl evm_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = crate::RpcFactory;

	fn factory() -> Self::Factory {
		create_http_transport
	}
}

impl crate::RpcRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	fn network() -> NetworkConfig {
		NetworkConfig {
			rpc_url: "http://localhost:8545".to_string(),
			name: None,
		}
	}

	#[test]
	fn test_schema_accepts_rpc_table() {
		let config: toml::Value = toml::from_str(
			r#"
			implementation = "http"
			timeout_seconds = 10
			"#,
		)
		.unwrap();
		assert!(HttpTransportSchema::validate_config(&config).is_ok());
	}

	#[test]
	fn test_factory_rejects_invalid_timeout() {
		let config: toml::Value = toml::from_str("timeout_seconds = 0").unwrap();
		let result = create_http_transport(&config, &network());
		assert!(matches!(result, Err(RpcError::Connection(_))));
	}

	#[test]
	fn test_factory_rejects_non_http_override() {
		let config: toml::Value = toml::from_str(r#"rpc_url = "ws://localhost:8546""#).unwrap();
		assert!(create_http_transport(&config, &network()).is_err());
	}

	#[tokio::test]
	async fn test_unreachable_node_is_connection_error() {
		// Port 9 (discard) is not expected to run an RPC server
		let transport = HttpTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
		let result = transport
			.send(JsonRpcRequest::new(1, "eth_chainId", serde_json::json!([])))
			.await;
		assert!(matches!(result, Err(RpcError::Connection(_))));
	}
}
