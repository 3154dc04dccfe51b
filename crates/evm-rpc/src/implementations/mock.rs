//! Scripted in-memory transport for tests.
//!
//! Answers requests by method name and records every request it receives, so
//! tests can assert exactly which node calls an operation issued. Single
//! requests to a held method are recorded on arrival but only answered once
//! the transport is released, which lets tests observe what is in flight.

use crate::{JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse, RpcError, RpcTransport};
use async_trait::async_trait;
use evm_types::{ConfigSchema, Schema, ValidationError};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

type Handler = Box<dyn Fn(&Value) -> Result<Value, JsonRpcErrorObject> + Send + Sync>;

/// Transport answering from registered handlers.
///
/// Methods without a handler answer with JSON-RPC error -32601.
pub struct MockTransport {
	handlers: Mutex<HashMap<String, Handler>>,
	calls: Mutex<Vec<JsonRpcRequest>>,
	reverse_batches: Mutex<bool>,
	batch_id_offset: Mutex<u64>,
	held: Mutex<HashSet<String>>,
	released: watch::Sender<bool>,
}

impl Default for MockTransport {
	fn default() -> Self {
		Self {
			handlers: Mutex::default(),
			calls: Mutex::default(),
			reverse_batches: Mutex::default(),
			batch_id_offset: Mutex::default(),
			held: Mutex::default(),
			released: watch::Sender::new(false),
		}
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Answers `method` with a fixed result.
	pub fn on(&self, method: &str, result: Value) -> &Self {
		self.on_with(method, move |_| Ok(result.clone()))
	}

	/// Answers `method` with a JSON-RPC error.
	pub fn on_error(&self, method: &str, code: i64, message: &str) -> &Self {
		let error = JsonRpcErrorObject {
			code,
			message: message.to_string(),
			data: None,
		};
		self.on_with(method, move |_| Err(error.clone()))
	}

	/// Answers `method` with a result computed from the request params.
	pub fn on_with<F>(&self, method: &str, handler: F) -> &Self
	where
		F: Fn(&Value) -> Result<Value, JsonRpcErrorObject> + Send + Sync + 'static,
	{
		lock(&self.handlers).insert(method.to_string(), Box::new(handler));
		self
	}

	/// Keeps single requests to `method` unanswered until [`Self::release`].
	pub fn hold(&self, method: &str) -> &Self {
		lock(&self.held).insert(method.to_string());
		self
	}

	/// Answers every held request, now and from here on.
	pub fn release(&self) {
		self.released.send_replace(true);
	}

	/// Returns batch responses in reverse order.
	pub fn set_reverse_batches(&self, reverse: bool) {
		*lock(&self.reverse_batches) = reverse;
	}

	/// Shifts the ids of batch responses, producing uncorrelatable replies.
	pub fn set_batch_id_offset(&self, offset: u64) {
		*lock(&self.batch_id_offset) = offset;
	}

	/// Every request received so far, in arrival order.
	pub fn calls(&self) -> Vec<JsonRpcRequest> {
		lock(&self.calls).clone()
	}

	pub fn call_count(&self) -> usize {
		lock(&self.calls).len()
	}

	/// Number of requests received for `method`.
	pub fn calls_to(&self, method: &str) -> usize {
		lock(&self.calls)
			.iter()
			.filter(|call| call.method == method)
			.count()
	}

	fn answer(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
		lock(&self.calls).push(request.clone());
		self.respond(request)
	}

	fn respond(&self, request: &JsonRpcRequest) -> JsonRpcResponse {
		let handlers = lock(&self.handlers);
		let outcome = match handlers.get(&request.method) {
			Some(handler) => handler(&request.params),
			None => Err(JsonRpcErrorObject {
				code: -32601,
				message: format!("method {} not found", request.method),
				data: None,
			}),
		};

		match outcome {
			Ok(result) => JsonRpcResponse::success(request.id, result),
			Err(error) => JsonRpcResponse::failure(request.id, error),
		}
	}
}

struct MockSchema;

impl ConfigSchema for MockSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

#[async_trait]
impl RpcTransport for MockTransport {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockSchema)
	}

	async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, RpcError> {
		if !lock(&self.held).contains(&request.method) {
			return Ok(self.answer(&request));
		}
		lock(&self.calls).push(request.clone());
		let mut released = self.released.subscribe();
		while !*released.borrow_and_update() {
			released
				.changed()
				.await
				.map_err(|e| RpcError::Connection(e.to_string()))?;
		}
		Ok(self.respond(&request))
	}

	async fn send_batch(
		&self,
		requests: Vec<JsonRpcRequest>,
	) -> Result<Vec<JsonRpcResponse>, RpcError> {
		let offset = *lock(&self.batch_id_offset);
		let mut responses: Vec<JsonRpcResponse> = requests
			.iter()
			.map(|request| {
				let mut response = self.answer(request);
				response.id = response.id.map(|id| id + offset);
				response
			})
			.collect();

		if *lock(&self.reverse_batches) {
			responses.reverse();
		}
		Ok(responses)
	}
}
