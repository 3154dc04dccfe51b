//! Local nonce tracking.
//!
//! Nodes can lag behind a sender that submits several transactions in quick
//! succession, so the `pending` count may hand out a nonce that is already
//! used. The middleware remembers the next nonce of every sender it has seen
//! submit and pins later assemblies to it.

use crate::client::SubmissionResult;
use crate::hooks::{AssemblyContext, Hook, HookDecision, Hooks, SubmissionObserver};
use crate::AssemblyError;
use alloy_primitives::Address;
use evm_rpc::RpcClient;
use evm_types::{BlockNumber, NoncePolicy};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Tracks the next nonce per sender across submissions.
#[derive(Debug, Clone, Default)]
pub struct NonceMiddleware {
	next: Arc<Mutex<HashMap<Address, u64>>>,
}

impl NonceMiddleware {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<Address, u64>> {
		self.next.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Next nonce known for `sender`, if it has submitted before.
	pub fn next_nonce(&self, sender: &Address) -> Option<u64> {
		self.lock().get(sender).copied()
	}

	/// Registers the middleware's hooks on `hooks`.
	pub fn install(&self, hooks: Hooks) -> Hooks {
		hooks
			.with_pre_assembly(self.pre_assembly_hook())
			.with_post_submission(self.observer())
	}

	/// Pins the nonce of known senders unless the call already fixes one.
	pub fn pre_assembly_hook(&self) -> Hook<AssemblyContext> {
		let tracker = self.clone();
		Hook::new("nonce", move |mut context: AssemblyContext| {
			let options = context.effective_options();
			if let (Some(from), Some(policy)) = (options.from, options.nonce) {
				if !matches!(policy, NoncePolicy::Exact(_)) {
					if let Some(next) = tracker.next_nonce(&from) {
						context.options.nonce = Some(NoncePolicy::Exact(next));
					}
				}
			}
			HookDecision::Continue(context)
		})
	}

	/// Records the nonce following every submitted transaction.
	pub fn observer(&self) -> SubmissionObserver {
		let tracker = self.clone();
		Arc::new(move |result: &SubmissionResult| {
			if let Some(from) = result.transaction.from {
				let next = result.transaction.nonce.saturating_add(1);
				let mut known = tracker.lock();
				let entry = known.entry(from).or_insert(next);
				*entry = (*entry).max(next);
			}
		})
	}

	/// Reloads every known sender's nonce from the latest block.
	pub async fn refresh(&self, client: &RpcClient) -> Result<(), AssemblyError> {
		let senders: Vec<Address> = self.lock().keys().copied().collect();
		let counts = futures::future::try_join_all(
			senders
				.iter()
				.map(|sender| client.get_transaction_count(*sender, BlockNumber::Latest)),
		)
		.await?;

		let mut known = self.lock();
		for (sender, count) in senders.into_iter().zip(counts) {
			known.insert(sender, count);
		}
		tracing::debug!(senders = known.len(), "Refreshed tracked nonces");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::mock_client;
	use alloy_primitives::{Bytes, B256, U256};
	use evm_types::{Pricing, ResolvedTransaction, TransactionIntent, TransactionOptions};
	use serde_json::json;

	fn submitted(from: Address, nonce: u64) -> SubmissionResult {
		SubmissionResult {
			hash: B256::ZERO,
			transaction: ResolvedTransaction {
				chain_id: Some(1),
				from: Some(from),
				to: None,
				value: U256::ZERO,
				data: Bytes::new(),
				nonce,
				gas_limit: 21_000,
				pricing: Pricing::Legacy {
					gas_price: U256::from(1),
				},
				access_list: None,
			},
		}
	}

	fn context(from: Address, nonce: NoncePolicy) -> AssemblyContext {
		AssemblyContext {
			transaction: TransactionIntent::new().with_from(from).with_nonce(nonce),
			contract: None,
			options: TransactionOptions::default(),
		}
	}

	#[tokio::test]
	async fn test_pins_nonce_after_submission() {
		let middleware = NonceMiddleware::new();
		let hooks = middleware.install(Hooks::new());
		let sender = Address::repeat_byte(0xaa);

		// Unknown sender: untouched
		let untouched = hooks
			.pre_assembly
			.run(context(sender, NoncePolicy::Pending))
			.await
			.unwrap();
		assert_eq!(untouched.effective_options().nonce, Some(NoncePolicy::Pending));

		hooks.notify_submitted(&submitted(sender, 7));
		hooks.notify_submitted(&submitted(sender, 3));
		assert_eq!(middleware.next_nonce(&sender), Some(8));

		let pinned = hooks
			.pre_assembly
			.run(context(sender, NoncePolicy::Pending))
			.await
			.unwrap();
		assert_eq!(pinned.effective_options().nonce, Some(NoncePolicy::Exact(8)));

		// An exact nonce chosen by the caller wins
		let explicit = hooks
			.pre_assembly
			.run(context(sender, NoncePolicy::Exact(2)))
			.await
			.unwrap();
		assert_eq!(explicit.effective_options().nonce, Some(NoncePolicy::Exact(2)));
	}

	#[tokio::test]
	async fn test_refresh_reloads_known_senders() {
		let middleware = NonceMiddleware::new();
		let (client, mock) = mock_client();
		mock.on("eth_getTransactionCount", json!("0x14"));

		// Nothing tracked: no calls
		middleware.refresh(&client).await.unwrap();
		assert_eq!(mock.call_count(), 0);

		let observer = middleware.observer();
		observer(&submitted(Address::repeat_byte(0x01), 30));
		observer(&submitted(Address::repeat_byte(0x02), 1));

		middleware.refresh(&client).await.unwrap();
		assert_eq!(mock.calls_to("eth_getTransactionCount"), 2);
		assert_eq!(middleware.next_nonce(&Address::repeat_byte(0x01)), Some(20));
		assert_eq!(middleware.next_nonce(&Address::repeat_byte(0x02)), Some(20));
	}
}
