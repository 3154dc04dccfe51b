//! Transaction assembly.
//!
//! Assembly merges the option layers, runs the pre-assembly hooks, resolves
//! every policy and runs the post-assembly hooks over the result. The caller's
//! draft is never modified; hooks work on copies.

use crate::contract::{ContractRef, WriteTransaction};
use crate::hooks::{AssembledContext, AssemblyContext, Hooks};
use crate::resolver::PolicyResolver;
use crate::AssemblyError;
use evm_types::{ResolvedTransaction, TransactionIntent, TransactionOptions};
use std::sync::Arc;
use tracing::instrument;

/// Assembles drafts into resolved transactions.
#[derive(Clone)]
pub struct TransactionAssembler {
	resolver: PolicyResolver,
	hooks: Arc<Hooks>,
	/// Library defaults overlaid with the client configuration.
	base: TransactionOptions,
}

impl TransactionAssembler {
	pub fn new(resolver: PolicyResolver, hooks: Arc<Hooks>, config: TransactionOptions) -> Self {
		Self {
			resolver,
			hooks,
			base: TransactionOptions::defaults().merge(Some(&config)),
		}
	}

	pub fn resolver(&self) -> &PolicyResolver {
		&self.resolver
	}

	pub fn hooks(&self) -> &Hooks {
		&self.hooks
	}

	/// The lowest option layers every draft is merged onto.
	pub fn base_options(&self) -> &TransactionOptions {
		&self.base
	}

	/// Assembles a plain draft with `overlay` as the per-call layer.
	#[instrument(skip_all, fields(to = ?intent.options.to))]
	pub async fn assemble(
		&self,
		intent: &TransactionIntent,
		overlay: Option<&TransactionOptions>,
	) -> Result<ResolvedTransaction, AssemblyError> {
		Ok(self
			.assemble_context(intent.clone(), None, None, overlay)
			.await?
			.transaction)
	}

	/// Assembles a contract call after checking the method can be sent.
	#[instrument(
		skip_all,
		fields(contract = %write.contract.address, method = %write.contract.method)
	)]
	pub async fn assemble_write(
		&self,
		write: &WriteTransaction,
		overlay: Option<&TransactionOptions>,
	) -> Result<AssembledContext, AssemblyError> {
		write.contract.check_writable()?;
		self.assemble_context(
			write.transaction.clone(),
			Some(write.contract.clone()),
			Some(&write.defaults),
			overlay,
		)
		.await
	}

	pub(crate) async fn assemble_context(
		&self,
		mut transaction: TransactionIntent,
		contract: Option<ContractRef>,
		contract_defaults: Option<&TransactionOptions>,
		overlay: Option<&TransactionOptions>,
	) -> Result<AssembledContext, AssemblyError> {
		transaction.options = self
			.base
			.merge_all([contract_defaults, Some(&transaction.options)]);

		let context = self
			.hooks
			.pre_assembly
			.run(AssemblyContext {
				transaction,
				contract,
				options: overlay.cloned().unwrap_or_default(),
			})
			.await?;

		let options = context.effective_options();
		let resolved = self
			.resolver
			.resolve(&context.transaction.data, &options)
			.await?;

		let assembled = self
			.hooks
			.post_assembly
			.run(AssembledContext {
				transaction: resolved,
				contract: context.contract,
				options,
			})
			.await?;

		tracing::debug!(
			nonce = assembled.transaction.nonce,
			gas_limit = assembled.transaction.gas_limit,
			tx_type = ?assembled.transaction.tx_type(),
			"Assembled transaction"
		);
		Ok(assembled)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::hooks::{Hook, HookDecision};
	use crate::testing::{mock_client, token_abi, FixedOracle};
	use alloy_primitives::{Address, U256};
	use evm_rpc::implementations::mock::MockTransport;
	use evm_types::{
		FeePerGasPolicy, GasLimitPolicy, GasPricePolicy, NoncePolicy, Pricing, TransactionType,
	};
	use serde_json::json;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn assembler(
		hooks: Hooks,
		config: TransactionOptions,
		oracle: FixedOracle,
	) -> (TransactionAssembler, Arc<MockTransport>) {
		let (client, mock) = mock_client();
		let resolver = PolicyResolver::new(client, Arc::new(oracle));
		(TransactionAssembler::new(resolver, Arc::new(hooks), config), mock)
	}

	fn manual_options() -> TransactionOptions {
		TransactionOptions {
			nonce: Some(NoncePolicy::Exact(5)),
			gas_limit: Some(GasLimitPolicy::Manual(21_000)),
			gas_price: Some(GasPricePolicy::Manual(U256::from(7))),
			..Default::default()
		}
	}

	#[tokio::test]
	async fn test_manual_draft_assembles_without_calls() {
		let (assembler, mock) = assembler(
			Hooks::new(),
			TransactionOptions::default(),
			FixedOracle::default(),
		);
		let intent = TransactionIntent::transfer(Address::repeat_byte(0x01), U256::from(1));

		let tx = assembler.assemble(&intent, Some(&manual_options())).await.unwrap();
		assert_eq!(tx.nonce, 5);
		assert_eq!(tx.gas_limit, 21_000);
		assert_eq!(tx.gas_price(), Some(U256::from(7)));
		assert_eq!(tx.value, U256::from(1));
		assert_eq!(mock.call_count(), 0);
	}

	#[tokio::test]
	async fn test_layers_merge_in_priority_order() {
		let config = TransactionOptions {
			tx_type: Some(TransactionType::Eip1559),
			chain_id: Some(31337),
			max_priority_fee_per_gas: Some(FeePerGasPolicy::Manual(U256::from(1))),
			..Default::default()
		};
		let (assembler, _) = assembler(Hooks::new(), config, FixedOracle::new(&[10], &[], &[]));
		let intent = TransactionIntent::transfer(Address::repeat_byte(0x01), U256::ZERO)
			.with_nonce(NoncePolicy::Exact(0))
			.with_gas_limit(GasLimitPolicy::Manual(21_000))
			.with_max_priority_fee_per_gas(FeePerGasPolicy::Manual(U256::from(2)));
		let overlay = TransactionOptions {
			nonce: Some(NoncePolicy::Exact(9)),
			..Default::default()
		};

		let tx = assembler.assemble(&intent, Some(&overlay)).await.unwrap();
		assert_eq!(tx.chain_id, Some(31337));
		assert_eq!(tx.nonce, 9);
		assert_eq!(
			tx.pricing,
			Pricing::Eip1559 {
				max_fee_per_gas: U256::from(12),
				max_priority_fee_per_gas: U256::from(2),
			}
		);
	}

	#[tokio::test]
	async fn test_pre_assembly_abort_issues_no_calls() {
		let hooks = Hooks::new()
			.with_pre_assembly(Hook::new("deny", |_: AssemblyContext| HookDecision::Abort));
		let (assembler, mock) = assembler(
			hooks,
			TransactionOptions::default(),
			FixedOracle::new(&[], &[], &[1]),
		);
		let intent = TransactionIntent::transfer(Address::repeat_byte(0x01), U256::from(1))
			.with_from(Address::repeat_byte(0xaa));

		let err = assembler.assemble(&intent, None).await.unwrap_err();
		assert!(matches!(
			err,
			AssemblyError::Processing(ref msg) if msg.contains("canceled by middleware")
		));
		assert_eq!(mock.call_count(), 0);
	}

	#[tokio::test]
	async fn test_hooks_can_rewrite_draft_and_result() {
		let hooks = Hooks::new()
			.with_pre_assembly(Hook::new("pin nonce", |mut ctx: AssemblyContext| {
				ctx.options.nonce = Some(NoncePolicy::Exact(42));
				HookDecision::Continue(ctx)
			}))
			.with_post_assembly(Hook::new("pad gas", |mut ctx: AssembledContext| {
				ctx.transaction.gas_limit += 1_000;
				HookDecision::Continue(ctx)
			}));
		let (assembler, mock) = assembler(
			hooks,
			TransactionOptions::default(),
			FixedOracle::default(),
		);
		let options = TransactionOptions {
			nonce: None,
			..manual_options()
		};

		let tx = assembler
			.assemble(&TransactionIntent::new(), Some(&options))
			.await
			.unwrap();
		assert_eq!(tx.nonce, 42);
		assert_eq!(tx.gas_limit, 22_000);
		assert_eq!(mock.call_count(), 0);
	}

	#[tokio::test]
	async fn test_post_assembly_abort_fails_assembly() {
		let hooks = Hooks::new()
			.with_post_assembly(Hook::new("deny", |_: AssembledContext| HookDecision::Abort));
		let (assembler, _) = assembler(
			hooks,
			TransactionOptions::default(),
			FixedOracle::default(),
		);

		let err = assembler
			.assemble(&TransactionIntent::new(), Some(&manual_options()))
			.await
			.unwrap_err();
		assert!(matches!(err, AssemblyError::Processing(_)));
	}

	#[tokio::test]
	async fn test_write_rejects_read_only_method_before_hooks() {
		let invoked = Arc::new(AtomicUsize::new(0));
		let counter = invoked.clone();
		let hooks = Hooks::new().with_pre_assembly(Hook::new("count", move |ctx: AssemblyContext| {
			counter.fetch_add(1, Ordering::SeqCst);
			HookDecision::Continue(ctx)
		}));
		let (assembler, mock) = assembler(
			hooks,
			TransactionOptions::default(),
			FixedOracle::default(),
		);
		let contract = ContractRef::new(Address::repeat_byte(0x10), token_abi(), "balanceOf");
		let write = WriteTransaction::new(contract, TransactionIntent::new());

		let err = write.assemble(&assembler, None).await.unwrap_err();
		assert!(matches!(err, AssemblyError::Input(_)));
		assert_eq!(invoked.load(Ordering::SeqCst), 0);
		assert_eq!(mock.call_count(), 0);
	}

	#[tokio::test]
	async fn test_write_uses_contract_defaults() {
		let (assembler, mock) = assembler(
			Hooks::new(),
			TransactionOptions::default(),
			FixedOracle::new(&[], &[], &[3]),
		);
		mock.on("eth_getTransactionCount", json!("0x4"));
		mock.on("eth_estimateGas", json!("0x7530"));

		let contract = ContractRef::new(Address::repeat_byte(0x10), token_abi(), "transfer");
		let write = WriteTransaction::new(
			contract.clone(),
			TransactionIntent::new().with_from(Address::repeat_byte(0xaa)),
		)
		.with_defaults(TransactionOptions {
			nonce: Some(NoncePolicy::Latest),
			gas_limit: Some(GasLimitPolicy::WithMargin(2.0)),
			..Default::default()
		});

		let assembled = assembler.assemble_write(&write, None).await.unwrap();
		assert_eq!(assembled.contract, Some(contract));
		assert_eq!(assembled.transaction.to, Some(Address::repeat_byte(0x10)));
		assert_eq!(assembled.transaction.nonce, 4);
		assert_eq!(assembled.transaction.gas_limit, 60_000);
		assert_eq!(assembled.transaction.gas_price(), Some(U256::from(3)));

		let count = mock
			.calls()
			.into_iter()
			.find(|c| c.method == "eth_getTransactionCount")
			.unwrap();
		assert_eq!(count.params[1], json!("latest"));
	}
}
