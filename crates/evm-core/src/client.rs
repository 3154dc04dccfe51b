//! The assembled client: assembly, signing and submission.

use crate::assembler::TransactionAssembler;
use crate::contract::WriteTransaction;
use crate::hooks::AssembledContext;
use crate::AssemblyError;
use alloy_primitives::B256;
use evm_account::AccountService;
use evm_oracle::Oracle;
use evm_rpc::RpcClient;
use evm_types::{ResolvedTransaction, TransactionIntent, TransactionOptions};
use std::sync::Arc;
use tracing::instrument;

/// A transaction accepted by the node.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
	pub hash: B256,
	pub transaction: ResolvedTransaction,
}

/// Client bound to one network.
#[derive(Clone)]
pub struct Web3Client {
	rpc: RpcClient,
	oracle: Oracle,
	assembler: TransactionAssembler,
	account: Option<Arc<AccountService>>,
}

impl Web3Client {
	pub fn new(
		rpc: RpcClient,
		oracle: Oracle,
		assembler: TransactionAssembler,
		account: Option<Arc<AccountService>>,
	) -> Self {
		Self {
			rpc,
			oracle,
			assembler,
			account,
		}
	}

	pub fn rpc(&self) -> &RpcClient {
		&self.rpc
	}

	pub fn oracle(&self) -> &Oracle {
		&self.oracle
	}

	pub fn assembler(&self) -> &TransactionAssembler {
		&self.assembler
	}

	pub fn account(&self) -> Option<&AccountService> {
		self.account.as_deref()
	}

	/// Resolves a draft without signing it.
	pub async fn assemble(
		&self,
		intent: &TransactionIntent,
		overlay: Option<&TransactionOptions>,
	) -> Result<ResolvedTransaction, AssemblyError> {
		self.assembler.assemble(intent, overlay).await
	}

	/// Assembles, signs and submits a draft.
	#[instrument(skip_all, fields(to = ?intent.options.to))]
	pub async fn send(
		&self,
		intent: &TransactionIntent,
		overlay: Option<&TransactionOptions>,
	) -> Result<SubmissionResult, AssemblyError> {
		let account = self.signing_account()?;
		let context = self
			.assembler
			.assemble_context(intent.clone(), None, None, overlay)
			.await?;
		self.submit(account, context).await
	}

	/// Assembles, signs and submits a contract call.
	#[instrument(
		skip_all,
		fields(contract = %write.contract.address, method = %write.contract.method)
	)]
	pub async fn send_write(
		&self,
		write: &WriteTransaction,
		overlay: Option<&TransactionOptions>,
	) -> Result<SubmissionResult, AssemblyError> {
		let account = self.signing_account()?;
		let context = self.assembler.assemble_write(write, overlay).await?;
		self.submit(account, context).await
	}

	fn signing_account(&self) -> Result<&AccountService, AssemblyError> {
		self.account
			.as_deref()
			.ok_or_else(|| AssemblyError::Input("No account configured for signing".to_string()))
	}

	async fn submit(
		&self,
		account: &AccountService,
		context: AssembledContext,
	) -> Result<SubmissionResult, AssemblyError> {
		let hooks = self.assembler.hooks();
		let context = hooks.pre_submission.run(context).await?;

		let raw = account
			.sign(&context.transaction)
			.await
			.map_err(|e| AssemblyError::Signing(e.to_string()))?;
		let hash = self.rpc.send_raw_transaction(raw).await?;

		tracing::info!(
			tx_hash = %evm_types::truncate_id(&hash.to_string()),
			nonce = context.transaction.nonce,
			"Submitted transaction"
		);

		let result = SubmissionResult {
			hash,
			transaction: context.transaction,
		};
		hooks.notify_submitted(&result);
		Ok(result)
	}
}
