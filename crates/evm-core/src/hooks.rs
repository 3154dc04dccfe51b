//! Middleware hooks around assembly and submission.
//!
//! A hook is a synchronous transform over a stage context. It may mutate the
//! context and either let the pipeline continue or abort it. Hooks of a stage
//! run one after another in registration order, each seeing the output of the
//! previous one. A hook bound to a runtime handle is dispatched onto that
//! runtime's blocking pool; otherwise it runs inline on the calling task.

use crate::client::SubmissionResult;
use crate::contract::ContractRef;
use crate::AssemblyError;
use evm_types::{ResolvedTransaction, TransactionIntent, TransactionOptions};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Message carried by the error of an aborted pipeline.
pub const CANCELED_BY_MIDDLEWARE: &str = "Transaction is canceled by middleware";

/// Outcome of a hook invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum HookDecision<C> {
	/// Continue with the (possibly modified) context.
	Continue(C),
	/// Stop the pipeline.
	Abort,
}

/// State seen by pre-assembly hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyContext {
	/// The draft, whose options already hold every layer below the call overlay.
	pub transaction: TransactionIntent,
	/// Contract the draft calls, for contract-bound assembly.
	pub contract: Option<ContractRef>,
	/// Per-call overlay, the highest priority layer.
	pub options: TransactionOptions,
}

impl AssemblyContext {
	/// Options the resolver will act on.
	pub fn effective_options(&self) -> TransactionOptions {
		self.transaction.options.merge(Some(&self.options))
	}
}

/// State seen by post-assembly and pre-submission hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
	pub transaction: ResolvedTransaction,
	pub contract: Option<ContractRef>,
	/// Options the transaction was resolved from.
	pub options: TransactionOptions,
}

type Transform<C> = dyn Fn(C) -> HookDecision<C> + Send + Sync;

/// A named transform, optionally bound to a runtime.
pub struct Hook<C> {
	name: String,
	handle: Option<Handle>,
	transform: Arc<Transform<C>>,
}

impl<C> Clone for Hook<C> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			handle: self.handle.clone(),
			transform: self.transform.clone(),
		}
	}
}

impl<C> fmt::Debug for Hook<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Hook")
			.field("name", &self.name)
			.field("dispatched", &self.handle.is_some())
			.finish()
	}
}

impl<C: Send + 'static> Hook<C> {
	pub fn new<F>(name: impl Into<String>, transform: F) -> Self
	where
		F: Fn(C) -> HookDecision<C> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			handle: None,
			transform: Arc::new(transform),
		}
	}

	/// Dispatches every invocation onto `handle`.
	pub fn on(mut self, handle: Handle) -> Self {
		self.handle = Some(handle);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	async fn invoke(&self, context: C) -> Result<HookDecision<C>, AssemblyError> {
		let Some(handle) = &self.handle else {
			return Ok((self.transform)(context));
		};
		let transform = self.transform.clone();
		handle
			.spawn_blocking(move || transform(context))
			.await
			.map_err(|e| AssemblyError::Processing(format!("Hook '{}' failed: {}", self.name, e)))
	}
}

/// Ordered hooks of one stage.
pub struct HookChain<C> {
	stage: &'static str,
	hooks: Vec<Hook<C>>,
}

impl<C> Clone for HookChain<C> {
	fn clone(&self) -> Self {
		Self {
			stage: self.stage,
			hooks: self.hooks.clone(),
		}
	}
}

impl<C> fmt::Debug for HookChain<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HookChain")
			.field("stage", &self.stage)
			.field("hooks", &self.hooks)
			.finish()
	}
}

impl<C: Send + 'static> HookChain<C> {
	pub fn new(stage: &'static str) -> Self {
		Self {
			stage,
			hooks: Vec::new(),
		}
	}

	pub fn push(&mut self, hook: Hook<C>) {
		self.hooks.push(hook);
	}

	pub fn len(&self) -> usize {
		self.hooks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.hooks.is_empty()
	}

	/// Runs every hook in order, threading the context through.
	///
	/// The first abort stops the chain; later hooks are not invoked.
	pub async fn run(&self, mut context: C) -> Result<C, AssemblyError> {
		for hook in &self.hooks {
			match hook.invoke(context).await? {
				HookDecision::Continue(next) => context = next,
				HookDecision::Abort => {
					tracing::info!(
						stage = self.stage,
						hook = %hook.name,
						"Hook aborted the pipeline"
					);
					return Err(AssemblyError::Processing(CANCELED_BY_MIDDLEWARE.to_string()));
				},
			}
		}
		Ok(context)
	}
}

/// Observer notified after a transaction was accepted by the node.
pub type SubmissionObserver = Arc<dyn Fn(&SubmissionResult) + Send + Sync>;

/// Every hook registered on a client.
///
/// Hooks are fixed once the client is built.
#[derive(Clone)]
pub struct Hooks {
	pub pre_assembly: HookChain<AssemblyContext>,
	pub post_assembly: HookChain<AssembledContext>,
	pub pre_submission: HookChain<AssembledContext>,
	pub post_submission: Vec<SubmissionObserver>,
}

impl Default for Hooks {
	fn default() -> Self {
		Self {
			pre_assembly: HookChain::new("pre_assembly"),
			post_assembly: HookChain::new("post_assembly"),
			pre_submission: HookChain::new("pre_submission"),
			post_submission: Vec::new(),
		}
	}
}

impl Hooks {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_pre_assembly(mut self, hook: Hook<AssemblyContext>) -> Self {
		self.pre_assembly.push(hook);
		self
	}

	pub fn with_post_assembly(mut self, hook: Hook<AssembledContext>) -> Self {
		self.post_assembly.push(hook);
		self
	}

	pub fn with_pre_submission(mut self, hook: Hook<AssembledContext>) -> Self {
		self.pre_submission.push(hook);
		self
	}

	pub fn with_post_submission(mut self, observer: SubmissionObserver) -> Self {
		self.post_submission.push(observer);
		self
	}

	pub(crate) fn notify_submitted(&self, result: &SubmissionResult) {
		for observer in &self.post_submission {
			observer(result);
		}
	}
}

impl fmt::Debug for Hooks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Hooks")
			.field("pre_assembly", &self.pre_assembly)
			.field("post_assembly", &self.post_assembly)
			.field("pre_submission", &self.pre_submission)
			.field("post_submission", &self.post_submission.len())
			.finish()
	}
}
