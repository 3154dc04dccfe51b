//! Contract-bound transactions.

use crate::assembler::TransactionAssembler;
use crate::AssemblyError;
use alloy_dyn_abi::{DynSolValue, JsonAbiExt};
use alloy_json_abi::{JsonAbi, StateMutability};
use alloy_primitives::Address;
use evm_types::{ResolvedTransaction, TransactionIntent, TransactionOptions};
use std::sync::Arc;

/// Method name that bypasses the ABI lookup.
pub const FALLBACK_METHOD: &str = "fallback";

/// A contract method a transaction is bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractRef {
	pub address: Address,
	pub abi: Arc<JsonAbi>,
	pub method: String,
}

impl ContractRef {
	pub fn new(address: Address, abi: Arc<JsonAbi>, method: impl Into<String>) -> Self {
		Self {
			address,
			abi,
			method: method.into(),
		}
	}

	/// Checks the method exists and can change state.
	///
	/// Overloads count as state changing when any of them is neither `view`
	/// nor `pure`.
	pub fn check_writable(&self) -> Result<(), AssemblyError> {
		if self.method == FALLBACK_METHOD {
			return Ok(());
		}
		let overloads = self.abi.function(&self.method).ok_or_else(|| {
			AssemblyError::Input(format!("Method '{}' not found in contract ABI", self.method))
		})?;
		let writable = overloads.iter().any(|function| {
			!matches!(
				function.state_mutability,
				StateMutability::View | StateMutability::Pure
			)
		});
		if !writable {
			return Err(AssemblyError::Input(format!(
				"Method '{}' is read-only and cannot be sent as a transaction",
				self.method
			)));
		}
		Ok(())
	}
}

/// A transaction calling a contract method, with the contract's default options.
#[derive(Debug, Clone)]
pub struct WriteTransaction {
	pub transaction: TransactionIntent,
	pub contract: ContractRef,
	/// Contract-level defaults, below the draft's own options.
	pub defaults: TransactionOptions,
}

impl WriteTransaction {
	/// Binds an already encoded draft to `contract`.
	///
	/// The draft is addressed to the contract unless it names a recipient.
	pub fn new(contract: ContractRef, mut transaction: TransactionIntent) -> Self {
		if transaction.options.to.is_none() {
			transaction.options.to = Some(contract.address);
		}
		Self {
			transaction,
			contract,
			defaults: TransactionOptions::default(),
		}
	}

	/// Encodes a call of the contract method with `args`.
	///
	/// The first overload whose arity matches `args` is used.
	pub fn encode(contract: ContractRef, args: &[DynSolValue]) -> Result<Self, AssemblyError> {
		let function = contract
			.abi
			.function(&contract.method)
			.and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == args.len()))
			.ok_or_else(|| {
				AssemblyError::Input(format!(
					"Method '{}' taking {} arguments not found in contract ABI",
					contract.method,
					args.len()
				))
			})?;
		let data = function
			.abi_encode_input(args)
			.map_err(|e| AssemblyError::Input(format!("Failed to encode arguments: {}", e)))?;

		Ok(Self::new(
			contract.clone(),
			TransactionIntent::call(contract.address, data),
		))
	}

	pub fn with_defaults(mut self, defaults: TransactionOptions) -> Self {
		self.defaults = defaults;
		self
	}

	/// Validates the method, then assembles with `overlay` as the per-call layer.
	pub async fn assemble(
		&self,
		assembler: &TransactionAssembler,
		overlay: Option<&TransactionOptions>,
	) -> Result<ResolvedTransaction, AssemblyError> {
		Ok(assembler.assemble_write(self, overlay).await?.transaction)
	}
}
