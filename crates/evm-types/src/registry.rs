//! Registry trait for self-registering implementations.
//!
//! Pluggable components (RPC transports, accounts) declare the name used to
//! select them in configuration together with their factory function.

/// Base trait for implementation registries.
///
/// Each implementation module must provide a Registry struct that implements
/// this trait, tying its configuration name to its factory.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// For example "http" for `rpc.implementation = "http"` or "local" for
	/// `account.implementations.local`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
