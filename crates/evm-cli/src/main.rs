//! Main entry point for `evmctl`.
//!
//! A small command-line front end over the client library: it inspects fee
//! suggestions, assembles or submits value transfers and parses contract
//! events out of a block, using the network and account named in the
//! configuration file.

use alloy_primitives::{Address, U256};
use clap::{Parser, Subcommand};
use evm_config::Config;
use evm_core::Hooks;
use evm_types::BlockNumber;
use std::path::PathBuf;

mod commands;
mod factory_registry;

/// Command-line arguments for evmctl.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print fee suggestions from recent blocks
	Fees,
	/// Assemble a value transfer, and submit it with --send
	Transfer {
		/// Recipient address
		#[arg(long)]
		to: Address,
		/// Amount in wei
		#[arg(long)]
		value: U256,
		/// Use a dynamic-fee envelope instead of the configured type
		#[arg(long)]
		eip1559: bool,
		/// Sign and submit after assembly
		#[arg(long)]
		send: bool,
	},
	/// Parse one event out of a block
	Events {
		/// Path to the contract's JSON ABI
		#[arg(long)]
		abi: PathBuf,
		/// Event name
		#[arg(long)]
		event: String,
		/// Contract address; any emitter when omitted
		#[arg(long)]
		address: Option<Address>,
		/// Block number or tag
		#[arg(long, default_value = "latest")]
		block: BlockNumber,
	},
}

/// Main entry point for evmctl.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the client and runs the requested command
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.client.id);

	let client = factory_registry::build_client_from_config(config, Hooks::new()).await?;

	match args.command {
		Command::Fees => commands::fees(&client).await?,
		Command::Transfer {
			to,
			value,
			eip1559,
			send,
		} => commands::transfer(&client, to, value, eip1559, send).await?,
		Command::Events {
			abi,
			event,
			address,
			block,
		} => commands::events(&client, &abi, &event, address, block).await?,
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_args_default_values() {
		let args = Args::try_parse_from(["evmctl", "fees"]).unwrap();
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
		assert!(matches!(args.command, Command::Fees));
	}

	#[test]
	fn test_transfer_args() {
		let args = Args::try_parse_from([
			"evmctl",
			"--config",
			"client.toml",
			"transfer",
			"--to",
			"0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
			"--value",
			"1000",
			"--eip1559",
		])
		.unwrap();

		match args.command {
			Command::Transfer {
				to,
				value,
				eip1559,
				send,
			} => {
				assert_eq!(
					to,
					"0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
						.parse::<Address>()
						.unwrap()
				);
				assert_eq!(value, U256::from(1000));
				assert!(eip1559);
				assert!(!send);
			},
			other => panic!("unexpected command: {:?}", other),
		}
	}

	#[test]
	fn test_events_args() {
		let args = Args::try_parse_from([
			"evmctl",
			"events",
			"--abi",
			"token.json",
			"--event",
			"Transfer",
			"--block",
			"0x10",
		])
		.unwrap();

		match args.command {
			Command::Events {
				address, block, ..
			} => {
				assert_eq!(address, None);
				assert_eq!(block, BlockNumber::Exact(16));
			},
			other => panic!("unexpected command: {:?}", other),
		}
	}

	#[test]
	fn test_invalid_address_is_rejected() {
		let result = Args::try_parse_from(["evmctl", "transfer", "--to", "0x1234", "--value", "1"]);
		assert!(result.is_err());
	}
}
