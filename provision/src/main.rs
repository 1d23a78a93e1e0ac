#![allow(clippy::result_large_err)]

use clap::{CommandFactory, error::ErrorKind};
use tracing_subscriber::EnvFilter;
use validator_provision::cli::Cli;

#[tokio::main]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new("validator_provision=info")),
		)
		.with_writer(std::io::stderr)
		.init();

	if let Err(e) = validator_provision::cli::main_entrypoint().await {
		let mut cmd = Cli::command();
		cmd.error(ErrorKind::InvalidValue, e).exit();
	}
}
