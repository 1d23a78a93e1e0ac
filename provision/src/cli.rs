#[cfg(test)]
mod cli_tests;

mod config_discovery;

use std::net::IpAddr;

use clap::{Args, Parser, Subcommand};
use config_discovery::*;
use tracing::info;

use crate::*;

pub async fn main_entrypoint() -> Result<(), AppError> {
	Cli::parse().execute().await
}

/// Builds the credential sources, the provisioning root and the topology shared by every command.
///
/// The config and the credentials are checked before anything is written.
async fn prepare(
	config: &Config,
	root: &Path,
	args: InputArgs,
) -> Result<(Inputs, Topology), AppError> {
	config.validate()?;

	let credentials = CredentialSources {
		private_key: args.private_key,
		private_key_file: args.private_key_file,
		address: args.address,
	}
	.resolve()?;

	let inputs = prepare_inputs(config, root, credentials, args.public_ip).await?;

	let topology = generate(config, &inputs)?;

	Ok((inputs, topology))
}

fn install_task(task: &ScheduledTask, crontab_file: Option<PathBuf>) -> Result<(), AppError> {
	task.write_script()?;

	if let Some(file) = crontab_file {
		install(&FileStore::new(file), task)
	} else {
		install(&CrontabStore::new(SystemRunner::new()), task)
	}
}

impl Cli {
	pub async fn execute(self) -> Result<(), AppError> {
		let config = get_config_from_cli(self.overrides)?;

		if self.print_config {
			println!("Full parsed config:");
			println!("{config:#?}");
		}

		match self.command {
			Commands::New { output } => {
				let output = output.unwrap_or_else(|| PathBuf::from("provision.yaml"));

				create_parent_dirs(&output)?;

				Config::default().write_to(&output)?;

				info!(path = %output.display(), "wrote a new config file");
			}
			Commands::Generate { out, inputs } => {
				let root = match out {
					Some(out) => out,
					None => config.root()?,
				};

				let (inputs, topology) = prepare(&config, &root, inputs).await?;

				let files = write_stack(&topology, &inputs.root)?;

				let task = ScheduledTask::from_config(&config, &inputs, &topology)?;

				task.write_script()?;

				println!("Compose file:  {}", files.compose.display());
				println!("Scrape config: {}", files.prometheus.display());
				println!("Task script:   {}", task.script_path.display());
			}
			Commands::Schedule {
				inputs,
				crontab_file,
			} => {
				let (inputs, topology) = prepare(&config, &config.root()?, inputs).await?;

				let task = ScheduledTask::from_config(&config, &inputs, &topology)?;

				install_task(&task, crontab_file)?;

				println!("{}", task.registration_line());
			}
			Commands::Up {
				inputs,
				skip_runtime,
				skip_start,
				crontab_file,
			} => {
				let (inputs, topology) = prepare(&config, &config.root()?, inputs).await?;

				let task = ScheduledTask::from_config(&config, &inputs, &topology)?;

				write_stack(&topology, &inputs.root)?;

				let runner = SystemRunner::in_dir(&inputs.root);

				if skip_runtime {
					info!("skipping the container runtime check");
				} else {
					RuntimeInstaller::default().ensure_runtime_present(&runner)?;
				}

				install_task(&task, crontab_file)?;

				if skip_start {
					info!("skipping the stack start");
				} else {
					start_stack(&runner, &inputs.root)?;
				}

				println!("{}", connection_info(&topology, &inputs));
			}
		}

		Ok(())
	}
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
	/// Sets a custom config file. Any file named `provision.{yaml,toml,json}` in the cwd or in `XDG_CONFIG_HOME/provision` will be detected automatically. If no file is found, the default settings are used
	#[arg(short, long, value_name = "FILE", global = true)]
	pub config: Option<PathBuf>,

	/// Ignores any automatically detected config files, uses cli instructions and config file defined with --config.
	#[arg(long, global = true)]
	pub ignore_config: bool,

	/// The directory that holds the generated files and the services' data [default: `$HOME/validator-node`]
	#[arg(long, value_name = "DIR", global = true)]
	pub root: Option<PathBuf>,
}

/// The values the stack is generated from. Anything missing is prompted for when stdin is a terminal.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
	/// The validator's private key.
	#[arg(long, env = "VALIDATOR_PRIVATE_KEY", hide_env_values = true, value_name = "KEY")]
	pub private_key: Option<SecretString>,

	/// Reads the private key from a file.
	#[arg(long, value_name = "FILE")]
	pub private_key_file: Option<PathBuf>,

	/// The validator's address.
	#[arg(long, env = "VALIDATOR_ADDRESS", value_name = "ADDRESS")]
	pub address: Option<String>,

	/// The public IP advertised to peers. Looked up from `ip_lookup_url` when absent.
	#[arg(long, value_name = "IP")]
	pub public_ip: Option<IpAddr>,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "provision")]
#[command(version, about, long_about = None)]
pub struct Cli {
	/// Prints the full parsed config
	#[arg(long, global = true)]
	pub print_config: bool,

	#[command(subcommand)]
	pub command: Commands,

	#[command(flatten)]
	pub overrides: ConfigOverrides,
}

/// The cli commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
	/// Generates a new config file.
	New {
		/// The output file [default: provision.yaml]
		output: Option<PathBuf>,
	},

	/// Provisions the whole stack: files, container runtime, scheduled task and services.
	Up {
		#[command(flatten)]
		inputs: InputArgs,

		/// Does not check for or install the container runtime.
		#[arg(long)]
		skip_runtime: bool,

		/// Does not start the services.
		#[arg(long)]
		skip_start: bool,

		/// Registers the task in this crontab-format file instead of the user's crontab.
		#[arg(long, value_name = "FILE")]
		crontab_file: Option<PathBuf>,
	},

	/// Writes the compose file, the scrape config and the task script, without starting anything.
	Generate {
		/// The output directory. Overrides the root dir.
		#[arg(long, value_name = "DIR")]
		out: Option<PathBuf>,

		#[command(flatten)]
		inputs: InputArgs,
	},

	/// Regenerates the task script and (re)installs the scheduled task.
	Schedule {
		#[command(flatten)]
		inputs: InputArgs,

		/// Registers the task in this crontab-format file instead of the user's crontab.
		#[arg(long, value_name = "FILE")]
		crontab_file: Option<PathBuf>,
	},
}
