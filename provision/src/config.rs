use crate::{topology::SERVICE_NAMES, *};

mod config_setup;
pub(crate) use config_setup::extract_config_from_file;

/// The global configuration struct.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct Config {
	#[serde(skip)]
	pub(crate) config_file: Option<PathBuf>,

	/// The directory that holds every generated file and the services' data [default: `$HOME/validator-node`].
	pub root_dir: Option<PathBuf>,

	/// The project name used by Docker Compose.
	pub project_name: String,

	/// The name of the L1 network followed by the execution and consensus clients.
	pub l1_network: String,

	/// The network joined by the sequencer node.
	pub sequencer_network: String,

	/// The checkpoint sync endpoint used by the consensus client.
	pub checkpoint_sync_url: String,

	/// The images used for each service.
	pub images: Images,

	/// Overrides for published host ports, as `service -> container port -> host port`.
	pub port_overrides: IndexMap<String, IndexMap<u16, u16>>,

	/// How often Prometheus scrapes its targets.
	pub scrape_interval: String,

	/// The endpoint queried to discover this host's public IP. It must answer with the bare address.
	pub ip_lookup_url: String,

	/// The log level passed to the sequencer node.
	pub log_level: String,

	/// Settings for the scheduled task.
	pub task: TaskConfig,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			config_file: None,
			root_dir: None,
			project_name: "validator".to_string(),
			l1_network: "sepolia".to_string(),
			sequencer_network: "alpha-testnet".to_string(),
			checkpoint_sync_url: "https://checkpoint-sync.sepolia.ethpandaops.io".to_string(),
			images: Images::default(),
			port_overrides: IndexMap::new(),
			scrape_interval: "15s".to_string(),
			ip_lookup_url: "https://api.ipify.org".to_string(),
			log_level: "info".to_string(),
			task: TaskConfig::default(),
		}
	}
}

impl Config {
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolves the provisioning root, falling back to `$HOME/validator-node`.
	pub fn root(&self) -> Result<PathBuf, AppError> {
		if let Some(root) = &self.root_dir {
			return Ok(root.clone());
		}

		env::home_dir()
			.map(|home| home.join("validator-node"))
			.context("Could not determine the home directory. Set `root_dir` explicitly")
			.map_err(AppError::from)
	}

	/// Checks everything that can be checked before the provisioning root is touched.
	pub fn validate(&self) -> Result<(), AppError> {
		self.task.validate()?;

		for (service, ports) in &self.port_overrides {
			for (&container_port, &host_port) in ports {
				check_override(service, container_port, host_port)?;
			}
		}

		Ok(())
	}
}

pub(crate) fn check_override(
	service: &str,
	container_port: u16,
	host_port: u16,
) -> Result<(), AppError> {
	let reason = if !SERVICE_NAMES.contains(&service) {
		"no such service"
	} else if host_port == 0 {
		"host port 0 lets the runtime pick a random port"
	} else {
		return Ok(());
	};

	Err(AppError::UnknownOverride {
		service: service.to_string(),
		container_port,
		reason: reason.to_string(),
	})
}

/// The container images for each service.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct Images {
	pub execution: String,
	pub consensus: String,
	pub sequencer: String,
	pub prometheus: String,
	pub grafana: String,
}

impl Default for Images {
	fn default() -> Self {
		Self {
			execution: "ethereum/client-go:v1.15.11".to_string(),
			consensus: "sigp/lighthouse:v7.0.1".to_string(),
			sequencer: "aztecprotocol/aztec:latest".to_string(),
			prometheus: "prom/prometheus:v2.53.0".to_string(),
			grafana: "grafana/grafana:11.1.0".to_string(),
		}
	}
}

/// Settings for the recurring task.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
	/// The name of the generated task script. It is also the token used to find previous registrations.
	pub identity: String,

	/// A five-field cron expression.
	pub schedule: String,

	/// The service the task is executed in.
	pub service: String,

	/// The arguments executed inside the service. `{private_key}`, `{address}`, `{public_ip}`, `{sequencer_network}` and `{service}` are replaced in each argument.
	pub args: Vec<String>,

	/// The name of the log file, relative to the root dir.
	pub log_file: String,
}

impl TaskConfig {
	pub fn validate(&self) -> Result<(), AppError> {
		validate_schedule(&self.schedule)?;

		if self.identity.trim().is_empty()
			|| self
				.identity
				.contains(|c: char| c == '/' || c.is_whitespace())
		{
			return Err(AppError::InvalidInput {
				name: "task.identity",
				reason: "expected a plain file name".to_string(),
			});
		}

		if !SERVICE_NAMES.contains(&self.service.as_str()) {
			return Err(AppError::InvalidInput {
				name: "task.service",
				reason: format!("`{}` is not a service of the stack", self.service),
			});
		}

		if self.args.is_empty() {
			return Err(AppError::MissingInput("task.args"));
		}

		Ok(())
	}
}

impl Default for TaskConfig {
	fn default() -> Self {
		Self {
			identity: "validator_cron.sh".to_string(),
			schedule: "0 * * * *".to_string(),
			service: "sequencer".to_string(),
			args: [
				"node",
				"/usr/src/yarn-project/aztec/dest/bin/index.js",
				"add-l1-validator",
				"--l1-rpc-urls",
				"http://execution:8545",
				"--network",
				"{sequencer_network}",
				"--private-key",
				"{private_key}",
				"--attester",
				"{address}",
				"--proposer-eoa",
				"{address}",
			]
			.into_iter()
			.map(String::from)
			.collect(),
			log_file: "validator_cron.log".to_string(),
		}
	}
}
