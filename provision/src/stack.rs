use std::net::IpAddr;

use tracing::info;

use crate::{
	topology::{GRAFANA, GRAFANA_PORT, PROMETHEUS, PROMETHEUS_CONFIG_FILE, PROMETHEUS_PORT, SEQUENCER},
	*,
};

/// The file name of the compose file inside the provisioning root.
pub const COMPOSE_FILE: &str = "compose.yaml";

/// Resolves the public IP, creates the provisioning root and makes sure the shared secret exists.
///
/// Nothing is written before the IP is known.
pub async fn prepare_inputs(
	config: &Config,
	root: &Path,
	credentials: Credentials,
	public_ip: Option<IpAddr>,
) -> Result<Inputs, AppError> {
	let public_ip = match public_ip {
		Some(ip) => ip,
		None => discover_public_ip(&config.ip_lookup_url).await?,
	};

	info!(%public_ip, "using the public IP");

	create_all_dirs(root)?;

	let root = get_abs_path(root)?;
	let secret_path = root.join(SECRET_FILE);

	ensure_shared_secret(&secret_path)?;

	Ok(Inputs {
		credentials,
		public_ip,
		root,
		secret_path,
	})
}

/// The documents written by [`write_stack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFiles {
	pub compose: PathBuf,
	pub prometheus: PathBuf,
}

/// Writes the compose file and the scrape config into `root`, then creates the missing data directories.
pub fn write_stack(topology: &Topology, root: &Path) -> Result<StackFiles, AppError> {
	create_all_dirs(root)?;

	let compose = root.join(COMPOSE_FILE);
	let content = serde_yaml_ng::to_string(&topology.to_compose()).map_err(|e| {
		AppError::SerializationError {
			file: compose.clone(),
			error: e.to_string(),
		}
	})?;

	// The sequencer's environment holds the private key
	write_file_with_mode(&compose, &content, Some(0o600))?;

	let prometheus = root.join(PROMETHEUS_CONFIG_FILE);

	serialize_yaml(&topology.to_prometheus(), &prometheus)?;

	topology.prepare_host_dirs(root)?;

	info!(root = %root.display(), "wrote the stack configuration");

	Ok(StackFiles {
		compose,
		prometheus,
	})
}

fn compose_args<'a>(root: &'a str, compose: &'a str) -> Vec<&'a str> {
	vec!["compose", "--project-directory", root, "-f", compose]
}

/// Starts every service in the background. Services that are already up to date are left running.
pub fn start_stack(runner: &impl CommandRunner, root: &Path) -> Result<(), AppError> {
	let root_str = root.to_string_lossy();
	let compose = root.join(COMPOSE_FILE);
	let compose_str = compose.to_string_lossy();

	let mut args = compose_args(&root_str, &compose_str);
	args.extend(["up", "-d"]);

	info!("starting the stack");

	runner.run("docker", &args)
}

fn host_port(topology: &Topology, service: &str, container_port: u16) -> Option<u16> {
	topology
		.get(service)?
		.ports
		.iter()
		.find(|p| p.container_port == container_port)
		.map(|p| p.host_port)
}

/// The text printed once the stack is up.
pub fn connection_info(topology: &Topology, inputs: &Inputs) -> String {
	let host = inputs.public_ip;
	let root = inputs.root.to_string_lossy();

	let mut lines = Vec::new();

	if let Some(port) = host_port(topology, GRAFANA, GRAFANA_PORT) {
		lines.push(format!("Grafana:    http://{host}:{port}"));
	}

	if let Some(port) = host_port(topology, PROMETHEUS, PROMETHEUS_PORT) {
		lines.push(format!("Prometheus: http://{host}:{port}"));
	}

	let compose = inputs.root.join(COMPOSE_FILE);

	lines.push(format!(
		"Follow the sequencer logs with: docker {} logs -f {SEQUENCER}",
		compose_args(&root, &compose.to_string_lossy())
			.iter()
			.map(|arg| shell_quote(arg))
			.collect::<Vec<_>>()
			.join(" ")
	));

	lines.join("\n")
}
