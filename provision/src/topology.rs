use std::{
	collections::{BTreeMap, BTreeSet, HashMap},
	fmt,
	path::Component,
};

use docker_compose_config::Protocol;
use tracing::{debug, info};

use crate::*;

mod compose;
mod services;

pub(crate) use services::{
	GRAFANA, GRAFANA_PORT, PROMETHEUS, PROMETHEUS_CONFIG_FILE, PROMETHEUS_PORT, SEQUENCER,
	SERVICE_NAMES,
};


/// Governs how the container runtime recovers a crashed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
	Never,
	UnlessStopped,
	Always,
}

/// A published port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
	pub host_port: u16,
	pub container_port: u16,
	pub protocol: Protocol,
}

impl PortBinding {
	pub fn tcp(port: u16) -> Self {
		Self {
			host_port: port,
			container_port: port,
			protocol: Protocol::Tcp,
		}
	}

	pub fn udp(port: u16) -> Self {
		Self {
			host_port: port,
			container_port: port,
			protocol: Protocol::Udp,
		}
	}
}

pub(crate) fn protocol_name(protocol: &Protocol) -> &'static str {
	match protocol {
		Protocol::Tcp => "tcp",
		Protocol::Udp => "udp",
	}
}

/// Whether a bound host path is a directory owned by the service or a generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
	/// Created if absent before the first start. Existing contents are preserved.
	Directory,
	/// Generated by the provisioner before the services start.
	File,
}

/// A bind mount. `host_path` is relative to the provisioning root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBinding {
	pub host_path: PathBuf,
	pub container_path: String,
	pub kind: VolumeKind,
	pub read_only: bool,
}

impl VolumeBinding {
	pub fn dir(host_path: impl Into<PathBuf>, container_path: &str) -> Self {
		Self {
			host_path: host_path.into(),
			container_path: container_path.to_string(),
			kind: VolumeKind::Directory,
			read_only: false,
		}
	}

	pub fn read_only_file(host_path: impl Into<PathBuf>, container_path: &str) -> Self {
		Self {
			host_path: host_path.into(),
			container_path: container_path.to_string(),
			kind: VolumeKind::File,
			read_only: true,
		}
	}
}

/// An endpoint exposing Prometheus metrics inside the topology's network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsEndpoint {
	pub port: u16,
	pub path: Option<String>,
}

/// One managed service.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceSpec {
	pub name: String,
	pub image: String,
	pub entrypoint: Vec<String>,
	pub command: Vec<String>,
	pub env: BTreeMap<String, String>,
	pub user: Option<String>,
	pub ports: Vec<PortBinding>,
	pub volumes: Vec<VolumeBinding>,
	pub depends_on: BTreeSet<String>,
	pub restart_policy: RestartPolicy,
	pub metrics: Option<MetricsEndpoint>,
}

// The environment and the invocation may carry credentials
impl fmt::Debug for ServiceSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ServiceSpec")
			.field("name", &self.name)
			.field("image", &self.image)
			.field("env", &self.env.keys().collect::<Vec<_>>())
			.field("ports", &self.ports)
			.field("volumes", &self.volumes)
			.field("depends_on", &self.depends_on)
			.field("restart_policy", &self.restart_policy)
			.finish_non_exhaustive()
	}
}

impl ServiceSpec {
	pub(crate) fn new(name: &str, image: &str) -> Self {
		Self {
			name: name.to_string(),
			image: image.to_string(),
			entrypoint: Vec::new(),
			command: Vec::new(),
			env: BTreeMap::new(),
			user: None,
			ports: Vec::new(),
			volumes: Vec::new(),
			depends_on: BTreeSet::new(),
			restart_policy: RestartPolicy::UnlessStopped,
			metrics: None,
		}
	}
}

/// A single scrape job of the metrics-scraper description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
	pub job_name: String,
	pub target: String,
	pub metrics_path: Option<String>,
}

/// The complete description of the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
	pub project_name: String,
	pub network: String,
	pub services: BTreeMap<String, ServiceSpec>,
	pub scrape_interval: String,
	pub scrape_targets: Vec<ScrapeTarget>,
}

/// Builds the topology from the config and the collected inputs.
///
/// Pure apart from checking that the shared secret was already generated.
pub fn generate(config: &Config, inputs: &Inputs) -> Result<Topology, AppError> {
	if !inputs.secret_path.is_file() {
		return Err(AppError::InvalidSecret {
			path: inputs.secret_path.clone(),
			reason: "the file does not exist yet. It must be generated before the topology".to_string(),
		});
	}

	let secret_mount = inputs
		.secret_path
		.strip_prefix(&inputs.root)
		.map(Path::to_path_buf)
		.map_err(|_| AppError::InvalidInput {
			name: "secret_path",
			reason: format!(
				"`{}` is outside of the provisioning root `{}`",
				inputs.secret_path.display(),
				inputs.root.display()
			),
		})?;

	let mut services = BTreeMap::new();

	for service in services::catalog(config, inputs, &secret_mount) {
		services.insert(service.name.clone(), service);
	}

	let mut topology = Topology {
		project_name: config.project_name.clone(),
		network: config.project_name.clone(),
		services,
		scrape_interval: config.scrape_interval.clone(),
		scrape_targets: Vec::new(),
	};

	topology.apply_port_overrides(&config.port_overrides)?;
	topology.validate()?;

	topology.scrape_targets = topology
		.services
		.values()
		.filter_map(|service| {
			service.metrics.as_ref().map(|metrics| ScrapeTarget {
				job_name: service.name.clone(),
				target: format!("{}:{}", service.name, metrics.port),
				metrics_path: metrics.path.clone(),
			})
		})
		.collect();

	info!(
		services = topology.services.len(),
		scrape_jobs = topology.scrape_targets.len(),
		"generated the topology"
	);

	Ok(topology)
}

impl Topology {
	/// Replaces published host ports. Overrides never renumber silently: a resulting collision fails validation.
	pub fn apply_port_overrides(
		&mut self,
		overrides: &IndexMap<String, IndexMap<u16, u16>>,
	) -> Result<(), AppError> {
		for (service_name, ports) in overrides {
			let service =
				self.services
					.get_mut(service_name)
					.ok_or_else(|| AppError::UnknownOverride {
						service: service_name.clone(),
						container_port: ports.keys().next().copied().unwrap_or_default(),
						reason: "no such service".to_string(),
					})?;

			for (&container_port, &host_port) in ports {
				if host_port == 0 {
					return Err(AppError::UnknownOverride {
						service: service_name.clone(),
						container_port,
						reason: "host port 0 lets the runtime pick a random port".to_string(),
					});
				}

				let mut matched = false;

				for binding in service
					.ports
					.iter_mut()
					.filter(|b| b.container_port == container_port)
				{
					binding.host_port = host_port;
					matched = true;
				}

				if !matched {
					return Err(AppError::UnknownOverride {
						service: service_name.clone(),
						container_port,
						reason: "the service does not publish this container port".to_string(),
					});
				}

				debug!(service = %service_name, container_port, host_port, "applied port override");
			}
		}

		Ok(())
	}

	/// Checks every invariant of the topology.
	pub fn validate(&self) -> Result<(), AppError> {
		self.check_ports()?;
		self.check_paths()?;
		self.start_order()?;

		Ok(())
	}

	fn check_ports(&self) -> Result<(), AppError> {
		let mut published: HashMap<(u16, &'static str), &str> = HashMap::new();

		for service in self.services.values() {
			for binding in &service.ports {
				let key = (binding.host_port, protocol_name(&binding.protocol));

				if let Some(first) = published.insert(key, service.name.as_str()) {
					return Err(AppError::PortCollision {
						port: binding.host_port,
						protocol: key.1.to_string(),
						first: first.to_string(),
						second: service.name.clone(),
					});
				}
			}
		}

		Ok(())
	}

	fn check_paths(&self) -> Result<(), AppError> {
		let mut owners: HashMap<&Path, &str> = HashMap::new();

		for service in self.services.values() {
			for volume in &service.volumes {
				let escapes_root = volume.host_path.components().any(|c| {
					matches!(
						c,
						Component::ParentDir | Component::RootDir | Component::Prefix(_)
					)
				});

				if escapes_root || volume.host_path.as_os_str().is_empty() {
					return Err(AppError::InvalidInput {
						name: "volumes",
						reason: format!(
							"`{}` of service `{}` must be a relative path inside the provisioning root",
							volume.host_path.display(),
							service.name
						),
					});
				}

				if volume.read_only {
					continue;
				}

				if let Some(first) = owners.insert(volume.host_path.as_path(), service.name.as_str()) {
					return Err(AppError::PathCollision {
						path: volume.host_path.clone(),
						first: first.to_string(),
						second: service.name.clone(),
					});
				}
			}
		}

		Ok(())
	}

	/// Returns the service names so that every service comes after its dependencies.
	///
	/// Ties are broken by name, so the order is stable across runs.
	pub fn start_order(&self) -> Result<Vec<&str>, AppError> {
		#[derive(Clone, Copy, PartialEq)]
		enum Mark {
			Visiting,
			Done,
		}

		fn visit<'a>(
			topology: &'a Topology,
			name: &'a str,
			marks: &mut HashMap<&'a str, Mark>,
			path: &mut Vec<&'a str>,
			order: &mut Vec<&'a str>,
		) -> Result<(), AppError> {
			match marks.get(name) {
				Some(Mark::Done) => return Ok(()),
				Some(Mark::Visiting) => {
					let start = path.iter().position(|n| *n == name).unwrap_or_default();
					let mut cycle = path[start..].to_vec();
					cycle.push(name);

					return Err(AppError::CircularDependency(format!(
						"Found circular dependency between services: {}",
						cycle.join(" -> ")
					)));
				}
				None => {}
			}

			let service = &topology.services[name];

			marks.insert(name, Mark::Visiting);
			path.push(name);

			for dependency in &service.depends_on {
				let Some((dep_name, _)) = topology.services.get_key_value(dependency) else {
					return Err(AppError::UnknownDependency {
						service: name.to_string(),
						dependency: dependency.clone(),
					});
				};

				visit(topology, dep_name, marks, path, order)?;
			}

			path.pop();
			marks.insert(name, Mark::Done);
			order.push(name);

			Ok(())
		}

		let mut marks = HashMap::new();
		let mut path = Vec::new();
		let mut order = Vec::with_capacity(self.services.len());

		for name in self.services.keys() {
			visit(self, name, &mut marks, &mut path, &mut order)?;
		}

		Ok(order)
	}

	/// The absolute host directories that must exist before the first start.
	pub fn host_directories(&self, root: &Path) -> BTreeSet<PathBuf> {
		self.services
			.values()
			.flat_map(|service| &service.volumes)
			.filter(|volume| volume.kind == VolumeKind::Directory)
			.map(|volume| root.join(&volume.host_path))
			.collect()
	}

	/// Creates the host directories that are missing. Existing data is never touched.
	pub fn prepare_host_dirs(&self, root: &Path) -> Result<(), AppError> {
		for dir in self.host_directories(root) {
			if !dir.exists() {
				debug!(dir = %dir.display(), "creating data directory");
			}

			create_all_dirs(&dir)?;
		}

		Ok(())
	}

	pub fn get(&self, name: &str) -> Option<&ServiceSpec> {
		self.services.get(name)
	}
}
