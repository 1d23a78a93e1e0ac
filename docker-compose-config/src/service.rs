use std::{
	cmp::Ordering,
	collections::{BTreeMap, BTreeSet},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ListOrMap, StringOrList, StringOrNum};

/// A single entry of the `services` map.
///
/// Only the attributes needed to run pre-built images are modeled.
/// Reference: https://docs.docker.com/reference/compose-file/services/
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Service {
	/// Fixed container name. A service with a container name cannot be scaled.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub container_name: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub image: Option<String>,

	/// Services started before this one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub depends_on: Option<DependsOn>,

	/// Replaces the image's `CMD`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub command: Option<StringOrList>,

	/// Replaces the image's `ENTRYPOINT`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub entrypoint: Option<StringOrList>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub environment: Option<ListOrMap>,

	/// The process owner inside the container, as `user` or `uid:gid`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user: Option<String>,

	#[serde(skip_serializing_if = "BTreeSet::is_empty")]
	pub ports: BTreeSet<Port>,

	#[serde(skip_serializing_if = "BTreeSet::is_empty")]
	pub volumes: BTreeSet<ServiceVolume>,

	/// Names of the top-level networks the service joins.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub networks: Option<BTreeSet<String>>,

	/// Mutually exclusive with `networks`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub network_mode: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub restart: Option<Restart>,

	/// How long to wait after the stop signal before the container is killed, e.g. `30s`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stop_grace_period: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub logging: Option<LoggingSettings>,
}

/// Either a plain list of services or, in the long syntax, a condition per service.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum DependsOn {
	Simple(BTreeSet<String>),

	Conditional(IndexMap<String, DependsOnSettings>),
}

impl Default for DependsOn {
	fn default() -> Self {
		Self::Simple(Default::default())
	}
}

impl DependsOn {
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Simple(v) => v.is_empty(),
			Self::Conditional(m) => m.is_empty(),
		}
	}

	/// Iterates the names of the services being depended on.
	pub fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
		match self {
			Self::Simple(v) => Box::new(v.iter().map(String::as_str)),
			Self::Conditional(m) => Box::new(m.keys().map(String::as_str)),
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DependsOnCondition {
	/// Waits until the service has completed successfully.
	ServiceCompletedSuccessfully,
	/// Waits until the service is healthy (as defined by its healthcheck).
	ServiceHealthy,
	/// Waits until the service has started.
	ServiceStarted,
}

/// Long syntax for a single `depends_on` entry.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct DependsOnSettings {
	pub condition: DependsOnCondition,

	/// Restarts this service when the dependency is updated.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub restart: Option<bool>,

	/// When `false`, a missing dependency only produces a warning.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub required: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
	Tcp,
	Udp,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(untagged)]
pub enum Port {
	Num(u64),
	String(String),
	Data(PortSettings),
}

impl Port {
	/// Returns the published host port, when one is declared.
	pub fn published(&self) -> Option<u16> {
		match self {
			Self::Num(_) => None,
			Self::String(s) => {
				let mapping = s.split('/').next().unwrap_or(s);
				let mut parts: Vec<&str> = mapping.split(':').collect();

				if parts.len() < 2 {
					return None;
				}

				parts.pop();
				parts.pop().and_then(|p| p.parse().ok())
			}
			Self::Data(settings) => match settings.published.as_ref()? {
				StringOrNum::Num(n) => u16::try_from(*n).ok(),
				StringOrNum::String(s) => s.parse().ok(),
			},
		}
	}
}

/// Long syntax of a port mapping.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(default)]
pub struct PortSettings {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,

	/// Restricts the binding to one host interface.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub host_ip: Option<String>,

	/// Container port.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target: Option<StringOrNum>,

	/// Host port.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub published: Option<StringOrNum>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub protocol: Option<Protocol>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum ServiceVolume {
	Simple(String),
	Advanced(ServiceVolumeSettings),
}

impl ServiceVolume {
	/// The path in the container where the volume is mounted.
	pub fn target(&self) -> Option<&str> {
		match self {
			Self::Simple(s) => s.split(':').nth(1),
			Self::Advanced(settings) => Some(&settings.target),
		}
	}
}

impl PartialOrd for ServiceVolume {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for ServiceVolume {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self, other) {
			(Self::Simple(s), Self::Simple(other_s)) => s.cmp(other_s),
			(Self::Simple(_), Self::Advanced(_)) => Ordering::Greater,
			(Self::Advanced(_), Self::Simple(_)) => Ordering::Less,
			(Self::Advanced(v), Self::Advanced(other_v)) => v
				.target
				.cmp(&other_v.target)
				.then_with(|| v.source.cmp(&other_v.source)),
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum VolumeType {
	Bind,
	Tmpfs,
	Volume,
}

/// Long syntax of a volume mount.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServiceVolumeSettings {
	#[serde(rename = "type")]
	pub type_: VolumeType,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub read_only: Option<bool>,

	/// A host path for binds, a volume name for named volumes. Unused by tmpfs.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,

	pub target: String,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bind: Option<Bind>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Bind {
	/// Lets the engine create a missing host directory. Compose refuses to start otherwise.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub create_host_path: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Restart {
	Always,
	No,
	OnFailure,
	UnlessStopped,
	#[serde(untagged)]
	Other(String),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingDriver {
	Local,
	/// Docker's default.
	JsonFile,
	Syslog,
	Journald,
}

/// Per-service log settings. The options depend on the driver, e.g. `max-size` for `json-file`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct LoggingSettings {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub driver: Option<LoggingDriver>,

	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub options: BTreeMap<String, StringOrNum>,
}
