mod service;
pub use service::*;

use std::{
	collections::{BTreeMap, BTreeSet},
	fmt::{self, Display},
};

use serde::{Deserialize, Serialize};

type StringBTreeMap = BTreeMap<String, String>;

/// The root of a compose file.
///
/// Reference: https://docs.docker.com/reference/compose-file/
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ComposeFile {
	/// Project name, used as the prefix of container and network names.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,

	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub services: BTreeMap<String, Service>,

	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub networks: BTreeMap<String, TopLevelNetwork>,

	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub volumes: BTreeMap<String, TopLevelVolume>,
}

impl ComposeFile {
	pub fn new() -> Self {
		Default::default()
	}

	/// Returns the names of the dependencies of `service` that are not defined in this file.
	pub fn missing_dependencies(&self, service: &str) -> Vec<String> {
		self.services
			.get(service)
			.and_then(|s| s.depends_on.as_ref())
			.map(|deps| {
				deps.names()
					.filter(|name| !self.services.contains_key(*name))
					.map(ToString::to_string)
					.collect()
			})
			.unwrap_or_default()
	}
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, PartialOrd, Ord)]
#[serde(untagged)]
pub enum StringOrNum {
	Num(i64),
	String(String),
}

impl Display for StringOrNum {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Num(n) => write!(f, "{n}"),
			Self::String(s) => write!(f, "{s}"),
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, PartialOrd, Ord)]
#[serde(untagged)]
pub enum StringOrList {
	String(String),
	List(Vec<String>),
}

impl StringOrList {
	/// Iterates the contained value(s) without splitting plain strings.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		let items: Vec<&str> = match self {
			Self::String(s) => vec![s.as_str()],
			Self::List(list) => list.iter().map(String::as_str).collect(),
		};

		items.into_iter()
	}
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, PartialOrd, Ord)]
#[serde(untagged)]
pub enum ListOrMap {
	List(BTreeSet<String>),
	Map(StringBTreeMap),
}

impl ListOrMap {
	pub fn contains(&self, key: &str) -> bool {
		match self {
			Self::List(list) => list
				.iter()
				.any(|item| item == key || item.split_once('=').is_some_and(|(k, _)| k == key)),
			Self::Map(map) => map.contains_key(key),
		}
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		match self {
			Self::List(list) => list.iter().find_map(|item| {
				item.split_once('=')
					.and_then(|(k, v)| (k == key).then_some(v))
			}),
			Self::Map(map) => map.get(key).map(String::as_str),
		}
	}

	/// Iterates the values in `KEY=VALUE` form.
	pub fn values(&self) -> Vec<String> {
		match self {
			Self::List(list) => list.iter().cloned().collect(),
			Self::Map(map) => map.iter().map(|(k, v)| format!("{k}={v}")).collect(),
		}
	}
}

impl Default for ListOrMap {
	fn default() -> Self {
		Self::Map(Default::default())
	}
}

/// An entry of the top-level `networks` map.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct TopLevelNetwork {
	/// The network is created outside of compose and must already exist.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub external: Option<bool>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,

	/// `bridge` on a single host.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub driver: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub labels: Option<ListOrMap>,
}

/// An entry of the top-level `volumes` map. Bind mounts don't need one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct TopLevelVolume {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub external: Option<bool>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub driver: Option<String>,

	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub driver_opts: StringBTreeMap,
}
