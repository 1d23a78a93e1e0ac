use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

type StringBTreeMap = BTreeMap<String, String>;

/// Configuration settings for [`Prometheus`](https://prometheus.io/docs/prometheus/latest/configuration/configuration/)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PrometheusConfig {
	/// The global configuration specifies parameters that are valid in all other configuration contexts. They also serve as defaults for other configuration sections.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub global: Option<GlobalConfig>,

	/// A list of scrape configurations.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub scrape_configs: Vec<ScrapeConfig>,
}

impl PrometheusConfig {
	/// Iterates every target of every job, as `(job_name, target)` pairs.
	pub fn targets(&self) -> impl Iterator<Item = (&str, &str)> {
		self.scrape_configs.iter().flat_map(|job| {
			job.static_configs.iter().flat_map(move |group| {
				group
					.targets
					.iter()
					.map(move |target| (job.job_name.as_str(), target.as_str()))
			})
		})
	}

	pub fn get_job(&self, name: &str) -> Option<&ScrapeConfig> {
		self.scrape_configs.iter().find(|job| job.job_name == name)
	}
}

/// https://prometheus.io/docs/prometheus/latest/configuration/configuration/#configuration-file
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct GlobalConfig {
	/// How frequently to scrape targets by default.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub scrape_interval: Option<String>,

	/// How long until a scrape request times out.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub scrape_timeout: Option<String>,

	/// How frequently to evaluate rules.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub evaluation_interval: Option<String>,

	/// The labels to add to any time series or alerts when communicating with external systems.
	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub external_labels: StringBTreeMap,
}

/// A scrape job. https://prometheus.io/docs/prometheus/latest/configuration/configuration/#scrape_config
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapeConfig {
	/// The job name assigned to scraped metrics by default.
	pub job_name: String,

	/// How frequently to scrape targets from this job. Defaults to the global interval.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scrape_interval: Option<String>,

	/// The HTTP resource path on which to fetch metrics from targets. (default: `/metrics`)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metrics_path: Option<String>,

	/// Configures the protocol scheme used for requests. (default: `http`)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scheme: Option<String>,

	/// List of labeled statically configured targets for this job.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub static_configs: Vec<StaticConfig>,
}

impl ScrapeConfig {
	/// Creates a job with a single static target.
	pub fn new(job_name: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			job_name: job_name.into(),
			scrape_interval: None,
			metrics_path: None,
			scheme: None,
			static_configs: vec![StaticConfig {
				targets: vec![target.into()],
				labels: Default::default(),
			}],
		}
	}
}

/// https://prometheus.io/docs/prometheus/latest/configuration/configuration/#static_config
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct StaticConfig {
	/// The targets specified by the static config, in `host:port` form.
	pub targets: Vec<String>,

	/// Labels assigned to all metrics scraped from the targets.
	#[serde(skip_serializing_if = "BTreeMap::is_empty")]
	pub labels: StringBTreeMap,
}
