use prometheus_config::{GlobalConfig, PrometheusConfig, ScrapeConfig};

use crate::*;

impl Topology {
	/// Renders the scrape configuration for the metrics-exposing services.
	///
	/// Only job names, in-network targets and paths end up in it.
	pub fn to_prometheus(&self) -> PrometheusConfig {
		PrometheusConfig {
			global: Some(GlobalConfig {
				scrape_interval: Some(self.scrape_interval.clone()),
				..Default::default()
			}),
			scrape_configs: self
				.scrape_targets
				.iter()
				.map(|target| ScrapeConfig {
					metrics_path: target.metrics_path.clone(),
					..ScrapeConfig::new(&target.job_name, &target.target)
				})
				.collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use indoc::indoc;
	use pretty_assertions::assert_eq;

	use super::*;

	fn topology() -> (tempfile::TempDir, Topology) {
		let dir = tempfile::tempdir().unwrap();
		let secret_path = dir.path().join(SECRET_FILE);

		ensure_shared_secret(&secret_path).unwrap();

		let inputs = Inputs {
			credentials: Credentials::new("0xabc", "0x123").unwrap(),
			public_ip: "1.2.3.4".parse().unwrap(),
			root: dir.path().to_path_buf(),
			secret_path,
		};

		let topology = generate(&Config::default(), &inputs).unwrap();

		(dir, topology)
	}

	#[test]
	fn scrape_config_rendering() {
		let (_dir, topology) = topology();

		let rendered = serde_yaml_ng::to_string(&topology.to_prometheus()).unwrap();

		assert_eq!(
			rendered,
			indoc! {"
				global:
				  scrape_interval: 15s
				scrape_configs:
				- job_name: consensus
				  static_configs:
				  - targets:
				    - consensus:5054
				- job_name: execution
				  metrics_path: /debug/metrics/prometheus
				  static_configs:
				  - targets:
				    - execution:6060
				- job_name: prometheus
				  static_configs:
				  - targets:
				    - prometheus:9090
			"}
		);
	}

	#[test]
	fn credentials_never_reach_the_scrape_config() {
		let (_dir, topology) = topology();

		let config = topology.to_prometheus();

		let rendered = serde_yaml_ng::to_string(&config).unwrap();

		assert!(!rendered.contains("0xabc"));
		assert!(!rendered.contains("0x123"));

		assert_eq!(
			config.targets().collect::<Vec<_>>(),
			vec![
				("consensus", "consensus:5054"),
				("execution", "execution:6060"),
				("prometheus", "prometheus:9090"),
			]
		);
	}
}
