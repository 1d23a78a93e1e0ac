use indoc::indoc;
use pretty_assertions::assert_eq;

use prometheus_config::*;

#[test]
fn prometheus_config_parsing() -> Result<(), Box<dyn std::error::Error>> {
	let content = indoc! {r#"
		global:
		  scrape_interval: 15s
		scrape_configs:
		  - job_name: execution
		    metrics_path: /debug/metrics/prometheus
		    static_configs:
		      - targets: ["execution:6060"]
		  - job_name: node-exporter
		    static_configs:
		      - targets: ["node-exporter:9100"]
		        labels:
		          host: validator
	"#};

	let config: PrometheusConfig = serde_yaml_ng::from_str(content)?;

	assert_eq!(
		config.global.as_ref().unwrap().scrape_interval.as_deref(),
		Some("15s")
	);

	let targets: Vec<(&str, &str)> = config.targets().collect();

	assert_eq!(
		targets,
		vec![
			("execution", "execution:6060"),
			("node-exporter", "node-exporter:9100")
		]
	);

	assert_eq!(
		config
			.get_job("execution")
			.unwrap()
			.metrics_path
			.as_deref(),
		Some("/debug/metrics/prometheus")
	);

	assert_eq!(
		config.get_job("node-exporter").unwrap().static_configs[0].labels["host"],
		"validator"
	);

	Ok(())
}

#[test]
fn single_target_job() -> Result<(), Box<dyn std::error::Error>> {
	let config = PrometheusConfig {
		global: None,
		scrape_configs: vec![ScrapeConfig::new("consensus", "consensus:5054")],
	};

	let output = serde_yaml_ng::to_string(&config)?;

	assert!(!output.contains("global"));
	assert!(!output.contains("metrics_path"));
	assert!(output.contains("consensus:5054"));

	let parsed: PrometheusConfig = serde_yaml_ng::from_str(&output)?;

	assert_eq!(parsed, config);

	Ok(())
}
