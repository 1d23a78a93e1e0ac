use super::*;

pub(crate) const EXECUTION: &str = "execution";
pub(crate) const CONSENSUS: &str = "consensus";
pub(crate) const SEQUENCER: &str = "sequencer";
pub(crate) const PROMETHEUS: &str = "prometheus";
pub(crate) const GRAFANA: &str = "grafana";

/// Every service of the stack, in catalogue order.
pub(crate) const SERVICE_NAMES: [&str; 5] = [EXECUTION, CONSENSUS, SEQUENCER, PROMETHEUS, GRAFANA];

pub(crate) const EXECUTION_RPC_PORT: u16 = 8545;
pub(crate) const CONSENSUS_HTTP_PORT: u16 = 5052;
pub(crate) const PROMETHEUS_PORT: u16 = 9090;
pub(crate) const GRAFANA_PORT: u16 = 3000;

const ENGINE_API_PORT: u16 = 8551;
const EXECUTION_P2P_PORT: u16 = 30303;
const EXECUTION_METRICS_PORT: u16 = 6060;
const CONSENSUS_P2P_PORT: u16 = 9000;
const CONSENSUS_METRICS_PORT: u16 = 5054;
const SEQUENCER_HTTP_PORT: u16 = 8080;
const SEQUENCER_P2P_PORT: u16 = 40400;

/// Where the shared secret is mounted inside the clients.
const JWT_MOUNT: &str = "/jwt/jwt.hex";

/// The file name of the scrape configuration inside the provisioning root.
pub(crate) const PROMETHEUS_CONFIG_FILE: &str = "prometheus.yml";

fn args(items: &[&str]) -> Vec<String> {
	items.iter().map(ToString::to_string).collect()
}

/// Every service of the stack, before port overrides are applied.
pub(crate) fn catalog(config: &Config, inputs: &Inputs, secret_mount: &Path) -> Vec<ServiceSpec> {
	vec![
		execution(config, secret_mount),
		consensus(config, secret_mount),
		sequencer(config, inputs),
		prometheus(config),
		grafana(config),
	]
}

fn execution(config: &Config, secret_mount: &Path) -> ServiceSpec {
	let mut service = ServiceSpec::new(EXECUTION, &config.images.execution);

	service.command = args(&[
		&format!("--{}", config.l1_network),
		"--http",
		"--http.addr=0.0.0.0",
		&format!("--http.port={EXECUTION_RPC_PORT}"),
		"--http.api=eth,net,web3",
		"--http.vhosts=*",
		"--authrpc.addr=0.0.0.0",
		&format!("--authrpc.port={ENGINE_API_PORT}"),
		"--authrpc.vhosts=*",
		&format!("--authrpc.jwtsecret={JWT_MOUNT}"),
		"--datadir=/data",
		"--syncmode=snap",
		"--metrics",
		"--metrics.addr=0.0.0.0",
		&format!("--metrics.port={EXECUTION_METRICS_PORT}"),
	]);

	service.ports = vec![
		PortBinding::tcp(EXECUTION_RPC_PORT),
		PortBinding::tcp(EXECUTION_P2P_PORT),
		PortBinding::udp(EXECUTION_P2P_PORT),
	];

	service.volumes = vec![
		VolumeBinding::dir("data/execution", "/data"),
		VolumeBinding::read_only_file(secret_mount, JWT_MOUNT),
	];

	service.metrics = Some(MetricsEndpoint {
		port: EXECUTION_METRICS_PORT,
		path: Some("/debug/metrics/prometheus".to_string()),
	});

	service
}

fn consensus(config: &Config, secret_mount: &Path) -> ServiceSpec {
	let mut service = ServiceSpec::new(CONSENSUS, &config.images.consensus);

	service.command = args(&[
		"lighthouse",
		"bn",
		"--network",
		&config.l1_network,
		"--datadir",
		"/data",
		"--http",
		"--http-address",
		"0.0.0.0",
		"--http-port",
		&CONSENSUS_HTTP_PORT.to_string(),
		"--execution-endpoint",
		&format!("http://{EXECUTION}:{ENGINE_API_PORT}"),
		"--execution-jwt",
		JWT_MOUNT,
		"--checkpoint-sync-url",
		&config.checkpoint_sync_url,
		"--disable-deposit-contract-sync",
		"--metrics",
		"--metrics-address",
		"0.0.0.0",
		"--metrics-port",
		&CONSENSUS_METRICS_PORT.to_string(),
	]);

	service.ports = vec![
		PortBinding::tcp(CONSENSUS_HTTP_PORT),
		PortBinding::tcp(CONSENSUS_P2P_PORT),
		PortBinding::udp(CONSENSUS_P2P_PORT),
	];

	service.volumes = vec![
		VolumeBinding::dir("data/consensus", "/data"),
		VolumeBinding::read_only_file(secret_mount, JWT_MOUNT),
	];

	service.depends_on.insert(EXECUTION.to_string());

	service.metrics = Some(MetricsEndpoint {
		port: CONSENSUS_METRICS_PORT,
		path: None,
	});

	service
}

fn sequencer(config: &Config, inputs: &Inputs) -> ServiceSpec {
	let mut service = ServiceSpec::new(SEQUENCER, &config.images.sequencer);

	service.entrypoint = args(&[
		"node",
		"--no-warnings",
		"/usr/src/yarn-project/aztec/dest/bin/index.js",
		"start",
		"--network",
		&config.sequencer_network,
		"--node",
		"--archiver",
		"--sequencer",
	]);

	let credentials = &inputs.credentials;

	service.env = [
		(
			"ETHEREUM_HOSTS",
			format!("http://{EXECUTION}:{EXECUTION_RPC_PORT}"),
		),
		(
			"L1_CONSENSUS_HOST_URLS",
			format!("http://{CONSENSUS}:{CONSENSUS_HTTP_PORT}"),
		),
		("DATA_DIRECTORY", "/data".to_string()),
		("LOG_LEVEL", config.log_level.clone()),
		(
			"VALIDATOR_PRIVATE_KEY",
			credentials.private_key.expose().to_string(),
		),
		("VALIDATOR_ADDRESS", credentials.address.clone()),
		("P2P_IP", inputs.public_ip.to_string()),
		("P2P_PORT", SEQUENCER_P2P_PORT.to_string()),
	]
	.into_iter()
	.map(|(k, v)| (k.to_string(), v))
	.collect();

	service.ports = vec![
		PortBinding::tcp(SEQUENCER_HTTP_PORT),
		PortBinding::tcp(SEQUENCER_P2P_PORT),
		PortBinding::udp(SEQUENCER_P2P_PORT),
	];

	service.volumes = vec![VolumeBinding::dir("data/sequencer", "/data")];

	service.depends_on = [EXECUTION, CONSENSUS]
		.into_iter()
		.map(String::from)
		.collect();

	service
}

fn prometheus(config: &Config) -> ServiceSpec {
	let mut service = ServiceSpec::new(PROMETHEUS, &config.images.prometheus);

	service.command = args(&[
		"--config.file=/etc/prometheus/prometheus.yml",
		"--storage.tsdb.path=/prometheus",
		"--storage.tsdb.retention.time=30d",
	]);

	// The data dir is created by the provisioner, so it is owned by root
	service.user = Some("0:0".to_string());

	service.ports = vec![PortBinding::tcp(PROMETHEUS_PORT)];

	service.volumes = vec![
		VolumeBinding::read_only_file(PROMETHEUS_CONFIG_FILE, "/etc/prometheus/prometheus.yml"),
		VolumeBinding::dir("data/prometheus", "/prometheus"),
	];

	service.depends_on = [EXECUTION, CONSENSUS]
		.into_iter()
		.map(String::from)
		.collect();

	service.metrics = Some(MetricsEndpoint {
		port: PROMETHEUS_PORT,
		path: None,
	});

	service
}

fn grafana(config: &Config) -> ServiceSpec {
	let mut service = ServiceSpec::new(GRAFANA, &config.images.grafana);

	service.user = Some("0:0".to_string());

	service.env = [
		("GF_USERS_ALLOW_SIGN_UP", "false"),
		("GF_PATHS_DATA", "/var/lib/grafana"),
	]
	.into_iter()
	.map(|(k, v)| (k.to_string(), v.to_string()))
	.collect();

	service.ports = vec![PortBinding::tcp(GRAFANA_PORT)];

	service.volumes = vec![VolumeBinding::dir("data/grafana", "/var/lib/grafana")];

	service.depends_on.insert(PROMETHEUS.to_string());

	service
}
