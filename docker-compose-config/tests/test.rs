use indoc::indoc;
use maplit::{btreemap, btreeset};
use pretty_assertions::assert_eq;

use docker_compose_config::*;

#[test]
fn compose_file_parsing() -> Result<(), Box<dyn std::error::Error>> {
	let content = indoc! {r#"
		name: validator
		services:
		  execution:
		    image: ethereum/client-go:v1.15.11
		    command: ["--http", "--http.addr=0.0.0.0"]
		    ports:
		      - "8545:8545"
		      - target: 30303
		        published: 30303
		        protocol: udp
		    volumes:
		      - ./data/execution:/data
		      - type: bind
		        source: ./jwt.hex
		        target: /jwt/jwt.hex
		        read_only: true
		    restart: unless-stopped
		  consensus:
		    image: sigp/lighthouse:v7.0.1
		    depends_on:
		      execution:
		        condition: service_started
		    environment:
		      - RUST_LOG=info
		  sequencer:
		    image: aztecprotocol/aztec:latest
		    depends_on: [execution, missing]
		    environment:
		      P2P_IP: 1.2.3.4
		    restart: always
		networks:
		  validator:
		    driver: bridge
	"#};

	let compose: ComposeFile = serde_yaml_ng::from_str(content)?;

	assert_eq!(compose.name.as_deref(), Some("validator"));

	let execution = &compose.services["execution"];

	assert_eq!(
		execution.command,
		Some(StringOrList::List(vec![
			"--http".to_string(),
			"--http.addr=0.0.0.0".to_string()
		]))
	);

	let published: Vec<Option<u16>> = execution.ports.iter().map(Port::published).collect();
	assert!(published.contains(&Some(8545)));
	assert!(published.contains(&Some(30303)));

	let targets: Vec<&str> = execution
		.volumes
		.iter()
		.filter_map(ServiceVolume::target)
		.collect();
	assert!(targets.contains(&"/data"));
	assert!(targets.contains(&"/jwt/jwt.hex"));

	assert_eq!(execution.restart, Some(Restart::UnlessStopped));

	let consensus = &compose.services["consensus"];
	let deps: Vec<&str> = consensus.depends_on.as_ref().unwrap().names().collect();
	assert_eq!(deps, vec!["execution"]);
	assert_eq!(
		consensus.environment.as_ref().unwrap().get("RUST_LOG"),
		Some("info")
	);

	let sequencer = &compose.services["sequencer"];
	assert_eq!(
		sequencer.environment.as_ref().unwrap().get("P2P_IP"),
		Some("1.2.3.4")
	);

	assert_eq!(
		compose.missing_dependencies("sequencer"),
		vec!["missing".to_string()]
	);
	assert!(compose.missing_dependencies("consensus").is_empty());

	assert_eq!(
		compose.networks["validator"].driver.as_deref(),
		Some("bridge")
	);

	Ok(())
}

#[test]
fn empty_fields_are_skipped() -> Result<(), Box<dyn std::error::Error>> {
	let compose = ComposeFile {
		name: Some("validator".to_string()),
		services: btreemap! {
			"grafana".to_string() => Service {
				image: Some("grafana/grafana:11.1.0".to_string()),
				depends_on: Some(DependsOn::Simple(btreeset! { "prometheus".to_string() })),
				..Default::default()
			},
		},
		..Default::default()
	};

	let output = serde_yaml_ng::to_string(&compose)?;

	assert!(output.contains("depends_on:"));
	assert!(output.contains("prometheus"));
	assert!(!output.contains("ports:"));
	assert!(!output.contains("volumes:"));
	assert!(!output.contains("networks:"));

	let parsed: ComposeFile = serde_yaml_ng::from_str(&output)?;

	assert_eq!(parsed, compose);

	Ok(())
}

#[test]
fn port_published_values() {
	assert_eq!(Port::String("3000:3000".to_string()).published(), Some(3000));
	assert_eq!(
		Port::String("127.0.0.1:9090:9090/tcp".to_string()).published(),
		Some(9090)
	);
	assert_eq!(Port::String("9090".to_string()).published(), None);
	assert_eq!(Port::Num(9090).published(), None);
	assert_eq!(
		Port::Data(PortSettings {
			target: Some(StringOrNum::Num(40400)),
			published: Some(StringOrNum::String("40401".to_string())),
			protocol: Some(Protocol::Udp),
			..Default::default()
		})
		.published(),
		Some(40401)
	);
}

#[test]
fn long_syntax_round_trip() -> Result<(), Box<dyn std::error::Error>> {
	let content = indoc! {r#"
		services:
		  sequencer:
		    container_name: aztec-sequencer
		    image: aztecprotocol/aztec:latest
		    depends_on:
		      execution:
		        condition: service_healthy
		        restart: true
		      consensus:
		        condition: service_started
		        required: false
		    network_mode: host
		    stop_grace_period: 1m30s
		volumes:
		  chain-data:
		    name: validator-chain-data
		    driver: local
		    driver_opts:
		      type: none
		  shared:
		    external: true
	"#};

	let compose: ComposeFile = serde_yaml_ng::from_str(content)?;

	let sequencer = &compose.services["sequencer"];

	assert_eq!(sequencer.container_name.as_deref(), Some("aztec-sequencer"));
	assert_eq!(sequencer.network_mode.as_deref(), Some("host"));
	assert_eq!(sequencer.stop_grace_period.as_deref(), Some("1m30s"));

	let Some(DependsOn::Conditional(deps)) = &sequencer.depends_on else {
		panic!("expected the long depends_on syntax");
	};

	assert_eq!(
		deps.keys().map(String::as_str).collect::<Vec<_>>(),
		vec!["execution", "consensus"]
	);
	assert_eq!(deps["execution"].condition, DependsOnCondition::ServiceHealthy);
	assert_eq!(deps["execution"].restart, Some(true));
	assert_eq!(deps["consensus"].required, Some(false));

	assert_eq!(
		compose.volumes["chain-data"],
		TopLevelVolume {
			name: Some("validator-chain-data".to_string()),
			driver: Some("local".to_string()),
			driver_opts: btreemap! { "type".to_string() => "none".to_string() },
			..Default::default()
		}
	);
	assert_eq!(compose.volumes["shared"].external, Some(true));

	let output = serde_yaml_ng::to_string(&compose)?;
	let parsed: ComposeFile = serde_yaml_ng::from_str(&output)?;

	assert_eq!(parsed, compose);

	Ok(())
}
