use clap::{CommandFactory, Parser};
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn verify_cli() {
	Cli::command().debug_assert();
}

#[test]
fn global_options_after_the_subcommand() {
	let cli = Cli::try_parse_from([
		"provision",
		"up",
		"--skip-start",
		"--root",
		"/srv/validator",
		"--private-key",
		"0xabc",
		"--address",
		"0x123",
		"--public-ip",
		"1.2.3.4",
	])
	.unwrap();

	assert_eq!(cli.overrides.root, Some(PathBuf::from("/srv/validator")));

	let Commands::Up {
		inputs,
		skip_runtime,
		skip_start,
		crontab_file,
	} = cli.command
	else {
		panic!("expected the up command");
	};

	assert!(skip_start);
	assert!(!skip_runtime);
	assert_eq!(crontab_file, None);
	assert_eq!(inputs.private_key.as_ref().map(SecretString::expose), Some("0xabc"));
	assert_eq!(inputs.public_ip, Some("1.2.3.4".parse().unwrap()));
	assert!(!format!("{inputs:?}").contains("0xabc"));
}

#[test]
fn invalid_public_ip_is_rejected() {
	assert!(
		Cli::try_parse_from(["provision", "generate", "--public-ip", "1.2.3"]).is_err()
	);
}

#[test]
fn explicit_config_file() -> Result<(), Box<dyn std::error::Error>> {
	let dir = tempfile::tempdir()?;
	let config_path = dir.path().join("provision.yaml");

	write_file(
		&config_path,
		"project_name: holesky-validator\nroot_dir: node\nscrape_interval: 30s\n",
	)?;

	let config = get_config_from_cli(ConfigOverrides {
		config: Some(config_path.clone()),
		..Default::default()
	})?;

	assert_eq!(config.project_name, "holesky-validator");
	assert_eq!(config.scrape_interval, "30s");
	assert_eq!(config.root()?, get_abs_path(dir.path())?.join("node"));

	let config = get_config_from_cli(ConfigOverrides {
		config: Some(config_path),
		root: Some(PathBuf::from("/srv/validator")),
		..Default::default()
	})?;

	assert_eq!(config.root()?, PathBuf::from("/srv/validator"));

	Ok(())
}

#[tokio::test]
async fn generate_is_repeatable() -> Result<(), Box<dyn std::error::Error>> {
	let dir = tempfile::tempdir()?;
	let root = dir.path().join("node");
	let root_arg = root.to_string_lossy().to_string();

	let args = [
		"provision",
		"--ignore-config",
		"--root",
		root_arg.as_str(),
		"generate",
		"--private-key",
		"0xabc",
		"--address",
		"0x123",
		"--public-ip",
		"1.2.3.4",
	];

	Cli::try_parse_from(args)?.execute().await?;

	let secret = read_file(&root.join(SECRET_FILE))?;
	let ledger = root.join("data/sequencer/world_state.db");

	write_file(&ledger, "state")?;

	Cli::try_parse_from(args)?.execute().await?;

	assert_eq!(read_file(&root.join(SECRET_FILE))?, secret);
	assert_eq!(read_file(&ledger)?, "state");

	for file in [COMPOSE_FILE, "prometheus.yml", "validator_cron.sh"] {
		assert!(root.join(file).is_file(), "{file} is missing");
	}

	let script = read_file(&root.join("validator_cron.sh"))?;

	assert!(script.contains("--private-key 0xabc"));
	assert!(script.contains("exec -T sequencer"));

	Ok(())
}

#[tokio::test]
async fn invalid_credentials_write_nothing() -> Result<(), Box<dyn std::error::Error>> {
	let dir = tempfile::tempdir()?;
	let root = dir.path().join("node");
	let root_arg = root.to_string_lossy().to_string();

	let result = Cli::try_parse_from([
		"provision",
		"--ignore-config",
		"--root",
		root_arg.as_str(),
		"generate",
		"--private-key",
		"abc",
		"--address",
		"0x123",
		"--public-ip",
		"1.2.3.4",
	])?
	.execute()
	.await;

	assert!(matches!(
		result,
		Err(AppError::InvalidInput {
			name: "private_key",
			..
		})
	));
	assert!(!root.exists());

	Ok(())
}

#[tokio::test]
async fn invalid_task_config_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
	let dir = tempfile::tempdir()?;
	let root = dir.path().join("node");
	let config_path = dir.path().join("provision.yaml");
	let root_arg = root.to_string_lossy().to_string();
	let config_arg = config_path.to_string_lossy().to_string();

	write_file(&config_path, "task:\n  schedule: hourly\n")?;

	for command in ["generate", "schedule", "up"] {
		let result = Cli::try_parse_from([
			"provision",
			"-c",
			config_arg.as_str(),
			"--root",
			root_arg.as_str(),
			command,
			"--private-key",
			"0xabc",
			"--address",
			"0x123",
			"--public-ip",
			"1.2.3.4",
		])?
		.execute()
		.await;

		assert!(
			matches!(result, Err(AppError::InvalidSchedule { .. })),
			"{command}"
		);
		assert!(!root.exists(), "{command} created the root");
	}

	Ok(())
}

#[tokio::test]
async fn schedule_into_a_file() -> Result<(), Box<dyn std::error::Error>> {
	let dir = tempfile::tempdir()?;
	let root = dir.path().join("node");
	let crontab = dir.path().join("crontab");
	let root_arg = root.to_string_lossy().to_string();
	let crontab_arg = crontab.to_string_lossy().to_string();

	write_file(&crontab, "0 0 * * * /opt/old/validator_cron.sh >> /opt/old/cron.log 2>&1\n")?;

	let args = [
		"provision",
		"--ignore-config",
		"--root",
		root_arg.as_str(),
		"schedule",
		"--private-key",
		"0xabc",
		"--address",
		"0x123",
		"--public-ip",
		"1.2.3.4",
		"--crontab-file",
		crontab_arg.as_str(),
	];

	Cli::try_parse_from(args)?.execute().await?;
	Cli::try_parse_from(args)?.execute().await?;

	let root = get_abs_path(&root)?;

	assert_eq!(
		read_file(&crontab)?,
		format!(
			"0 * * * * {} >> {} 2>&1\n",
			root.join("validator_cron.sh").display(),
			root.join("validator_cron.log").display()
		)
	);

	Ok(())
}
