use std::fs::exists;

use tracing::debug;

use crate::{cli::ConfigOverrides, *};

pub(crate) fn get_config_from_cli(overrides: ConfigOverrides) -> Result<Config, AppError> {
	let ConfigOverrides {
		config: config_path,
		ignore_config,
		root,
	} = overrides;

	let config_path = if let Some(path) = config_path {
		Some(path)
	} else if !ignore_config {
		get_config_path_from_defaults()
	} else {
		None
	};

	let mut config = if let Some(config_path) = config_path {
		debug!(path = %config_path.display(), "loading the config file");

		Config::from_file(config_path)?
	} else {
		Config::default()
	};

	if let Some(root) = root {
		config.root_dir = Some(root);
	}

	Ok(config)
}

const DEFAULT_CONFIG_NAMES: [&str; 4] = [
	"provision.yaml",
	"provision.yml",
	"provision.toml",
	"provision.json",
];

fn get_config_path_from_defaults() -> Option<PathBuf> {
	for name in DEFAULT_CONFIG_NAMES {
		if exists(name).is_ok_and(|exists| exists) {
			return Some(PathBuf::from(name));
		}
	}

	// Try xdg path if nothing else was found
	get_config_from_xdg()
}

fn get_config_from_xdg() -> Option<PathBuf> {
	let xdg_config = if let Ok(env_val) = env::var("XDG_CONFIG_HOME") {
		Some(PathBuf::from(env_val))
	} else {
		env::home_dir().map(|home| home.join(".config"))
	};

	let config_dir = xdg_config?.join("provision");

	if config_dir.is_dir() {
		for name in DEFAULT_CONFIG_NAMES {
			let config_path = config_dir.join(name);

			if exists(&config_path).is_ok_and(|exists| exists) {
				return Some(config_path);
			}
		}
	}

	None
}
