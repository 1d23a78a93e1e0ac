use super::*;

pub(crate) fn extract_config_from_file(path: &Path) -> Result<Config, AppError> {
	let format = get_extension(path)?.to_string_lossy();

	let mut config: Config = match format.as_ref() {
		"yaml" | "yml" => deserialize_yaml(path)?,
		"toml" => deserialize_toml(path)?,
		"json" => deserialize_json(path)?,
		_ => {
			return Err(AppError::DeserializationError {
				file: path.to_path_buf(),
				error: "unsupported config format, expected one of yaml, toml, json".to_string(),
			});
		}
	};

	config.config_file = Some(path.to_path_buf());

	// A relative root is resolved against the config file's directory
	if let Some(root_dir) = &config.root_dir
		&& root_dir.is_relative()
		&& let Some(parent) = path.parent()
	{
		config.root_dir = Some(parent.join(root_dir));
	}

	Ok(config)
}

impl Config {
	/// Loads a yaml, toml or json config. Relative paths are resolved from the cwd.
	pub fn from_file<T: Into<PathBuf>>(path: T) -> Result<Self, AppError> {
		extract_config_from_file(&get_abs_path(&path.into())?)
	}

	/// Writes the config to `path`, picking the format from its extension.
	pub fn write_to(&self, path: &Path) -> Result<(), AppError> {
		let format = get_extension(path)?.to_string_lossy();

		match format.as_ref() {
			"yaml" | "yml" => serialize_yaml(self, path),
			"toml" => serialize_toml(self, path),
			"json" => serialize_json(self, path),
			_ => Err(anyhow!("Invalid config format. Allowed formats are: yaml, toml, json").into()),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn default_config_written_and_read_back() -> Result<(), Box<dyn std::error::Error>> {
		let dir = tempfile::tempdir()?;

		for name in ["provision.yaml", "provision.json"] {
			let path = dir.path().join(name);

			Config::default().write_to(&path)?;

			let mut config = Config::from_file(&path)?;

			assert_eq!(config.config_file.take(), Some(get_abs_path(&path)?));
			assert_eq!(config, Config::default());
		}

		Ok(())
	}

	#[test]
	fn relative_root_is_resolved_from_config_dir() -> Result<(), Box<dyn std::error::Error>> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("provision.yaml");

		write_file(&path, "root_dir: node\nl1_network: holesky\n")?;

		let config = Config::from_file(&path)?;

		assert_eq!(config.root_dir, Some(get_abs_path(dir.path())?.join("node")));
		assert_eq!(config.l1_network, "holesky");
		assert_eq!(config.images, Images::default());

		Ok(())
	}

	#[test]
	fn unknown_fields_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("provision.yaml");

		write_file(&path, "not_a_field: true\n")?;

		assert!(matches!(
			Config::from_file(&path),
			Err(AppError::DeserializationError { .. })
		));

		Ok(())
	}

	#[test]
	fn unsupported_extension() -> Result<(), Box<dyn std::error::Error>> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("provision.ini");

		write_file(&path, "")?;

		assert!(Config::from_file(&path).is_err());
		assert!(Config::default().write_to(&path).is_err());

		Ok(())
	}
}
