use tracing::{debug, info};

use crate::*;

const DOCKER_GPG_URL: &str = "https://download.docker.com/linux/ubuntu/gpg";
const DOCKER_APT_URL: &str = "https://download.docker.com/linux/ubuntu";

/// Installs Docker Engine and the Compose plugin from Docker's apt repository.
#[derive(Debug, Clone)]
pub struct RuntimeInstaller {
	pub keyring: PathBuf,
	pub sources_list: PathBuf,
	pub os_release: PathBuf,
}

impl Default for RuntimeInstaller {
	fn default() -> Self {
		Self {
			keyring: PathBuf::from("/etc/apt/keyrings/docker.asc"),
			sources_list: PathBuf::from("/etc/apt/sources.list.d/docker.list"),
			os_release: PathBuf::from("/etc/os-release"),
		}
	}
}

/// Whether [`RuntimeInstaller::ensure_runtime_present`] had to install anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
	AlreadyPresent,
	Installed,
}

/// Extracts `VERSION_CODENAME` from the contents of an os-release file.
pub(crate) fn version_codename(os_release: &str) -> Option<String> {
	os_release.lines().find_map(|line| {
		let value = line.trim().strip_prefix("VERSION_CODENAME=")?;
		let value = value.trim_matches(|c| c == '"' || c == '\'');

		(!value.is_empty()).then(|| value.to_string())
	})
}

fn step_failed(step: &str) -> impl FnOnce(AppError) -> AppError + '_ {
	move |e| AppError::RuntimeInstall {
		step: step.to_string(),
		reason: e.to_string(),
	}
}

impl RuntimeInstaller {
	/// Checks for `docker` and the Compose plugin, installing them when either one is missing.
	///
	/// Safe to call on every run: when both are present, nothing else is executed.
	pub fn ensure_runtime_present(
		&self,
		runner: &impl CommandRunner,
	) -> Result<RuntimeState, AppError> {
		if runner.probe("docker", &["--version"]) && runner.probe("docker", &["compose", "version"])
		{
			debug!("the container runtime is already installed");

			return Ok(RuntimeState::AlreadyPresent);
		}

		info!("installing the container runtime");

		self.install(runner)?;

		info!("installed the container runtime");

		Ok(RuntimeState::Installed)
	}

	fn install(&self, runner: &impl CommandRunner) -> Result<(), AppError> {
		let keyring = self.keyring.to_string_lossy().into_owned();

		runner
			.run("apt-get", &["update"])
			.map_err(step_failed("update the package index"))?;

		runner
			.run("apt-get", &["install", "-y", "ca-certificates", "curl"])
			.map_err(step_failed("install the prerequisites"))?;

		if let Some(parent) = self.keyring.parent() {
			create_all_dirs(parent).map_err(step_failed("create the keyring directory"))?;
		}

		runner
			.run("curl", &["-fsSL", DOCKER_GPG_URL, "-o", keyring.as_str()])
			.map_err(step_failed("download the repository key"))?;

		let arch = runner
			.capture("dpkg", &["--print-architecture"])
			.map_err(step_failed("detect the architecture"))?;

		let codename = read_file(&self.os_release)
			.ok()
			.as_deref()
			.and_then(version_codename)
			.ok_or_else(|| AppError::RuntimeInstall {
				step: "detect the distribution".to_string(),
				reason: format!(
					"`VERSION_CODENAME` is missing from `{}`",
					self.os_release.display()
				),
			})?;

		let source = format!(
			"deb [arch={arch} signed-by={keyring}] {DOCKER_APT_URL} {codename} stable\n"
		);

		create_parent_dirs(&self.sources_list)
			.and_then(|()| write_file(&self.sources_list, &source))
			.map_err(step_failed("register the repository"))?;

		runner
			.run("apt-get", &["update"])
			.map_err(step_failed("update the package index"))?;

		runner
			.run(
				"apt-get",
				&[
					"install",
					"-y",
					"docker-ce",
					"docker-ce-cli",
					"containerd.io",
					"docker-buildx-plugin",
					"docker-compose-plugin",
				],
			)
			.map_err(step_failed("install the packages"))?;

		runner
			.run("systemctl", &["enable", "--now", "docker"])
			.map_err(step_failed("enable the service"))?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use maplit::{hashmap, hashset};
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::exec::testing::FakeRunner;

	fn installer(dir: &Path) -> RuntimeInstaller {
		let os_release = dir.join("os-release");

		write_file(
			&os_release,
			"NAME=\"Ubuntu\"\nVERSION_ID=\"24.04\"\nVERSION_CODENAME=noble\n",
		)
		.unwrap();

		RuntimeInstaller {
			keyring: dir.join("keyrings/docker.asc"),
			sources_list: dir.join("sources.list.d/docker.list"),
			os_release,
		}
	}

	#[test]
	fn present_runtime_is_a_no_op() {
		let dir = tempfile::tempdir().unwrap();

		let runner = FakeRunner {
			present: hashset! {
				"docker --version".to_string(),
				"docker compose version".to_string(),
			},
			..Default::default()
		};

		let state = installer(dir.path())
			.ensure_runtime_present(&runner)
			.unwrap();

		assert_eq!(state, RuntimeState::AlreadyPresent);
		assert_eq!(
			runner.calls(),
			vec!["docker --version", "docker compose version"]
		);
		assert!(!dir.path().join("sources.list.d").exists());
	}

	#[test]
	fn missing_runtime_is_installed() {
		let dir = tempfile::tempdir().unwrap();
		let installer = installer(dir.path());

		let runner = FakeRunner {
			outputs: hashmap! {
				"dpkg --print-architecture".to_string() => "amd64".to_string(),
			},
			..Default::default()
		};

		let state = installer.ensure_runtime_present(&runner).unwrap();

		assert_eq!(state, RuntimeState::Installed);

		let keyring = installer.keyring.display().to_string();

		assert_eq!(
			runner.calls(),
			vec![
				"docker --version".to_string(),
				"apt-get update".to_string(),
				"apt-get install -y ca-certificates curl".to_string(),
				format!("curl -fsSL {DOCKER_GPG_URL} -o {keyring}"),
				"dpkg --print-architecture".to_string(),
				"apt-get update".to_string(),
				"apt-get install -y docker-ce docker-ce-cli containerd.io docker-buildx-plugin docker-compose-plugin".to_string(),
				"systemctl enable --now docker".to_string(),
			]
		);

		assert_eq!(
			read_file(&installer.sources_list).unwrap(),
			format!("deb [arch=amd64 signed-by={keyring}] {DOCKER_APT_URL} noble stable\n")
		);
		assert!(dir.path().join("keyrings").is_dir());
	}

	#[test]
	fn missing_compose_plugin_triggers_install() {
		let dir = tempfile::tempdir().unwrap();

		let runner = FakeRunner {
			present: hashset! { "docker --version".to_string() },
			..Default::default()
		};

		assert_eq!(
			installer(dir.path())
				.ensure_runtime_present(&runner)
				.unwrap(),
			RuntimeState::Installed
		);
		assert!(
			runner
				.calls()
				.contains(&"systemctl enable --now docker".to_string())
		);
	}

	#[test]
	fn failed_step_is_named() {
		let dir = tempfile::tempdir().unwrap();

		let runner = FakeRunner {
			failures: hashmap! {
				"apt-get install -y ca-certificates curl".to_string() => "dpkg lock held".to_string(),
			},
			..Default::default()
		};

		let err = installer(dir.path())
			.ensure_runtime_present(&runner)
			.unwrap_err();

		match err {
			AppError::RuntimeInstall { step, reason } => {
				assert_eq!(step, "install the prerequisites");
				assert!(reason.contains("dpkg lock held"));
			}
			other => panic!("expected a runtime install error, got {other:?}"),
		}

		assert!(
			!runner
				.calls()
				.iter()
				.any(|c| c.starts_with("systemctl"))
		);
	}

	#[test]
	fn codename_parsing() {
		assert_eq!(
			version_codename("ID=debian\nVERSION_CODENAME=\"bookworm\"\n").as_deref(),
			Some("bookworm")
		);
		assert_eq!(version_codename("ID=debian\nVERSION_CODENAME=\n"), None);
		assert_eq!(version_codename("ID=arch\n"), None);
	}
}
