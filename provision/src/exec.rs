use std::{
	io::Write,
	path::Path,
	process::{Command, Stdio},
};

use tracing::debug;

use crate::AppError;

/// Runs external programs on the host.
///
/// Arguments are always passed as a list and never go through a shell.
pub trait CommandRunner {
	/// Returns whether the program could be spawned and exited successfully.
	fn probe(&self, program: &str, args: &[&str]) -> bool;

	/// Runs the program with inherited stdio, failing on a non-zero exit.
	fn run(&self, program: &str, args: &[&str]) -> Result<(), AppError>;

	/// Runs the program and returns its trimmed stdout.
	fn capture(&self, program: &str, args: &[&str]) -> Result<String, AppError>;

	/// Runs the program with `input` written to its stdin.
	fn feed(&self, program: &str, args: &[&str], input: &str) -> Result<(), AppError>;
}

/// A [`CommandRunner`] that spawns real processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
	cwd: Option<std::path::PathBuf>,
}

impl SystemRunner {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn in_dir(cwd: &Path) -> Self {
		Self {
			cwd: Some(cwd.to_path_buf()),
		}
	}

	fn command(&self, program: &str, args: &[&str]) -> Command {
		let mut cmd = Command::new(program);

		cmd.args(args);

		if let Some(cwd) = &self.cwd {
			cmd.current_dir(cwd);
		}

		cmd
	}
}

pub(crate) fn display_command(program: &str, args: &[&str]) -> String {
	let mut parts = vec![program];
	parts.extend_from_slice(args);
	parts.join(" ")
}

impl CommandRunner for SystemRunner {
	fn probe(&self, program: &str, args: &[&str]) -> bool {
		self.command(program, args)
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.status()
			.is_ok_and(|status| status.success())
	}

	fn run(&self, program: &str, args: &[&str]) -> Result<(), AppError> {
		debug!(command = %display_command(program, args), "running");

		let status = self
			.command(program, args)
			.stdout(Stdio::inherit())
			.stderr(Stdio::inherit())
			.status()
			.map_err(|e| AppError::CommandFailed {
				command: display_command(program, args),
				reason: e.to_string(),
			})?;

		if !status.success() {
			return Err(AppError::CommandFailed {
				command: display_command(program, args),
				reason: format!("exited with code {:?}", status.code()),
			});
		}

		Ok(())
	}

	fn capture(&self, program: &str, args: &[&str]) -> Result<String, AppError> {
		let output = self
			.command(program, args)
			.stderr(Stdio::piped())
			.output()
			.map_err(|e| AppError::CommandFailed {
				command: display_command(program, args),
				reason: e.to_string(),
			})?;

		if !output.status.success() {
			return Err(AppError::CommandFailed {
				command: display_command(program, args),
				reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			});
		}

		Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
	}

	fn feed(&self, program: &str, args: &[&str], input: &str) -> Result<(), AppError> {
		debug!(command = %display_command(program, args), "running with piped stdin");

		let command_failed = |reason: String| AppError::CommandFailed {
			command: display_command(program, args),
			reason,
		};

		let mut child = self
			.command(program, args)
			.stdin(Stdio::piped())
			.stdout(Stdio::null())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| command_failed(e.to_string()))?;

		if let Some(mut stdin) = child.stdin.take() {
			stdin
				.write_all(input.as_bytes())
				.map_err(|e| command_failed(e.to_string()))?;
		}

		let output = child
			.wait_with_output()
			.map_err(|e| command_failed(e.to_string()))?;

		if !output.status.success() {
			return Err(command_failed(
				String::from_utf8_lossy(&output.stderr).trim().to_string(),
			));
		}

		Ok(())
	}
}

#[cfg(test)]
pub(crate) mod testing {
	use std::{
		cell::RefCell,
		collections::{HashMap, HashSet},
	};

	use super::*;

	/// Records every invocation instead of spawning processes.
	#[derive(Debug, Default)]
	pub(crate) struct FakeRunner {
		pub calls: RefCell<Vec<String>>,
		pub fed: RefCell<Vec<(String, String)>>,
		/// Commands whose probe succeeds.
		pub present: HashSet<String>,
		/// Stdout returned by `capture`, by command.
		pub outputs: HashMap<String, String>,
		/// Commands that fail, with the reason.
		pub failures: HashMap<String, String>,
	}

	impl FakeRunner {
		fn record(&self, program: &str, args: &[&str]) -> Result<String, AppError> {
			let command = display_command(program, args);

			self.calls.borrow_mut().push(command.clone());

			match self.failures.get(&command) {
				Some(reason) => Err(AppError::CommandFailed {
					command,
					reason: reason.clone(),
				}),
				None => Ok(command),
			}
		}

		pub fn calls(&self) -> Vec<String> {
			self.calls.borrow().clone()
		}
	}

	impl CommandRunner for FakeRunner {
		fn probe(&self, program: &str, args: &[&str]) -> bool {
			let command = display_command(program, args);

			self.calls.borrow_mut().push(command.clone());

			self.present.contains(&command)
		}

		fn run(&self, program: &str, args: &[&str]) -> Result<(), AppError> {
			self.record(program, args).map(|_| ())
		}

		fn capture(&self, program: &str, args: &[&str]) -> Result<String, AppError> {
			let command = self.record(program, args)?;

			Ok(self.outputs.get(&command).cloned().unwrap_or_default())
		}

		fn feed(&self, program: &str, args: &[&str], input: &str) -> Result<(), AppError> {
			let command = self.record(program, args)?;

			self.fed.borrow_mut().push((command, input.to_string()));

			Ok(())
		}
	}
}
