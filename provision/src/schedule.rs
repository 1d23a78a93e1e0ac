use std::fmt;

use tracing::{debug, info};

use crate::*;

mod lock;
mod store;

pub use lock::*;
pub use store::*;

/// A recurring command registration.
#[derive(Clone, PartialEq, Eq)]
pub struct ScheduledTask {
	/// The token that identifies previous registrations of this task. It is the script's file name.
	pub identity: String,
	/// A five-field cron expression.
	pub schedule: String,
	/// The arguments executed by the task script. They may carry credentials.
	pub command: Vec<String>,
	pub script_path: PathBuf,
	pub log_path: PathBuf,
}

impl fmt::Debug for ScheduledTask {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScheduledTask")
			.field("identity", &self.identity)
			.field("schedule", &self.schedule)
			.field("script_path", &self.script_path)
			.field("log_path", &self.log_path)
			.finish_non_exhaustive()
	}
}

/// Checks that `schedule` has exactly five fields made of `0-9 * , - /`.
pub fn validate_schedule(schedule: &str) -> Result<(), AppError> {
	let invalid = |reason: String| AppError::InvalidSchedule {
		schedule: schedule.to_string(),
		reason,
	};

	let fields: Vec<&str> = schedule.split_whitespace().collect();

	if fields.len() != 5 {
		return Err(invalid(format!(
			"expected 5 fields (minute hour day-of-month month day-of-week), found {}",
			fields.len()
		)));
	}

	for field in fields {
		if let Some(c) = field
			.chars()
			.find(|c| !(c.is_ascii_digit() || matches!(c, '*' | ',' | '-' | '/')))
		{
			return Err(invalid(format!("unexpected character `{c}` in `{field}`")));
		}
	}

	Ok(())
}

/// Quotes a single argument for `sh`. Arguments made only of safe characters are left as they are.
pub fn shell_quote(arg: &str) -> String {
	let is_safe = |c: char| {
		c.is_ascii_alphanumeric()
			|| matches!(c, '-' | '_' | '.' | '/' | ':' | '=' | '@' | ',' | '+' | '%')
	};

	if !arg.is_empty() && arg.chars().all(is_safe) {
		return arg.to_string();
	}

	format!("'{}'", arg.replace('\'', r"'\''"))
}

fn substitute(template: &str, config: &Config, inputs: &Inputs) -> String {
	template
		.replace("{private_key}", inputs.credentials.private_key.expose())
		.replace("{address}", &inputs.credentials.address)
		.replace("{public_ip}", &inputs.public_ip.to_string())
		.replace("{sequencer_network}", &config.sequencer_network)
		.replace("{service}", &config.task.service)
}

impl ScheduledTask {
	/// Builds the task from the config. The command runs inside the configured service of the stack rooted at `inputs.root`.
	pub fn from_config(
		config: &Config,
		inputs: &Inputs,
		topology: &Topology,
	) -> Result<Self, AppError> {
		let task = &config.task;

		task.validate()?;

		if topology.get(&task.service).is_none() {
			return Err(AppError::InvalidInput {
				name: "task.service",
				reason: format!("`{}` is not a service of the topology", task.service),
			});
		}

		let root = &inputs.root;
		let compose_file = root.join(COMPOSE_FILE);

		let mut command = vec![
			"docker".to_string(),
			"compose".to_string(),
			"--project-directory".to_string(),
			root.display().to_string(),
			"-f".to_string(),
			compose_file.display().to_string(),
			"exec".to_string(),
			"-T".to_string(),
			task.service.clone(),
		];

		command.extend(
			task.args
				.iter()
				.map(|arg| substitute(arg, config, inputs)),
		);

		Ok(Self {
			identity: task.identity.clone(),
			schedule: task.schedule.clone(),
			command,
			script_path: root.join(&task.identity),
			log_path: root.join(&task.log_file),
		})
	}

	/// The line registered in the crontab.
	pub fn registration_line(&self) -> String {
		format!(
			"{} {} >> {} 2>&1",
			self.schedule,
			shell_quote(&self.script_path.to_string_lossy()),
			shell_quote(&self.log_path.to_string_lossy())
		)
	}

	/// The contents of the task script.
	pub fn render_script(&self) -> String {
		let command = self
			.command
			.iter()
			.map(|arg| shell_quote(arg))
			.collect::<Vec<_>>()
			.join(" ");

		format!(
			"#!/bin/sh\n# Generated by provision. Changes are overwritten on the next run.\nexec {command}\n"
		)
	}

	/// Writes the task script, readable and executable only by its owner.
	pub fn write_script(&self) -> Result<(), AppError> {
		create_parent_dirs(&self.script_path)?;
		write_file_with_mode(&self.script_path, &self.render_script(), Some(0o700))?;

		debug!(path = %self.script_path.display(), "wrote the task script");

		Ok(())
	}
}

/// Registers `task` in `store`, replacing every previous registration with the same identity.
///
/// The read-filter-replace sequence runs under the store's lock. A failed replace leaves the store as it was.
pub fn install(store: &impl TaskStore, task: &ScheduledTask) -> Result<(), AppError> {
	validate_schedule(&task.schedule)?;

	let _lock = InstallLock::acquire(&store.lock_path())?;

	let current = store.read()?;
	let total = current.len();

	let mut lines: Vec<String> = current
		.into_iter()
		.filter(|line| !line.contains(&task.identity))
		.collect();

	let removed = total - lines.len();

	lines.push(task.registration_line());

	store.replace(&lines)?;

	info!(
		identity = %task.identity,
		schedule = %task.schedule,
		replaced = removed,
		"installed the scheduled task"
	);

	Ok(())
}
