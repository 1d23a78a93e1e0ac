use tracing::debug;

use crate::*;

/// A set of cron registrations that can only be replaced as a whole.
pub trait TaskStore {
	/// Returns the current registrations. A store with no registrations yields an empty list.
	fn read(&self) -> Result<Vec<String>, AppError>;

	/// Replaces every registration with `lines`. On failure the previous set must be left untouched.
	fn replace(&self, lines: &[String]) -> Result<(), AppError>;

	/// The lock file guarding the read-filter-replace sequence.
	fn lock_path(&self) -> PathBuf;
}

fn render_lines(lines: &[String]) -> String {
	let mut content = lines.join("\n");

	// cron ignores a last line without a newline
	content.push('\n');

	content
}

/// The invoking user's crontab, managed through the `crontab` program.
#[derive(Debug)]
pub struct CrontabStore<R: CommandRunner> {
	runner: R,
}

impl<R: CommandRunner> CrontabStore<R> {
	pub fn new(runner: R) -> Self {
		Self { runner }
	}
}

impl<R: CommandRunner> TaskStore for CrontabStore<R> {
	fn read(&self) -> Result<Vec<String>, AppError> {
		match self.runner.capture("crontab", &["-l"]) {
			Ok(output) => Ok(output.lines().map(String::from).collect()),
			Err(AppError::CommandFailed { reason, .. }) if reason.contains("no crontab for") => {
				debug!("the user has no crontab yet");

				Ok(Vec::new())
			}
			Err(e) => Err(AppError::TaskStore(e.to_string())),
		}
	}

	// `crontab -` installs the new table only once it has read all of it
	fn replace(&self, lines: &[String]) -> Result<(), AppError> {
		self.runner
			.feed("crontab", &["-"], &render_lines(lines))
			.map_err(|e| AppError::TaskStore(e.to_string()))
	}

	fn lock_path(&self) -> PathBuf {
		env::temp_dir().join("validator-provision-crontab.lock")
	}
}

/// A file in the crontab format, replaced through a temporary file and a rename.
#[derive(Debug, Clone)]
pub struct FileStore {
	path: PathBuf,
}

impl FileStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl TaskStore for FileStore {
	fn read(&self) -> Result<Vec<String>, AppError> {
		if !self.path.exists() {
			return Ok(Vec::new());
		}

		let content =
			read_file(&self.path).map_err(|e| AppError::TaskStore(e.to_string()))?;

		Ok(content.lines().map(String::from).collect())
	}

	fn replace(&self, lines: &[String]) -> Result<(), AppError> {
		create_parent_dirs(&self.path)
			.and_then(|()| write_file(&self.path, &render_lines(lines)))
			.map_err(|e| AppError::TaskStore(e.to_string()))
	}

	fn lock_path(&self) -> PathBuf {
		let mut name = self
			.path
			.file_name()
			.map(|n| n.to_os_string())
			.unwrap_or_default();

		name.push(".lock");

		self.path.with_file_name(name)
	}
}
