use std::{
	fs::{File, OpenOptions, TryLockError},
	io::{Seek, Write},
	thread,
	time::Duration,
};

use tracing::{debug, warn};

use crate::*;

const LOCK_ATTEMPTS: u32 = 20;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(100);

/// An exclusive advisory lock on a lock file.
///
/// The kernel releases it when the holding process exits, so a run that was killed
/// never blocks the next one. The file itself is left in place.
#[derive(Debug)]
pub struct InstallLock {
	path: PathBuf,
	file: File,
}

impl InstallLock {
	/// Locks the file, retrying for a bounded time while another run holds it.
	pub fn acquire(path: &Path) -> Result<Self, AppError> {
		Self::acquire_with(path, LOCK_ATTEMPTS, LOCK_RETRY_DELAY)
	}

	pub(crate) fn acquire_with(
		path: &Path,
		attempts: u32,
		delay: Duration,
	) -> Result<Self, AppError> {
		create_parent_dirs(path)?;

		let write_err = |e| AppError::WriteError {
			path: path.to_path_buf(),
			source: e,
		};

		let mut file = OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.truncate(false)
			.open(path)
			.map_err(write_err)?;

		for attempt in 1..=attempts {
			match file.try_lock() {
				Ok(()) => {
					// Informational only, the lock is what matters
					let _ = file
						.set_len(0)
						.and_then(|()| file.rewind())
						.and_then(|()| writeln!(file, "{}", std::process::id()));

					debug!(path = %path.display(), "acquired the install lock");

					return Ok(Self {
						path: path.to_path_buf(),
						file,
					});
				}
				Err(TryLockError::WouldBlock) => {
					if attempt == 1 {
						warn!(path = %path.display(), "waiting for another provisioning run to release the lock");
					}

					if attempt < attempts {
						thread::sleep(delay);
					}
				}
				Err(TryLockError::Error(e)) => return Err(write_err(e)),
			}
		}

		Err(AppError::LockHeld(path.to_path_buf()))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

// Removing the file here would let a waiting run lock an unlinked inode
impl Drop for InstallLock {
	fn drop(&mut self) {
		if let Err(e) = self.file.unlock() {
			warn!(path = %self.path.display(), "failed to release the install lock: {e}");
		}
	}
}
