use tracing::info;

use crate::*;

/// The size of the shared secret, in bytes.
pub const SECRET_LEN: usize = 32;

/// The file name of the shared secret inside the provisioning root.
pub const SECRET_FILE: &str = "jwt.hex";

/// Whether [`ensure_shared_secret`] created the file or found a valid one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretState {
	Generated,
	Reused,
}

/// Makes sure a valid shared secret exists at `path`.
///
/// An existing secret is kept: services that already share it keep trusting each other.
/// A file that does not hold exactly [`SECRET_LEN`] hex-encoded bytes is an error, never silently replaced.
pub fn ensure_shared_secret(path: &Path) -> Result<SecretState, AppError> {
	if path.exists() {
		read_shared_secret(path)?;

		info!(path = %path.display(), "reusing the existing shared secret");

		return Ok(SecretState::Reused);
	}

	let mut bytes = [0u8; SECRET_LEN];

	getrandom::getrandom(&mut bytes)
		.map_err(|e| anyhow!("Could not gather randomness for the shared secret: {e}"))?;

	create_parent_dirs(path)?;
	write_file_with_mode(path, &hex::encode(bytes), Some(0o600))?;

	info!(path = %path.display(), "generated a new shared secret");

	Ok(SecretState::Generated)
}

/// Reads and decodes the secret at `path`.
pub fn read_shared_secret(path: &Path) -> Result<[u8; SECRET_LEN], AppError> {
	let content = read_file(path)?;

	let invalid = |reason: String| AppError::InvalidSecret {
		path: path.to_path_buf(),
		reason,
	};

	let trimmed = content.trim();
	let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);

	let bytes = hex::decode(trimmed).map_err(|e| invalid(e.to_string()))?;

	bytes
		.try_into()
		.map_err(|bytes: Vec<u8>| invalid(format!("expected {SECRET_LEN} bytes, found {}", bytes.len())))
}
