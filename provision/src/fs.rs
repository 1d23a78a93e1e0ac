use std::{
	ffi::OsStr,
	fs::{File, create_dir_all, read_to_string, rename},
	io::Write,
	path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::AppError;

pub(crate) fn get_extension(file: &Path) -> Result<&OsStr, AppError> {
	file.extension().ok_or_else(|| AppError::DeserializationError {
		file: file.to_path_buf(),
		error: format!("File `{}` has no extension", file.display()),
	})
}

pub(crate) fn serialize_toml<T: Serialize>(item: &T, path: &Path) -> Result<(), AppError> {
	let content = toml::to_string_pretty(item).map_err(|e| AppError::SerializationError {
		file: path.to_path_buf(),
		error: e.to_string(),
	})?;

	write_file(path, &content)
}

pub(crate) fn serialize_yaml<T: Serialize>(item: &T, path: &Path) -> Result<(), AppError> {
	let content = serde_yaml_ng::to_string(item).map_err(|e| AppError::SerializationError {
		file: path.to_path_buf(),
		error: e.to_string(),
	})?;

	write_file(path, &content)
}

pub(crate) fn serialize_json<T: Serialize>(item: &T, path: &Path) -> Result<(), AppError> {
	let content =
		serde_json::to_string_pretty(item).map_err(|e| AppError::SerializationError {
			file: path.to_path_buf(),
			error: e.to_string(),
		})?;

	write_file(path, &content)
}

pub(crate) fn deserialize_toml<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
	let contents = read_file(path)?;

	toml::from_str(&contents).map_err(|e| AppError::DeserializationError {
		file: path.to_path_buf(),
		error: e.to_string(),
	})
}

pub(crate) fn deserialize_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
	let contents = read_file(path)?;

	serde_json::from_str(&contents).map_err(|e| AppError::DeserializationError {
		file: path.to_path_buf(),
		error: e.to_string(),
	})
}

pub(crate) fn deserialize_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
	let contents = read_file(path)?;

	serde_yaml_ng::from_str(&contents).map_err(|e| AppError::DeserializationError {
		file: path.to_path_buf(),
		error: e.to_string(),
	})
}

pub(crate) fn read_file(path: &Path) -> Result<String, AppError> {
	read_to_string(path).map_err(|e| AppError::ReadError {
		path: path.to_path_buf(),
		source: e,
	})
}

/// Writes the file through a sibling temporary file and a rename, so that readers never observe a partial write.
pub(crate) fn write_file(path: &Path, content: &str) -> Result<(), AppError> {
	write_file_with_mode(path, content, None)
}

pub(crate) fn write_file_with_mode(
	path: &Path,
	content: &str,
	mode: Option<u32>,
) -> Result<(), AppError> {
	let tmp_path = tmp_sibling(path);

	let write_err = |e| AppError::WriteError {
		path: path.to_path_buf(),
		source: e,
	};

	let mut file = File::create(&tmp_path).map_err(write_err)?;

	#[cfg(unix)]
	if let Some(mode) = mode {
		use std::os::unix::fs::PermissionsExt;

		file.set_permissions(std::fs::Permissions::from_mode(mode))
			.map_err(write_err)?;
	}

	#[cfg(not(unix))]
	let _ = mode;

	file.write_all(content.as_bytes())
		.and_then(|()| file.sync_all())
		.map_err(write_err)?;

	rename(&tmp_path, path).map_err(write_err)
}

fn tmp_sibling(path: &Path) -> PathBuf {
	let mut name = path
		.file_name()
		.map(|n| n.to_os_string())
		.unwrap_or_default();

	name.push(".tmp");

	path.with_file_name(name)
}

pub(crate) fn create_parent_dirs(path: &Path) -> Result<(), AppError> {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => create_all_dirs(parent),
		_ => Ok(()),
	}
}

/// Creates the directory and its parents. Existing directories and their contents are left untouched.
pub(crate) fn create_all_dirs(path: &Path) -> Result<(), AppError> {
	create_dir_all(path).map_err(|e| AppError::DirCreation {
		path: path.to_path_buf(),
		source: e,
	})
}

pub(crate) fn get_abs_path(path: &Path) -> Result<PathBuf, AppError> {
	path.canonicalize()
		.map_err(|e| AppError::PathCanonicalization {
			path: path.into(),
			source: e,
		})
}
