use std::{io, path::PathBuf};

use thiserror::Error;

/// The kinds of errors that can occur during provisioning.
#[derive(Debug, Error)]
pub enum AppError {
	// I/O errors
	#[error("Could not create the dir `{path}`: {source}")]
	DirCreation { path: PathBuf, source: io::Error },

	#[error("Failed to create or write to the file `{path}`: {source}")]
	WriteError { path: PathBuf, source: io::Error },

	#[error("Could not read the contents of `{path}`: {source}")]
	ReadError { path: PathBuf, source: io::Error },

	#[error("Failed to canonicalize the path `{path}`: {source}")]
	PathCanonicalization { path: PathBuf, source: io::Error },

	// Inputs
	#[error("Missing required input `{0}`")]
	MissingInput(&'static str),

	#[error("Invalid value for `{name}`: {reason}")]
	InvalidInput { name: &'static str, reason: String },

	#[error(
		"Could not discover the public IP of this host: {0}. Pass it explicitly with `--public-ip`"
	)]
	IpDiscovery(String),

	#[error("The shared secret at `{path}` is invalid: {reason}. Remove it to generate a new one")]
	InvalidSecret { path: PathBuf, reason: String },

	// Topology
	#[error(
		"Host port {port}/{protocol} is published by both `{first}` and `{second}`"
	)]
	PortCollision {
		port: u16,
		protocol: String,
		first: String,
		second: String,
	},

	#[error("Host path `{path}` is bound read-write by both `{first}` and `{second}`")]
	PathCollision {
		path: PathBuf,
		first: String,
		second: String,
	},

	#[error("Service `{service}` depends on `{dependency}`, which is not defined")]
	UnknownDependency { service: String, dependency: String },

	#[error("{0}")]
	CircularDependency(String),

	#[error("Invalid port override `{service}:{container_port}`: {reason}")]
	UnknownOverride {
		service: String,
		container_port: u16,
		reason: String,
	},

	// Host state
	#[error("Invalid schedule `{schedule}`: {reason}")]
	InvalidSchedule { schedule: String, reason: String },

	#[error("Could not update the scheduled tasks: {0}")]
	TaskStore(String),

	#[error(
		"The lock `{0}` is held by another provisioning run. If no other run is active, remove it and retry"
	)]
	LockHeld(PathBuf),

	#[error("Failed to install the container runtime at step `{step}`: {reason}")]
	RuntimeInstall { step: String, reason: String },

	#[error("Command `{command}` failed: {reason}")]
	CommandFailed { command: String, reason: String },

	// Serde errors
	#[error("Error while serializing the content for `{file:?}`: {error}")]
	SerializationError { file: PathBuf, error: String },

	#[error("Error while deserializing the contents of `{file:?}`: {error}")]
	DeserializationError { file: PathBuf, error: String },

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}
