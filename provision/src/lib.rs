#![allow(clippy::result_large_err)]
//! Provisions a single-host validator stack.
//!
//! The stack is described by a [`Topology`], rendered as a Docker Compose file and a Prometheus scrape config,
//! and kept alive by a scheduled task that is registered exactly once per host.

use std::{
	env,
	path::{Path, PathBuf},
};

use anyhow::{Context, anyhow};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub(crate) mod fs;
pub mod inputs;
pub mod ip;
pub mod metrics;
pub mod runtime;
pub mod schedule;
pub mod secret;
pub mod stack;
pub mod topology;

pub use config::*;
pub use errors::*;
pub use exec::*;
pub(crate) use fs::*;
pub use inputs::*;
pub use ip::*;
pub use runtime::*;
pub use schedule::*;
pub use secret::*;
pub use stack::*;
pub use topology::*;
