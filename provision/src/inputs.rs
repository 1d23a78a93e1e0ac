use std::{
	convert::Infallible,
	fmt,
	io::{self, BufRead, IsTerminal, Write},
	net::IpAddr,
	str::FromStr,
	sync::LazyLock,
};

use regex::Regex;

use crate::*;

static HEX_VALUE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]+$").expect("valid regex"));

/// A value that must never show up in logs or debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw value.
	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl FromStr for SecretString {
	type Err = Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::new(s))
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("<redacted>")
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("<redacted>")
	}
}

/// The validator's identity: the signing key and the address it attests for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	pub private_key: SecretString,
	pub address: String,
}

impl Credentials {
	/// Validates and trims the raw values.
	pub fn new(private_key: &str, address: &str) -> Result<Self, AppError> {
		let private_key = validate_hex("private_key", private_key)?;
		let address = validate_hex("address", address)?;

		Ok(Self {
			private_key: SecretString::new(private_key),
			address,
		})
	}
}

fn validate_hex(name: &'static str, raw: &str) -> Result<String, AppError> {
	let value = raw.trim();

	if value.is_empty() {
		return Err(AppError::MissingInput(name));
	}

	if !HEX_VALUE.is_match(value) {
		return Err(AppError::InvalidInput {
			name,
			reason: "expected a 0x-prefixed hex string".to_string(),
		});
	}

	Ok(value.to_string())
}

/// Everything the topology is generated from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inputs {
	pub credentials: Credentials,
	pub public_ip: IpAddr,
	/// The provisioning root. Every host path in the topology is relative to it.
	pub root: PathBuf,
	/// The location of the shared secret. It must exist before the topology is generated.
	pub secret_path: PathBuf,
}

/// The raw sources for the credentials, in order of precedence.
#[derive(Clone, Debug, Default)]
pub struct CredentialSources {
	pub private_key: Option<SecretString>,
	pub private_key_file: Option<PathBuf>,
	pub address: Option<String>,
}

impl CredentialSources {
	/// Resolves the credentials, prompting on stdin for anything that was not provided.
	///
	/// The prompt is skipped when stdin is not a terminal, in which case missing values are an error.
	pub fn resolve(self) -> Result<Credentials, AppError> {
		let stdin = io::stdin();
		let interactive = stdin.is_terminal();

		self.resolve_with(&mut stdin.lock(), interactive)
	}

	pub(crate) fn resolve_with(
		self,
		reader: &mut impl BufRead,
		interactive: bool,
	) -> Result<Credentials, AppError> {
		let private_key = if let Some(key) = self.private_key {
			key.expose().to_string()
		} else if let Some(file) = &self.private_key_file {
			read_file(file)?
		} else if interactive {
			prompt(reader, "Validator private key: ")?
		} else {
			return Err(AppError::MissingInput("private_key"));
		};

		let address = if let Some(address) = self.address {
			address
		} else if interactive {
			prompt(reader, "Validator address: ")?
		} else {
			return Err(AppError::MissingInput("address"));
		};

		Credentials::new(&private_key, &address)
	}
}

fn prompt(reader: &mut impl BufRead, label: &str) -> Result<String, AppError> {
	let mut stderr = io::stderr();

	let _ = write!(stderr, "{label}");
	let _ = stderr.flush();

	let mut line = String::new();

	reader
		.read_line(&mut line)
		.context("Failed to read from stdin")?;

	Ok(line.trim().to_string())
}
