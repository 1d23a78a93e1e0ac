use std::{net::IpAddr, time::Duration};

use reqwest::Client;
use tracing::{debug, warn};

use crate::*;

const ATTEMPTS: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const BACKOFF: Duration = Duration::from_secs(2);

/// Queries `url` for this host's public IP, retrying a bounded number of times.
///
/// The endpoint must answer with the bare address in the body.
pub async fn discover_public_ip(url: &str) -> Result<IpAddr, AppError> {
	let client = Client::builder()
		.timeout(REQUEST_TIMEOUT)
		.build()
		.map_err(|e| AppError::IpDiscovery(e.to_string()))?;

	let mut last_error = String::new();

	for attempt in 1..=ATTEMPTS {
		match lookup(&client, url).await {
			Ok(ip) => {
				debug!(attempt, "public IP discovered");
				return Ok(ip);
			}
			Err(e) => {
				warn!(attempt, error = %e, "public IP lookup failed");
				last_error = e;
			}
		}

		if attempt < ATTEMPTS {
			tokio::time::sleep(BACKOFF * attempt).await;
		}
	}

	Err(AppError::IpDiscovery(format!(
		"{last_error} (after {ATTEMPTS} attempts against {url})"
	)))
}

async fn lookup(client: &Client, url: &str) -> Result<IpAddr, String> {
	let response = client
		.get(url)
		.send()
		.await
		.and_then(|r| r.error_for_status())
		.map_err(|e| e.to_string())?;

	let body = response.text().await.map_err(|e| e.to_string())?;

	parse_ip(&body)
}

pub(crate) fn parse_ip(body: &str) -> Result<IpAddr, String> {
	let trimmed = body.trim();

	if trimmed.is_empty() {
		return Err("the lookup service returned an empty response".to_string());
	}

	trimmed
		.parse()
		.map_err(|_| format!("the lookup service returned `{trimmed}`, which is not an IP address"))
}
