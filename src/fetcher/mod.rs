use std::time::Duration;

use bytes::Bytes;
use eyre::WrapErr;
use reqwest::{Client, StatusCode};

mod error;

pub use self::error::FetchError;

/// Outbound HTTP client for feed payloads. Built once at startup and shared
/// by every per-feed pipeline; reqwest handles connection reuse internally.
#[derive(Debug, Clone)]
pub struct Fetcher {
	client: Client,
}

impl Fetcher {
	pub fn new(timeout: Duration) -> eyre::Result<Self> {
		let user_agent = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
		let client = Client::builder()
			.user_agent(user_agent)
			.timeout(timeout)
			.build()
			.wrap_err("could not build http client")?;

		Ok(Self { client })
	}

	/// Issues a single GET. Every HTTP status is a successful transport
	/// exchange: a non-200 answer yields `Ok(None)` so the caller can skip
	/// the feed without treating it as a failure. Only transport-level
	/// problems (DNS, refused connection, timeout) become a [`FetchError`].
	pub async fn fetch(&self, url: &str) -> Result<Option<Bytes>, FetchError> {
		let response = self
			.client
			.get(url)
			.send()
			.await
			.map_err(|source| FetchError::new(url, source))?;

		let status = response.status();
		if status != StatusCode::OK {
			tracing::debug!(url, status = %status, "non-200 response, skipping payload");
			return Ok(None);
		}

		let body = response
			.bytes()
			.await
			.map_err(|source| FetchError::new(url, source))?;

		Ok(Some(body))
	}
}
