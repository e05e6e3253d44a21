/// Transport-level fetch failure, tagged with the url for diagnostics.
#[derive(Debug, thiserror::Error)]
#[error("fetch {url}: {source}")]
pub struct FetchError {
	pub url: String,
	#[source]
	pub source: reqwest::Error,
}

impl FetchError {
	pub fn new(url: &str, source: reqwest::Error) -> Self {
		Self {
			url: url.to_owned(),
			source,
		}
	}
}
