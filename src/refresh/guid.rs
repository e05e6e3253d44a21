use sha2::{Digest, Sha256};

/// The raw identity candidates of one parsed entry, before hashing.
#[derive(Debug, Clone, Default)]
pub struct GuidSource {
	pub guid: Option<String>,
	pub link: Option<String>,
	pub origlink: Option<String>,
}

/// Derives the stable content identity for an entry.
///
/// Picks the first non-blank candidate among the native guid, the canonical
/// link and the original link, in that order, and returns the hex SHA-256 of
/// it. Hashing gives a fixed-width key no matter how long or oddly encoded
/// the source string is, and the link fallback still identifies entries from
/// feeds that never bother with guids.
///
/// When every candidate is blank the digest of the empty string comes back:
/// all guid-less, link-less entries of a feed collide on it. Callers scope
/// lookups per feed so the damage stays local.
pub fn compute(source: &GuidSource) -> String {
	let chosen = [
		source.guid.as_deref(),
		source.link.as_deref(),
		source.origlink.as_deref(),
	]
	.into_iter()
	.flatten()
	.map(str::trim)
	.find(|candidate| !candidate.is_empty())
	.unwrap_or("");

	let digest = Sha256::digest(chosen.as_bytes());
	format!("{digest:x}")
}

#[cfg(test)]
mod tests {
	use super::*;

	fn from_guid(guid: &str) -> GuidSource {
		GuidSource {
			guid: Some(guid.to_owned()),
			..GuidSource::default()
		}
	}

	fn from_link(link: &str) -> GuidSource {
		GuidSource {
			link: Some(link.to_owned()),
			..GuidSource::default()
		}
	}

	#[test]
	fn same_input_same_digest() {
		assert_eq!(compute(&from_guid("g")), compute(&from_guid("g")));
	}

	#[test]
	fn distinct_links_do_not_collide() {
		assert_ne!(compute(&from_link("http://x")), compute(&from_link("http://y")));
	}

	#[test]
	fn native_guid_wins_over_link() {
		let both = GuidSource {
			guid: Some("g".to_owned()),
			link: Some("http://x".to_owned()),
			origlink: None,
		};
		assert_eq!(compute(&both), compute(&from_guid("g")));
	}

	#[test]
	fn blank_guid_falls_through_to_link() {
		let blank_guid = GuidSource {
			guid: Some("   ".to_owned()),
			link: Some("http://x".to_owned()),
			origlink: None,
		};
		assert_eq!(compute(&blank_guid), compute(&from_link("http://x")));
	}

	#[test]
	fn all_blank_input_yields_the_empty_digest() {
		// sha256 of the empty string, the documented degenerate identity
		assert_eq!(
			compute(&GuidSource::default()),
			"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
		);
	}

	#[test]
	fn digest_is_fixed_width_hex() {
		let digest = compute(&from_link("http://example.com/some/very/long/path?with=query"));
		assert_eq!(digest.len(), 64);
		assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
	}
}
