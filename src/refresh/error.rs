use crate::database::StoreError;
use crate::fetcher::FetchError;

/// Malformed feed payload: neither syntax could make sense of it.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
	#[error("not a valid rss ({rss}) or atom ({atom}) payload")]
	Syntax {
		rss: rss::Error,
		atom: atom_syndication::Error,
	},
}

/// Everything that can sink one feed's pipeline during a tick. Callers catch
/// this at the per-feed boundary; it never fails the tick as a whole.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
	#[error(transparent)]
	Fetch(#[from] FetchError),

	#[error("parse: {0}")]
	Parse(#[from] ParseError),

	#[error("store: {0}")]
	Store(#[from] StoreError),

	#[error("pool: {0}")]
	DbPool(#[from] diesel::r2d2::PoolError),
}
