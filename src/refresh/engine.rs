use futures::stream::{self, StreamExt};
use itertools::Itertools;
use tokio::sync::Mutex;

use crate::database::models::Feed;
use crate::database::{PoolConnection, feeds, items};
use crate::fetcher::Fetcher;
use crate::utils::unix_now;

use super::error::RefreshError;
use super::normalize;

/// Orchestrates one refresh tick: fan out over every subscribed feed,
/// fetch + parse + reconcile each one independently, and report per-feed
/// failures without letting any of them sink the batch.
pub struct RefreshEngine {
	db_pool: PoolConnection,
	fetcher: Fetcher,
	retention_secs: i64,
	max_concurrent_fetches: usize,
	tick_lock: Mutex<()>,
}

/// What one feed's reconcile pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
	pub inserted: usize,
	pub updated: usize,
	/// Entries dropped on first sighting because they were already past the
	/// retention horizon.
	pub expired: usize,
}

impl RefreshEngine {
	pub fn new(
		db_pool: PoolConnection,
		fetcher: Fetcher,
		retention_secs: i64,
		max_concurrent_fetches: usize,
	) -> Self {
		Self {
			db_pool,
			fetcher,
			retention_secs,
			max_concurrent_fetches: max_concurrent_fetches.max(1),
			tick_lock: Mutex::new(()),
		}
	}

	/// Runs one full tick. Always comes back `Ok` once the feed list could
	/// be loaded: per-feed failures are logged and aggregated, never
	/// propagated. Ticks are serialized; a manual trigger arriving while a
	/// scheduled tick runs simply waits its turn.
	pub async fn run_once(&self) -> Result<(), RefreshError> {
		let _tick = self.tick_lock.lock().await;

		let all_feeds = {
			let mut conn = self.db_pool.get()?;
			feeds::list(&mut conn)?
		};

		tracing::info!(feeds = all_feeds.len(), "starting refresh tick");

		let outcomes = stream::iter(all_feeds)
			.map(|feed| async move {
				let outcome = self.refresh_feed(&feed).await;
				(feed, outcome)
			})
			.buffer_unordered(self.max_concurrent_fetches)
			.collect::<Vec<_>>()
			.await;

		let mut failed = Vec::new();
		for (feed, outcome) in outcomes {
			match outcome {
				Ok(summary) => tracing::info!(
					feed = %feed.title,
					url = %feed.url,
					inserted = summary.inserted,
					updated = summary.updated,
					expired = summary.expired,
					"refreshed feed"
				),
				Err(err) => {
					tracing::error!(
						feed = %feed.title,
						url = %feed.url,
						err = %err,
						"could not refresh feed"
					);
					failed.push(feed.title);
				}
			}
		}

		if failed.is_empty() {
			tracing::info!("refresh tick finished");
		} else {
			tracing::warn!(
				"refresh tick finished with failed feeds: {}",
				failed.iter().join(", ")
			);
		}

		Ok(())
	}

	async fn refresh_feed(&self, feed: &Feed) -> Result<ReconcileSummary, RefreshError> {
		let Some(payload) = self.fetcher.fetch(&feed.url).await? else {
			// non-200 means "nothing to ingest this tick", not a failure
			tracing::info!(feed = %feed.title, url = %feed.url, "no payload, skipping");
			return Ok(ReconcileSummary::default());
		};

		let entries = normalize::normalize(&payload)?;
		self.reconcile(feed, &entries)
	}

	fn reconcile(
		&self,
		feed: &Feed,
		entries: &[normalize::NormalizedItem],
	) -> Result<ReconcileSummary, RefreshError> {
		let cutoff = unix_now() - self.retention_secs;
		let mut conn = self.db_pool.get()?;
		let mut summary = ReconcileSummary::default();

		for entry in entries {
			// anti-backfill: entries already past the horizon are not worth
			// storing just to sweep them later. Entries without a publish
			// date pass through; only the sweeper ever expires those.
			if entry.published.is_some_and(|published| published <= cutoff) {
				summary.expired += 1;
				continue;
			}

			if items::find_by_guid(feed.id, &entry.guid, &mut conn)?.is_some() {
				items::update(entry, feed.id, &mut conn)?;
				summary.updated += 1;
			} else {
				items::insert(entry, feed.id, &mut conn)?;
				summary.inserted += 1;
			}
		}

		Ok(summary)
	}
}
