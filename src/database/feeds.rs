use diesel::prelude::*;
use serde::Deserialize;

use super::models::{Feed, FeedId, NewFeed};
use super::schema::{feed_groups, feeds};
use super::{StoreError, StoreResult, items};

/// User-supplied feed metadata, before the store assigns id/timestamps.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedDraft {
	pub title: String,
	pub url: String,
}

pub fn list(conn: &mut SqliteConnection) -> StoreResult<Vec<Feed>> {
	let rows = feeds::table
		.select(Feed::as_select())
		.order(feeds::id.asc())
		.load(conn)?;
	Ok(rows)
}

pub fn get(id: FeedId, conn: &mut SqliteConnection) -> StoreResult<Option<Feed>> {
	let feed = feeds::table
		.find(id)
		.select(Feed::as_select())
		.first(conn)
		.optional()?;
	Ok(feed)
}

pub fn create(draft: &FeedDraft, now: i64, conn: &mut SqliteConnection) -> StoreResult<Feed> {
	let feed = NewFeed {
		title: &draft.title,
		url: &draft.url,
		added_on: now,
		last_updated: now,
	}
	.insert_into(feeds::table)
	.returning(Feed::as_returning())
	.get_result(conn)?;

	Ok(feed)
}

/// Overwrites title/url and bumps `last_updated`. `added_on` is set once at
/// creation and never touched again.
pub fn update(
	id: FeedId,
	draft: &FeedDraft,
	now: i64,
	conn: &mut SqliteConnection,
) -> StoreResult<Option<Feed>> {
	let affected = diesel::update(feeds::table.find(id))
		.set((
			feeds::title.eq(&draft.title),
			feeds::url.eq(&draft.url),
			feeds::last_updated.eq(now),
		))
		.execute(conn)?;

	if affected == 0 {
		return Ok(None);
	}
	get(id, conn)
}

/// Deleting a feed cascades over its items and its group memberships in one
/// transaction.
pub fn delete(id: FeedId, conn: &mut SqliteConnection) -> StoreResult<()> {
	conn.transaction(|conn| {
		diesel::delete(feed_groups::table.filter(feed_groups::feed_id.eq(id))).execute(conn)?;
		items::delete_for_feed(id, conn)?;

		let affected = diesel::delete(feeds::table.find(id)).execute(conn)?;
		if affected == 0 {
			return Err(StoreError::MissingRow);
		}
		Ok(())
	})
}
