use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable};

use crate::refresh::normalize::NormalizedItem;

use super::models::{FeedId, Item, ItemId, ItemRow, NewItem};
use super::schema::items;
use super::{StoreError, StoreResult};

diesel::define_sql_function! {
	fn coalesce(a: Nullable<BigInt>, b: Nullable<BigInt>) -> Nullable<BigInt>;
}

/// Which status flag a bulk update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusField {
	Read,
	Starred,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ItemFilter {
	pub feed_id: Option<FeedId>,
	pub read: Option<bool>,
	pub starred: Option<bool>,
}

/// Lookup by the derived content identity, scoped to one feed so that two
/// guid-less feeds hashing to the same digest cannot shadow each other.
pub fn find_by_guid(
	feed_id: FeedId,
	guid: &str,
	conn: &mut SqliteConnection,
) -> StoreResult<Option<Item>> {
	let row = items::table
		.filter(items::feed_id.eq(feed_id))
		.filter(items::guid.eq(guid))
		.select(ItemRow::as_select())
		.first(conn)
		.optional()?;

	row.map(ItemRow::into_item).transpose().map_err(Into::into)
}

pub fn get_by_id(id: ItemId, conn: &mut SqliteConnection) -> StoreResult<Option<Item>> {
	let row = items::table
		.find(id)
		.select(ItemRow::as_select())
		.first(conn)
		.optional()?;

	row.map(ItemRow::into_item).transpose().map_err(Into::into)
}

pub fn list(filter: ItemFilter, conn: &mut SqliteConnection) -> StoreResult<Vec<Item>> {
	let mut query = items::table.select(ItemRow::as_select()).into_boxed();

	if let Some(feed_id) = filter.feed_id {
		query = query.filter(items::feed_id.eq(feed_id));
	}
	if let Some(read) = filter.read {
		query = query.filter(items::read.eq(read));
	}
	if let Some(starred) = filter.starred {
		query = query.filter(items::starred.eq(starred));
	}

	let rows = query.order(items::id.asc()).load::<ItemRow>(conn)?;
	rows.into_iter()
		.map(|row| row.into_item().map_err(Into::into))
		.collect()
}

pub fn insert(
	entry: &NormalizedItem,
	feed_id: FeedId,
	conn: &mut SqliteConnection,
) -> StoreResult<Item> {
	let row = to_new_item(entry, feed_id)?
		.insert_into(items::table)
		.returning(ItemRow::as_returning())
		.get_result::<ItemRow>(conn)?;

	row.into_item().map_err(Into::into)
}

/// Full overwrite of the content fields by `(feed_id, guid)`. The row's
/// `read`/`starred` flags are user state and are deliberately left alone.
pub fn update(
	entry: &NormalizedItem,
	feed_id: FeedId,
	conn: &mut SqliteConnection,
) -> StoreResult<Item> {
	let new_item = to_new_item(entry, feed_id)?;

	let affected = diesel::update(
		items::table
			.filter(items::feed_id.eq(feed_id))
			.filter(items::guid.eq(&entry.guid)),
	)
	.set((
		items::title.eq(new_item.title),
		items::description.eq(new_item.description),
		items::summary.eq(new_item.summary),
		items::link.eq(new_item.link),
		items::author.eq(new_item.author),
		items::comments.eq(new_item.comments),
		items::image.eq(new_item.image),
		items::categories.eq(new_item.categories),
		items::enclosures.eq(new_item.enclosures),
		items::published.eq(new_item.published),
		items::updated.eq(new_item.updated),
	))
	.execute(conn)?;

	if affected == 0 {
		return Err(StoreError::MissingRow);
	}

	find_by_guid(feed_id, &entry.guid, conn)?.ok_or(StoreError::MissingRow)
}

/// Bulk flag update. Signals an error when fewer rows changed than ids were
/// given, so a caller passing a stale id hears about it.
pub fn set_status(
	ids: &[ItemId],
	field: StatusField,
	value: bool,
	conn: &mut SqliteConnection,
) -> StoreResult<usize> {
	let target = items::table.filter(items::id.eq_any(ids));
	let affected = match field {
		StatusField::Read => diesel::update(target).set(items::read.eq(value)).execute(conn)?,
		StatusField::Starred => diesel::update(target)
			.set(items::starred.eq(value))
			.execute(conn)?,
	};

	if affected != ids.len() {
		return Err(StoreError::StatusUpdate {
			affected,
			expected: ids.len(),
		});
	}
	Ok(affected)
}

/// Hard-deletes unstarred items whose effective timestamp (published, falling
/// back to updated) is at or before the cutoff. Items with neither timestamp
/// are kept: there is nothing to compare them against.
pub fn delete_expired(cutoff: i64, conn: &mut SqliteConnection) -> StoreResult<usize> {
	let deleted = diesel::delete(
		items::table
			.filter(items::starred.eq(false))
			.filter(coalesce(items::published, items::updated).le(cutoff)),
	)
	.execute(conn)?;

	Ok(deleted)
}

pub fn delete_for_feed(feed_id: FeedId, conn: &mut SqliteConnection) -> StoreResult<usize> {
	let deleted =
		diesel::delete(items::table.filter(items::feed_id.eq(feed_id))).execute(conn)?;
	Ok(deleted)
}

fn to_new_item<'a>(entry: &'a NormalizedItem, feed_id: FeedId) -> StoreResult<NewItem<'a>> {
	Ok(NewItem {
		feed_id,
		guid: &entry.guid,
		title: &entry.title,
		description: &entry.description,
		summary: &entry.summary,
		link: &entry.link,
		author: &entry.author,
		comments: entry.comments.as_deref(),
		image: entry
			.image
			.as_ref()
			.map(serde_json::to_string)
			.transpose()?,
		categories: serde_json::to_string(&entry.categories)?,
		enclosures: serde_json::to_string(&entry.enclosures)?,
		published: entry.published,
		updated: entry.updated,
	})
}

#[cfg(test)]
mod tests {
	use diesel::Connection;
	use diesel_migrations::MigrationHarness;

	use crate::database::feeds::{self, FeedDraft};
	use crate::database::{MIGRATIONS, models::Feed};

	use super::*;

	fn setup() -> (SqliteConnection, Feed) {
		let mut conn = SqliteConnection::establish(":memory:").unwrap();
		conn.run_pending_migrations(MIGRATIONS).unwrap();

		let feed = feeds::create(
			&FeedDraft {
				title: "example".to_owned(),
				url: "http://example.com/rss".to_owned(),
			},
			1000,
			&mut conn,
		)
		.unwrap();

		(conn, feed)
	}

	fn entry(guid: &str, title: &str, published: Option<i64>) -> NormalizedItem {
		NormalizedItem {
			guid: guid.to_owned(),
			title: title.to_owned(),
			description: "desc".to_owned(),
			summary: "sum".to_owned(),
			link: "http://example.com/a".to_owned(),
			author: "author".to_owned(),
			comments: None,
			image: None,
			categories: vec!["cat".to_owned()],
			enclosures: vec![],
			published,
			updated: None,
		}
	}

	fn count(conn: &mut SqliteConnection) -> i64 {
		items::table.count().get_result(conn).unwrap()
	}

	#[test]
	fn reingesting_the_same_guid_updates_instead_of_duplicating() {
		let (mut conn, feed) = setup();

		insert(&entry("g1", "first title", Some(5000)), feed.id, &mut conn).unwrap();
		let second = update(&entry("g1", "second title", Some(5000)), feed.id, &mut conn).unwrap();

		assert_eq!(count(&mut conn), 1);
		assert_eq!(second.title, "second title");
	}

	#[test]
	fn update_preserves_read_and_starred_flags() {
		let (mut conn, feed) = setup();

		let stored = insert(&entry("g1", "first", Some(5000)), feed.id, &mut conn).unwrap();
		set_status(&[stored.id], StatusField::Starred, true, &mut conn).unwrap();
		set_status(&[stored.id], StatusField::Read, true, &mut conn).unwrap();

		let updated = update(&entry("g1", "changed", Some(5000)), feed.id, &mut conn).unwrap();

		assert_eq!(updated.title, "changed");
		assert!(updated.starred);
		assert!(updated.read);
	}

	#[test]
	fn update_of_missing_guid_is_an_error() {
		let (mut conn, feed) = setup();

		let err = update(&entry("nope", "t", None), feed.id, &mut conn).unwrap_err();
		assert!(matches!(err, StoreError::MissingRow));
	}

	#[test]
	fn set_status_with_stale_id_reports_the_mismatch() {
		let (mut conn, feed) = setup();

		let stored = insert(&entry("g1", "t", None), feed.id, &mut conn).unwrap();
		let err = set_status(
			&[stored.id, ItemId(9999)],
			StatusField::Read,
			true,
			&mut conn,
		)
		.unwrap_err();

		assert!(matches!(
			err,
			StoreError::StatusUpdate {
				affected: 1,
				expected: 2
			}
		));
	}

	#[test]
	fn delete_expired_spares_starred_and_recent_items() {
		let (mut conn, feed) = setup();

		let old_unstarred = insert(&entry("g1", "old", Some(900)), feed.id, &mut conn).unwrap();
		let old_starred = insert(&entry("g2", "old pinned", Some(900)), feed.id, &mut conn).unwrap();
		let recent = insert(&entry("g3", "recent", Some(1100)), feed.id, &mut conn).unwrap();
		set_status(&[old_starred.id], StatusField::Starred, true, &mut conn).unwrap();

		let deleted = delete_expired(1000, &mut conn).unwrap();

		assert_eq!(deleted, 1);
		assert!(get_by_id(old_unstarred.id, &mut conn).unwrap().is_none());
		assert!(get_by_id(old_starred.id, &mut conn).unwrap().is_some());
		assert!(get_by_id(recent.id, &mut conn).unwrap().is_some());
	}

	#[test]
	fn delete_expired_falls_back_to_updated_and_keeps_dateless_items() {
		let (mut conn, feed) = setup();

		let mut by_updated = entry("g1", "only updated", None);
		by_updated.updated = Some(900);
		insert(&by_updated, feed.id, &mut conn).unwrap();
		insert(&entry("g2", "dateless", None), feed.id, &mut conn).unwrap();

		let deleted = delete_expired(1000, &mut conn).unwrap();

		assert_eq!(deleted, 1);
		assert_eq!(count(&mut conn), 1);
	}

	#[test]
	fn list_filters_by_flags() {
		let (mut conn, feed) = setup();

		let a = insert(&entry("g1", "a", None), feed.id, &mut conn).unwrap();
		insert(&entry("g2", "b", None), feed.id, &mut conn).unwrap();
		set_status(&[a.id], StatusField::Read, true, &mut conn).unwrap();

		let unread = list(
			ItemFilter {
				read: Some(false),
				..ItemFilter::default()
			},
			&mut conn,
		)
		.unwrap();

		assert_eq!(unread.len(), 1);
		assert_eq!(unread[0].title, "b");
	}

	#[test]
	fn deleting_a_feed_cascades_over_its_items() {
		let (mut conn, feed) = setup();

		insert(&entry("g1", "a", None), feed.id, &mut conn).unwrap();
		insert(&entry("g2", "b", None), feed.id, &mut conn).unwrap();

		feeds::delete(feed.id, &mut conn).unwrap();

		assert_eq!(count(&mut conn), 0);
	}
}
