use diesel::prelude::*;

use super::models::{Feed, FeedId, Group, GroupId};
use super::schema::{feed_groups, feeds, groups};
use super::{StoreError, StoreResult};

pub fn list(conn: &mut SqliteConnection) -> StoreResult<Vec<Group>> {
	let rows = groups::table
		.select(Group::as_select())
		.order(groups::id.asc())
		.load(conn)?;
	Ok(rows)
}

pub fn get(id: GroupId, conn: &mut SqliteConnection) -> StoreResult<Option<Group>> {
	let group = groups::table
		.find(id)
		.select(Group::as_select())
		.first(conn)
		.optional()?;
	Ok(group)
}

pub fn get_by_name(name: &str, conn: &mut SqliteConnection) -> StoreResult<Option<Group>> {
	let mut matches = groups::table
		.filter(groups::name.eq(name))
		.select(Group::as_select())
		.load(conn)?;

	if matches.len() > 1 {
		// not reachable while the unique index holds, but a lookup-by-name
		// returning several rows is worth hearing about, not worth failing on
		tracing::warn!(name, matches = matches.len(), "several groups match name, using first");
	}

	if matches.is_empty() {
		Ok(None)
	} else {
		Ok(Some(matches.remove(0)))
	}
}

/// Creating a group is idempotent on the name: an existing group with the
/// same name is returned as-is.
pub fn create(name: &str, conn: &mut SqliteConnection) -> StoreResult<Group> {
	if let Some(existing) = get_by_name(name, conn)? {
		return Ok(existing);
	}

	let group = diesel::insert_into(groups::table)
		.values(groups::name.eq(name))
		.returning(Group::as_returning())
		.get_result(conn)?;

	Ok(group)
}

pub fn rename(id: GroupId, name: &str, conn: &mut SqliteConnection) -> StoreResult<Option<Group>> {
	let affected = diesel::update(groups::table.find(id))
		.set(groups::name.eq(name))
		.execute(conn)?;

	if affected == 0 {
		return Ok(None);
	}
	get(id, conn)
}

/// Deleting a group detaches every feed first; feeds themselves survive.
pub fn delete(id: GroupId, conn: &mut SqliteConnection) -> StoreResult<()> {
	conn.transaction(|conn| {
		diesel::delete(feed_groups::table.filter(feed_groups::group_id.eq(id))).execute(conn)?;

		let affected = diesel::delete(groups::table.find(id)).execute(conn)?;
		if affected == 0 {
			return Err(StoreError::MissingRow);
		}
		Ok(())
	})
}

pub fn attach_feed(
	feed_id: FeedId,
	group_id: GroupId,
	conn: &mut SqliteConnection,
) -> StoreResult<()> {
	diesel::insert_into(feed_groups::table)
		.values((
			feed_groups::feed_id.eq(feed_id),
			feed_groups::group_id.eq(group_id),
		))
		.execute(conn)?;
	Ok(())
}

pub fn detach_feed(
	feed_id: FeedId,
	group_id: GroupId,
	conn: &mut SqliteConnection,
) -> StoreResult<()> {
	diesel::delete(
		feed_groups::table
			.filter(feed_groups::feed_id.eq(feed_id))
			.filter(feed_groups::group_id.eq(group_id)),
	)
	.execute(conn)?;
	Ok(())
}

pub fn groups_for_feed(feed_id: FeedId, conn: &mut SqliteConnection) -> StoreResult<Vec<Group>> {
	let rows = feed_groups::table
		.inner_join(groups::table)
		.filter(feed_groups::feed_id.eq(feed_id))
		.select(Group::as_select())
		.load(conn)?;
	Ok(rows)
}

pub fn feeds_for_group(group_id: GroupId, conn: &mut SqliteConnection) -> StoreResult<Vec<Feed>> {
	let rows = feed_groups::table
		.inner_join(feeds::table)
		.filter(feed_groups::group_id.eq(group_id))
		.select(Feed::as_select())
		.load(conn)?;
	Ok(rows)
}

#[cfg(test)]
mod tests {
	use diesel::Connection;
	use diesel_migrations::MigrationHarness;

	use crate::database::MIGRATIONS;
	use crate::database::feeds::{self, FeedDraft};

	use super::*;

	fn setup() -> SqliteConnection {
		let mut conn = SqliteConnection::establish(":memory:").unwrap();
		conn.run_pending_migrations(MIGRATIONS).unwrap();
		conn
	}

	#[test]
	fn create_is_idempotent_on_name() {
		let mut conn = setup();

		let first = create("tech", &mut conn).unwrap();
		let second = create("tech", &mut conn).unwrap();

		assert_eq!(first.id, second.id);
		assert_eq!(list(&mut conn).unwrap().len(), 1);
	}

	#[test]
	fn delete_detaches_feeds_and_removes_the_group() {
		let mut conn = setup();

		let feed = feeds::create(
			&FeedDraft {
				title: "example".to_owned(),
				url: "http://example.com/rss".to_owned(),
			},
			1000,
			&mut conn,
		)
		.unwrap();
		let group = create("tech", &mut conn).unwrap();
		attach_feed(feed.id, group.id, &mut conn).unwrap();

		delete(group.id, &mut conn).unwrap();

		assert!(get(group.id, &mut conn).unwrap().is_none());
		assert!(groups_for_feed(feed.id, &mut conn).unwrap().is_empty());
		assert!(feeds::get(feed.id, &mut conn).unwrap().is_some());
	}

	#[test]
	fn feed_deletion_detaches_group_memberships() {
		let mut conn = setup();

		let feed = feeds::create(
			&FeedDraft {
				title: "example".to_owned(),
				url: "http://example.com/rss".to_owned(),
			},
			1000,
			&mut conn,
		)
		.unwrap();
		let group = create("tech", &mut conn).unwrap();
		attach_feed(feed.id, group.id, &mut conn).unwrap();

		feeds::delete(feed.id, &mut conn).unwrap();

		assert!(feeds_for_group(group.id, &mut conn).unwrap().is_empty());
	}
}
