use diesel::prelude::*;
use diesel_derive_newtype::DieselNewType;
use serde::{Deserialize, Serialize};

use crate::database::schema::{accounts, feeds, groups, items};

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DieselNewType,
)]
pub struct FeedId(pub i32);

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DieselNewType,
)]
pub struct ItemId(pub i32);

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DieselNewType,
)]
pub struct GroupId(pub i32);

#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DieselNewType,
)]
pub struct AccountId(pub i32);

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = feeds)]
pub struct Feed {
	pub id: FeedId,
	pub title: String,
	pub url: String,
	pub added_on: i64,
	pub last_updated: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = feeds)]
pub struct NewFeed<'a> {
	pub title: &'a str,
	pub url: &'a str,
	pub added_on: i64,
	pub last_updated: i64,
}

/// Optional structured image attached to an item, stored as a JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemImage {
	pub title: Option<String>,
	pub url: Option<String>,
}

/// Raw `items` row as it comes back from the driver. JSON columns are kept
/// as text here; [`ItemRow::into_item`] is the one place they get decoded.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = items)]
pub struct ItemRow {
	pub id: ItemId,
	pub feed_id: FeedId,
	pub guid: String,
	pub title: String,
	pub description: String,
	pub summary: String,
	pub link: String,
	pub author: String,
	pub comments: Option<String>,
	pub image: Option<String>,
	pub categories: String,
	pub enclosures: String,
	pub published: Option<i64>,
	pub updated: Option<i64>,
	pub read: bool,
	pub starred: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
	pub id: ItemId,
	pub feed_id: FeedId,
	pub guid: String,
	pub title: String,
	pub description: String,
	pub summary: String,
	pub link: String,
	pub author: String,
	pub comments: Option<String>,
	pub image: Option<ItemImage>,
	pub categories: Vec<String>,
	pub enclosures: Vec<String>,
	pub published: Option<i64>,
	pub updated: Option<i64>,
	pub read: bool,
	pub starred: bool,
}

impl ItemRow {
	pub fn into_item(self) -> Result<Item, serde_json::Error> {
		let image = self
			.image
			.as_deref()
			.map(serde_json::from_str::<ItemImage>)
			.transpose()?;

		Ok(Item {
			id: self.id,
			feed_id: self.feed_id,
			guid: self.guid,
			title: self.title,
			description: self.description,
			summary: self.summary,
			link: self.link,
			author: self.author,
			comments: self.comments,
			image,
			categories: serde_json::from_str(&self.categories)?,
			enclosures: serde_json::from_str(&self.enclosures)?,
			published: self.published,
			updated: self.updated,
			read: self.read,
			starred: self.starred,
		})
	}
}

#[derive(Debug, Insertable)]
#[diesel(table_name = items)]
pub struct NewItem<'a> {
	pub feed_id: FeedId,
	pub guid: &'a str,
	pub title: &'a str,
	pub description: &'a str,
	pub summary: &'a str,
	pub link: &'a str,
	pub author: &'a str,
	pub comments: Option<&'a str>,
	pub image: Option<String>,
	pub categories: String,
	pub enclosures: String,
	pub published: Option<i64>,
	pub updated: Option<i64>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = groups)]
pub struct Group {
	pub id: GroupId,
	pub name: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = accounts)]
pub struct Account {
	pub id: AccountId,
	pub username: String,
	pub password_hash: String,
	pub added_on: i64,
	pub last_updated: i64,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn row() -> ItemRow {
		ItemRow {
			id: ItemId(7),
			feed_id: FeedId(3),
			guid: "abc".to_owned(),
			title: "title".to_owned(),
			description: "desc".to_owned(),
			summary: "sum".to_owned(),
			link: "http://example.com/a".to_owned(),
			author: "author".to_owned(),
			comments: None,
			image: Some(r#"{"title":"img","url":"http://example.com/i.png"}"#.to_owned()),
			categories: r#"["rust","news"]"#.to_owned(),
			enclosures: "[]".to_owned(),
			published: Some(900),
			updated: None,
			read: false,
			starred: true,
		}
	}

	#[test]
	fn item_row_decodes_json_columns() {
		let item = row().into_item().unwrap();

		assert_eq!(item.categories, vec!["rust", "news"]);
		assert_eq!(item.enclosures, Vec::<String>::new());
		assert_eq!(
			item.image,
			Some(ItemImage {
				title: Some("img".to_owned()),
				url: Some("http://example.com/i.png".to_owned()),
			})
		);
		assert_eq!(item.published, Some(900));
		assert_eq!(item.updated, None);
		assert!(item.starred);
	}

	#[test]
	fn item_row_rejects_malformed_json_column() {
		let mut row = row();
		row.categories = "not json".to_owned();

		assert!(row.into_item().is_err());
	}
}
