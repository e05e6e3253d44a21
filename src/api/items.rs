use axum::{
	Json, Router,
	extract::{Path, Query},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
	auth::AuthSession,
	config::ResourcesRef,
	database::{
		items::{self, ItemFilter, StatusField},
		models::{Item, ItemId},
	},
	error::{RouteError, RouteResult},
};

pub fn router() -> Router<ResourcesRef> {
	Router::new()
		.route("/", get(items_get_handler))
		.route("/{id}", get(item_get_handler))
		.route("/{id}/status", post(item_status_post_handler))
}

/// One user-facing status token. Each one pins a single flag to a value;
/// `read`/`unread` and `starred`/`unstarred` are each other's negations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ItemFlag {
	Read,
	Unread,
	Starred,
	Unstarred,
}

impl ItemFlag {
	fn target(self) -> (StatusField, bool) {
		match self {
			Self::Read => (StatusField::Read, true),
			Self::Unread => (StatusField::Read, false),
			Self::Starred => (StatusField::Starred, true),
			Self::Unstarred => (StatusField::Starred, false),
		}
	}

	fn parse(token: &str) -> Option<Self> {
		match token {
			"read" => Some(Self::Read),
			"unread" => Some(Self::Unread),
			"starred" => Some(Self::Starred),
			"unstarred" => Some(Self::Unstarred),
			_ => None,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ItemsQuery {
	pub(super) flags: Option<String>,
}

impl ItemsQuery {
	pub(super) fn into_filter(self) -> Result<ItemFilter, RouteError> {
		self.flags.as_deref().map_or_else(
			|| Ok(ItemFilter::default()),
			parse_flags,
		)
	}
}

/// Folds a comma-separated flag list into the tri-state filter. Tokens apply
/// in order, so a contradictory `read,unread` resolves to the last one.
fn parse_flags(raw: &str) -> Result<ItemFilter, RouteError> {
	let mut filter = ItemFilter::default();

	for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
		let flag = ItemFlag::parse(token).ok_or(RouteError::User("unknown status flag"))?;

		let (field, value) = flag.target();
		match field {
			StatusField::Read => filter.read = Some(value),
			StatusField::Starred => filter.starred = Some(value),
		}
	}

	Ok(filter)
}

#[derive(Debug, Serialize)]
struct ItemsResponse {
	items: Vec<Item>,
}

async fn items_get_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Query(query): Query<ItemsQuery>,
) -> RouteResult<Json<ItemsResponse>> {
	auth.account_id()?;

	let filter = query.into_filter()?;

	let mut conn = resources.db_conn()?;
	let items = items::list(filter, &mut conn)?;

	Ok(Json(ItemsResponse { items }))
}

async fn item_get_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Path(id): Path<ItemId>,
) -> RouteResult<Json<Item>> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	let item = items::get_by_id(id, &mut conn)?.ok_or(RouteError::NotFound("no such item"))?;

	Ok(Json(item))
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
	flag: ItemFlag,
}

async fn item_status_post_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Path(id): Path<ItemId>,
	Json(request): Json<StatusRequest>,
) -> RouteResult<Json<Item>> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	items::get_by_id(id, &mut conn)?.ok_or(RouteError::NotFound("no such item"))?;

	let (field, value) = request.flag.target();
	items::set_status(&[id], field, value, &mut conn)?;

	let item = items::get_by_id(id, &mut conn)?.ok_or(RouteError::NotFound("no such item"))?;

	Ok(Json(item))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn flags_translate_to_tri_state_filters() {
		let filter = parse_flags("unread,starred").unwrap();

		assert_eq!(filter.read, Some(false));
		assert_eq!(filter.starred, Some(true));
		assert!(filter.feed_id.is_none());
	}

	#[test]
	fn later_flags_win_over_earlier_contradictions() {
		let filter = parse_flags("read,unread").unwrap();

		assert_eq!(filter.read, Some(false));
	}

	#[test]
	fn blank_tokens_are_ignored() {
		let filter = parse_flags(" read , ").unwrap();

		assert_eq!(filter.read, Some(true));
		assert!(filter.starred.is_none());
	}

	#[test]
	fn unknown_tokens_are_rejected() {
		assert!(parse_flags("read,archived").is_err());
	}
}
