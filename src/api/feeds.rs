use axum::{
	Json, Router,
	extract::{Path, Query},
	http::StatusCode,
	routing::get,
};
use serde::Serialize;
use url::Url;

use crate::{
	auth::AuthSession,
	config::ResourcesRef,
	database::{
		feeds::{self, FeedDraft},
		groups, items,
		models::{Feed, FeedId, Group, Item},
	},
	error::{RouteError, RouteResult},
	utils::unix_now,
};

pub fn router() -> Router<ResourcesRef> {
	Router::new()
		.route("/", get(feeds_get_handler).post(feeds_post_handler))
		.route(
			"/{id}",
			get(feed_get_handler)
				.put(feed_put_handler)
				.delete(feed_delete_handler),
		)
		.route("/{id}/items", get(feed_items_get_handler))
		.route("/{id}/groups", get(feed_groups_get_handler))
}

#[derive(Debug, Serialize)]
struct FeedsResponse {
	feeds: Vec<Feed>,
}

async fn feeds_get_handler(
	auth: AuthSession,
	resources: ResourcesRef,
) -> RouteResult<Json<FeedsResponse>> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	let feeds = feeds::list(&mut conn)?;

	Ok(Json(FeedsResponse { feeds }))
}

async fn feeds_post_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Json(draft): Json<FeedDraft>,
) -> RouteResult<(StatusCode, Json<Feed>)> {
	auth.account_id()?;

	Url::parse(&draft.url).map_err(|_| RouteError::User("feed url is not a valid url"))?;

	let mut conn = resources.db_conn()?;
	let feed = feeds::create(&draft, unix_now(), &mut conn)?;

	Ok((StatusCode::CREATED, Json(feed)))
}

async fn feed_get_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Path(id): Path<FeedId>,
) -> RouteResult<Json<Feed>> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	let feed = feeds::get(id, &mut conn)?.ok_or(RouteError::NotFound("no such feed"))?;

	Ok(Json(feed))
}

async fn feed_put_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Path(id): Path<FeedId>,
	Json(draft): Json<FeedDraft>,
) -> RouteResult<Json<Feed>> {
	auth.account_id()?;

	Url::parse(&draft.url).map_err(|_| RouteError::User("feed url is not a valid url"))?;

	let mut conn = resources.db_conn()?;
	let feed = feeds::update(id, &draft, unix_now(), &mut conn)?
		.ok_or(RouteError::NotFound("no such feed"))?;

	Ok(Json(feed))
}

async fn feed_delete_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Path(id): Path<FeedId>,
) -> RouteResult<StatusCode> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	feeds::delete(id, &mut conn)?;

	Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct FeedItemsResponse {
	items: Vec<Item>,
}

async fn feed_items_get_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Path(id): Path<FeedId>,
	Query(query): Query<super::items::ItemsQuery>,
) -> RouteResult<Json<FeedItemsResponse>> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	feeds::get(id, &mut conn)?.ok_or(RouteError::NotFound("no such feed"))?;

	let mut filter = query.into_filter()?;
	filter.feed_id = Some(id);
	let items = items::list(filter, &mut conn)?;

	Ok(Json(FeedItemsResponse { items }))
}

#[derive(Debug, Serialize)]
struct FeedGroupsResponse {
	groups: Vec<Group>,
}

async fn feed_groups_get_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Path(id): Path<FeedId>,
) -> RouteResult<Json<FeedGroupsResponse>> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	feeds::get(id, &mut conn)?.ok_or(RouteError::NotFound("no such feed"))?;

	let groups = groups::groups_for_feed(id, &mut conn)?;

	Ok(Json(FeedGroupsResponse { groups }))
}
