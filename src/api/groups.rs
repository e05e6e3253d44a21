use axum::{
	Json, Router,
	extract::Path,
	http::StatusCode,
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
	auth::AuthSession,
	config::ResourcesRef,
	database::{
		feeds, groups,
		models::{Feed, FeedId, Group, GroupId},
	},
	error::{RouteError, RouteResult},
};

pub fn router() -> Router<ResourcesRef> {
	Router::new()
		.route("/", get(groups_get_handler).post(groups_post_handler))
		.route(
			"/{id}",
			get(group_get_handler)
				.put(group_put_handler)
				.delete(group_delete_handler),
		)
		.route("/{id}/feeds", get(group_feeds_get_handler))
}

/// Attach/detach live on their own prefix since a membership is addressed by
/// the pair, not by a row id.
pub fn membership_router() -> Router<ResourcesRef> {
	Router::new().route(
		"/",
		post(membership_post_handler).delete(membership_delete_handler),
	)
}

#[derive(Debug, Serialize)]
struct GroupsResponse {
	groups: Vec<Group>,
}

async fn groups_get_handler(
	auth: AuthSession,
	resources: ResourcesRef,
) -> RouteResult<Json<GroupsResponse>> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	let groups = groups::list(&mut conn)?;

	Ok(Json(GroupsResponse { groups }))
}

#[derive(Debug, Deserialize)]
struct GroupDraft {
	name: String,
}

async fn groups_post_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Json(draft): Json<GroupDraft>,
) -> RouteResult<(StatusCode, Json<Group>)> {
	auth.account_id()?;

	if draft.name.trim().is_empty() {
		return Err(RouteError::User("group name must not be blank"));
	}

	let mut conn = resources.db_conn()?;
	let group = groups::create(&draft.name, &mut conn)?;

	Ok((StatusCode::CREATED, Json(group)))
}

async fn group_get_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Path(id): Path<GroupId>,
) -> RouteResult<Json<Group>> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	let group = groups::get(id, &mut conn)?.ok_or(RouteError::NotFound("no such group"))?;

	Ok(Json(group))
}

async fn group_put_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Path(id): Path<GroupId>,
	Json(draft): Json<GroupDraft>,
) -> RouteResult<Json<Group>> {
	auth.account_id()?;

	if draft.name.trim().is_empty() {
		return Err(RouteError::User("group name must not be blank"));
	}

	let mut conn = resources.db_conn()?;
	let group = groups::rename(id, &draft.name, &mut conn)?
		.ok_or(RouteError::NotFound("no such group"))?;

	Ok(Json(group))
}

async fn group_delete_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Path(id): Path<GroupId>,
) -> RouteResult<StatusCode> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	groups::delete(id, &mut conn)?;

	Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct GroupFeedsResponse {
	feeds: Vec<Feed>,
}

async fn group_feeds_get_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Path(id): Path<GroupId>,
) -> RouteResult<Json<GroupFeedsResponse>> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	groups::get(id, &mut conn)?.ok_or(RouteError::NotFound("no such group"))?;

	let feeds = groups::feeds_for_group(id, &mut conn)?;

	Ok(Json(GroupFeedsResponse { feeds }))
}

#[derive(Debug, Deserialize)]
struct MembershipRequest {
	feed_id: FeedId,
	group_id: GroupId,
}

async fn membership_post_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Json(request): Json<MembershipRequest>,
) -> RouteResult<StatusCode> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	feeds::get(request.feed_id, &mut conn)?.ok_or(RouteError::NotFound("no such feed"))?;
	groups::get(request.group_id, &mut conn)?.ok_or(RouteError::NotFound("no such group"))?;

	groups::attach_feed(request.feed_id, request.group_id, &mut conn)?;

	Ok(StatusCode::CREATED)
}

async fn membership_delete_handler(
	auth: AuthSession,
	resources: ResourcesRef,
	Json(request): Json<MembershipRequest>,
) -> RouteResult<StatusCode> {
	auth.account_id()?;

	let mut conn = resources.db_conn()?;
	groups::detach_feed(request.feed_id, request.group_id, &mut conn)?;

	Ok(StatusCode::NO_CONTENT)
}
