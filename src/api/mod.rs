use axum::{Json, Router, http::StatusCode, routing::post};
use serde::Serialize;

use crate::{
	auth::{AuthSession, AuthnLayer},
	config::ResourcesRef,
	error::RouteResult,
};

mod account;
mod feeds;
mod groups;
mod items;

pub fn router(resources: &ResourcesRef) -> Router<ResourcesRef> {
	let authn_layer = AuthnLayer::new(resources);

	Router::new().nest("/v1", v1_router()).layer(authn_layer)
}

fn v1_router() -> Router<ResourcesRef> {
	Router::new()
		.nest("/feeds", feeds::router())
		.nest("/items", items::router())
		.nest("/groups", groups::router())
		.nest("/feed-groups", groups::membership_router())
		.nest("/account", account::router())
		.route("/refresh", post(refresh_post_handler))
		.route("/retention/sweep", post(sweep_post_handler))
}

// Manual trigger for the same tick the scheduler runs. Serialized against
// scheduled ticks by the engine lock.
async fn refresh_post_handler(
	auth: AuthSession,
	resources: ResourcesRef,
) -> RouteResult<StatusCode> {
	auth.account_id()?;

	resources.engine.run_once().await?;

	Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct SweepResponse {
	deleted: usize,
}

async fn sweep_post_handler(
	auth: AuthSession,
	resources: ResourcesRef,
) -> RouteResult<Json<SweepResponse>> {
	auth.account_id()?;

	let deleted = resources.sweeper.sweep()?;

	Ok(Json(SweepResponse { deleted }))
}
