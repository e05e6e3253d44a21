use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::{auth::AuthSession, config::ResourcesRef, error::RouteResult};

pub fn router() -> Router<ResourcesRef> {
	Router::new().route("/verify", get(verify_get_handler))
}

#[derive(Debug, Serialize)]
struct VerifyResponse {
	username: String,
}

/// Cheap way for a client to check its stored credentials: the authn layer
/// has already done the work by the time this handler runs.
async fn verify_get_handler(auth: AuthSession) -> RouteResult<Json<VerifyResponse>> {
	let username = auth.username()?.to_owned();

	Ok(Json(VerifyResponse { username }))
}
