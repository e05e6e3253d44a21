use axum::response::IntoResponse;
use diesel::r2d2::PoolError;
use diesel::result::DatabaseErrorKind;
use reqwest::StatusCode;

use crate::database::StoreError;
use crate::refresh::RefreshError;

pub type RouteResult<T> = Result<T, RouteError>;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
	#[error("static: {0}")]
	Static(&'static str),

	#[error("pool: {0}")]
	DbPool(#[from] PoolError),

	#[error("store: {0}")]
	Store(#[from] StoreError),

	#[error("refresh: {0}")]
	Refresh(#[from] RefreshError),

	#[error("auth: {0}")]
	Auth(#[from] AuthError),

	#[error("other: {0}")]
	Other(#[from] eyre::Report),

	#[error("{0}")]
	User(&'static str),

	#[error("not found: {0}")]
	NotFound(&'static str),
}

impl IntoResponse for RouteError {
	fn into_response(self) -> axum::response::Response {
		match self {
			Self::Store(StoreError::Query(diesel::result::Error::DatabaseError(
				DatabaseErrorKind::UniqueViolation,
				_,
			))) => (StatusCode::CONFLICT, "already exists").into_response(),
			Self::Store(StoreError::MissingRow) => StatusCode::NOT_FOUND.into_response(),
			err @ (Self::Static(_)
			| Self::DbPool(_)
			| Self::Store(_)
			| Self::Refresh(_)
			| Self::Other(_)) => {
				tracing::error!(err = %err, "error at route boundary");
				StatusCode::INTERNAL_SERVER_ERROR.into_response()
			}
			Self::Auth(err) => err.into_response(),
			Self::User(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
			Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
	#[error("request is not authenticated")]
	NotAuthenticated,

	#[error("pool: {0}")]
	DbPool(#[from] PoolError),
}

impl IntoResponse for AuthError {
	fn into_response(self) -> axum::response::Response {
		match self {
			err @ Self::NotAuthenticated => {
				(StatusCode::UNAUTHORIZED, err.to_string()).into_response()
			}
			err @ Self::DbPool(_) => {
				tracing::error!(err = %err, "error at auth boundary");
				StatusCode::INTERNAL_SERVER_ERROR.into_response()
			}
		}
	}
}
