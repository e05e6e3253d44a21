use std::task::{Context, Poll};

use axum::{
	extract::FromRequestParts,
	http::{Request, header, request::Parts},
};
use base64::{Engine, prelude::BASE64_STANDARD};
use password_auth::verify_password;
use tower::{Layer, Service};

use crate::{
	config::Resources,
	database::{PoolConnection, accounts, models::AccountId},
	error::{AuthError, RouteError},
};

#[derive(Debug, Clone)]
struct Credentials {
	username: String,
	password: String,
}

/// Outcome of the credential check, stashed as a request extension by
/// [`AuthnService`] and pulled out by handlers.
#[derive(Debug, Clone)]
pub struct AuthSession {
	pub account_id: Option<AccountId>,
	pub username: Option<String>,
}

impl AuthSession {
	pub fn account_id(&self) -> Result<AccountId, AuthError> {
		self.account_id.ok_or(AuthError::NotAuthenticated)
	}

	pub fn username(&self) -> Result<&str, AuthError> {
		self.username.as_deref().ok_or(AuthError::NotAuthenticated)
	}
}

impl<S: Send + Sync> FromRequestParts<S> for AuthSession {
	type Rejection = RouteError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let msg = "logic error: could not access `AuthSession` extension";
		parts
			.extensions
			.get::<Self>()
			.cloned()
			.ok_or(RouteError::Static(msg))
	}
}

/// HTTP Basic credential check against the accounts table. Applied over the
/// whole API router; handlers decide whether a route actually requires an
/// authenticated session.
#[derive(Debug, Clone)]
pub struct AuthnLayer {
	db_handle: PoolConnection,
}

impl AuthnLayer {
	pub fn new(resources: &Resources) -> Self {
		Self {
			db_handle: resources.database_handle.clone(),
		}
	}
}

impl<S> Layer<S> for AuthnLayer {
	type Service = AuthnService<S>;

	fn layer(&self, service: S) -> Self::Service {
		AuthnService {
			service,
			db_handle: self.db_handle.clone(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct AuthnService<S> {
	service: S,
	db_handle: PoolConnection,
}

impl<S> AuthnService<S> {
	fn extract_credentials<ReqBody>(req: &Request<ReqBody>) -> Option<Credentials> {
		let authz_header = req.headers().get(header::AUTHORIZATION)?;
		let encoded = authz_header.to_str().ok()?.strip_prefix("Basic ")?;

		let decoded = BASE64_STANDARD.decode(encoded.as_bytes()).ok()?;
		let decoded = String::from_utf8(decoded).ok()?;
		let (username, password) = decoded.split_once(':')?;

		Some(Credentials {
			username: username.to_owned(),
			password: password.to_owned(),
		})
	}

	fn resolve_account(&self, credentials: &Credentials) -> Option<AccountId> {
		let mut conn = self.db_handle.get().ok()?;
		let account = accounts::get_by_username(&credentials.username, &mut conn).ok()??;

		verify_password(credentials.password.as_bytes(), &account.password_hash)
			.is_ok()
			.then_some(account.id)
	}
}

impl<S: Service<Request<ReqBody>>, ReqBody> Service<Request<ReqBody>> for AuthnService<S> {
	type Response = S::Response;
	type Error = S::Error;
	type Future = S::Future;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.service.poll_ready(cx)
	}

	fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
		let credentials = Self::extract_credentials(&req);

		let account_id = credentials
			.as_ref()
			.and_then(|credentials| self.resolve_account(credentials));

		let session = AuthSession {
			account_id,
			username: account_id
				.and(credentials)
				.map(|credentials| credentials.username),
		};
		req.extensions_mut().insert(session);

		self.service.call(req)
	}
}
