use diesel::{SqliteConnection, r2d2};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use eyre::WrapErr;

pub mod accounts;
pub mod feeds;
pub mod groups;
pub mod items;
pub mod models;
#[rustfmt::skip]
pub mod schema;

pub type PoolConnection = r2d2::Pool<r2d2::ConnectionManager<SqliteConnection>>;
pub type PooledConnection = r2d2::PooledConnection<r2d2::ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub fn run_migrations(conn: &mut SqliteConnection) -> eyre::Result<()> {
	let applied = conn
		.run_pending_migrations(MIGRATIONS)
		.map_err(|err| eyre::eyre!("could not run pending migrations: {err}"))?;

	for migration in applied {
		tracing::info!(migration = %migration, "applied migration");
	}

	Ok(())
}

/// Builds the connection pool shared by the API layer and the refresh
/// pipeline, and brings the schema up to date. A failure here aborts
/// startup, the store is never run degraded.
pub fn init_pool(database_url: &str) -> eyre::Result<PoolConnection> {
	let manager = r2d2::ConnectionManager::<SqliteConnection>::new(database_url);
	let pool = r2d2::Pool::builder()
		.build(manager)
		.wrap_err("could not build database connection pool")?;

	let mut conn = pool
		.get()
		.wrap_err("could not check out a startup connection")?;
	run_migrations(&mut conn)?;

	Ok(pool)
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("query: {0}")]
	Query(#[from] diesel::result::Error),

	#[error("json column: {0}")]
	Json(#[from] serde_json::Error),

	#[error("status update affected {affected} rows, expected {expected}")]
	StatusUpdate { affected: usize, expected: usize },

	#[error("no row matched the given identity")]
	MissingRow,
}

pub type StoreResult<T> = Result<T, StoreError>;
