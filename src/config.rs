use std::{env::var, ops, path::Path, sync::Arc, time::Duration};

use axum::extract::FromRequestParts;
use diesel::r2d2::PoolError;
use eyre::WrapErr;
use serde::Deserialize;

use crate::database::{self, PoolConnection, PooledConnection};
use crate::fetcher::Fetcher;
use crate::refresh::{RefreshEngine, RetentionSweeper};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub server: ServerConfig,
	#[serde(default)]
	pub refresh: RefreshConfig,
	#[serde(default)]
	pub retention: RetentionConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
	pub port: u16,
	pub database_url: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshConfig {
	/// Seconds between two refresh ticks.
	#[serde(default = "default_interval_secs")]
	pub interval_secs: u64,

	/// Age past which unstarred items stop being worth keeping.
	#[serde(default = "default_retention_secs")]
	pub retention_secs: i64,

	#[serde(default = "default_fetch_timeout_secs")]
	pub fetch_timeout_secs: u64,

	#[serde(default = "default_max_concurrent_fetches")]
	pub max_concurrent_fetches: usize,
}

#[derive(Debug, Deserialize)]
pub struct RetentionConfig {
	/// Seconds between two retention sweeps.
	#[serde(default = "default_sweep_interval_secs")]
	pub sweep_interval_secs: u64,
}

const fn default_interval_secs() -> u64 {
	600
}

// 14 days
const fn default_retention_secs() -> i64 {
	1_209_600
}

const fn default_fetch_timeout_secs() -> u64 {
	30
}

const fn default_max_concurrent_fetches() -> usize {
	8
}

// weekly
const fn default_sweep_interval_secs() -> u64 {
	604_800
}

impl Default for RefreshConfig {
	fn default() -> Self {
		Self {
			interval_secs: default_interval_secs(),
			retention_secs: default_retention_secs(),
			fetch_timeout_secs: default_fetch_timeout_secs(),
			max_concurrent_fetches: default_max_concurrent_fetches(),
		}
	}
}

impl Default for RetentionConfig {
	fn default() -> Self {
		Self {
			sweep_interval_secs: default_sweep_interval_secs(),
		}
	}
}

impl Config {
	pub fn load_file_from_env() -> eyre::Result<Self> {
		let config_path = var("FEEDSTASH_CONFIG").unwrap_or_else(|_| "./config.toml".into());

		let config_path = AsRef::<Path>::as_ref(&config_path)
			.canonicalize()
			.wrap_err("could not find the config file")?;

		let config_content =
			std::fs::read_to_string(config_path).wrap_err("could not read the config file")?;
		let config = toml::from_str::<Self>(&config_content)
			.wrap_err("config file does not match the expected structure")?;

		Ok(config)
	}
}

/// Everything with a process lifetime, constructed once at startup and
/// injected everywhere else. No module reaches for ambient global state.
pub struct Resources {
	pub database_handle: PoolConnection,
	pub engine: Arc<RefreshEngine>,
	pub sweeper: Arc<RetentionSweeper>,
}

#[derive(Clone)]
pub struct ResourcesRef(Arc<Resources>);

impl ops::Deref for ResourcesRef {
	type Target = Resources;
	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl FromRequestParts<ResourcesRef> for ResourcesRef {
	type Rejection = ();
	async fn from_request_parts(
		_parts: &mut axum::http::request::Parts,
		state: &ResourcesRef,
	) -> Result<Self, Self::Rejection> {
		Ok(state.clone())
	}
}

impl Resources {
	pub fn init(config: &Config) -> eyre::Result<ResourcesRef> {
		let db_pool = database::init_pool(&config.server.database_url)?;

		let fetcher = Fetcher::new(Duration::from_secs(config.refresh.fetch_timeout_secs))?;
		let engine = Arc::new(RefreshEngine::new(
			db_pool.clone(),
			fetcher,
			config.refresh.retention_secs,
			config.refresh.max_concurrent_fetches,
		));
		let sweeper = Arc::new(RetentionSweeper::new(
			db_pool.clone(),
			config.refresh.retention_secs,
		));

		let resources = Self {
			database_handle: db_pool,
			engine,
			sweeper,
		};

		Ok(ResourcesRef(Arc::new(resources)))
	}

	pub fn db_conn(&self) -> Result<PooledConnection, PoolError> {
		self.database_handle.get()
	}
}
