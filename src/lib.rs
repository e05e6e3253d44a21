//! A small personal feed aggregator. Feeds are polled on a timer, their
//! entries deduplicated by a derived content identity and reconciled into a
//! SQLite store; old unstarred items are swept out past a retention horizon.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod fetcher;
pub mod refresh;
pub mod scheduler;
pub mod utils;
