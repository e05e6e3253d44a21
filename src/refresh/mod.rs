//! The feed refresh pipeline: content identity derivation, payload
//! normalization, the per-tick orchestrator and the retention sweeper.

pub mod engine;
pub mod error;
pub mod guid;
pub mod normalize;
pub mod retention;

pub use self::engine::{ReconcileSummary, RefreshEngine};
pub use self::error::{ParseError, RefreshError};
pub use self::retention::RetentionSweeper;
