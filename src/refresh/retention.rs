use crate::database::{PoolConnection, items};
use crate::utils::unix_now;

use super::error::RefreshError;

/// Hard-deletes items past the retention horizon on its own, slower
/// schedule. The starred exemption lives in the store predicate, not here,
/// so every deletion path shares it.
pub struct RetentionSweeper {
	db_pool: PoolConnection,
	retention_secs: i64,
}

impl RetentionSweeper {
	pub const fn new(db_pool: PoolConnection, retention_secs: i64) -> Self {
		Self {
			db_pool,
			retention_secs,
		}
	}

	pub fn sweep(&self) -> Result<usize, RefreshError> {
		let cutoff = unix_now() - self.retention_secs;
		let mut conn = self.db_pool.get()?;
		let deleted = items::delete_expired(cutoff, &mut conn)?;

		tracing::info!(cutoff, deleted, "retention sweep finished");
		Ok(deleted)
	}
}
