use time::OffsetDateTime;

/// Current wall-clock time as unix seconds, the only timestamp unit the
/// store speaks.
pub fn unix_now() -> i64 {
	OffsetDateTime::now_utc().unix_timestamp()
}
