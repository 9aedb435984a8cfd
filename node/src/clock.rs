use {crowdfund_primitives::Timestamp, time::OffsetDateTime};

/// Current wall clock reading in seconds since unix epoch.
pub fn now() -> Timestamp {
  Timestamp::try_from(OffsetDateTime::now_utc().unix_timestamp()).unwrap_or(0)
}
