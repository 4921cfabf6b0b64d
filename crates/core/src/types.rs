/// All database primary keys are PostgreSQL BIGINT / BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier value reserved as the "absent" marker. Never a valid key.
pub const SENTINEL_ID: DbId = 0;

/// Returns `true` if `id` is the reserved sentinel and must not reach the store.
pub fn is_sentinel(id: DbId) -> bool {
    id == SENTINEL_ID
}
