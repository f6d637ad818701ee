use rand::Rng;

/// Expected database schema version
/// All databases must use this version for compatibility
pub const EXPECTED_DB_VERSION: &str = "1";

/// A player is considered online if its last heartbeat is younger than this
pub const ONLINE_THRESHOLD_MS: i64 = 30_000;

/// Interval between expiry purge passes (in seconds)
pub const PURGE_INTERVAL_SECS: u64 = 60;

/// Upper bound for a single blob delete before it counts as a per-item failure
pub const BLOB_DELETE_TIMEOUT_SECS: u64 = 10;

/// Generate a short random alphanumeric suffix for stored filenames
/// Keeps two uploads of the same file in the same millisecond from colliding
pub fn generate_stored_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(8)
        .map(char::from)
        .collect()
}
