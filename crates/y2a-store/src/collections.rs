//! Collection names.

/// Owner accounts, keyed by login.
pub const USERS: &str = "users";

/// Converter registrations, keyed by worker address.
pub const CONVERTERS: &str = "converters";

/// History items, keyed by job id.
pub const HISTORY: &str = "history";

/// Job records, keyed by job id.
pub const JOBS: &str = "jobs";

/// Collections every store is opened with.
pub const DEFAULT_COLLECTIONS: &[&str] = &[USERS, CONVERTERS, HISTORY, JOBS];
