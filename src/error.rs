//! Error types for the tallycache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: invalid construction or capacity mutation (negative or
//!   non-integer capacity, unknown policy, malformed configuration).
//! - [`SnapshotError`]: a JSON snapshot could not be encoded or decoded.
//! - [`InvariantError`]: returned by `check_invariants` when the internal
//!   indexes of a cache disagree.
//!
//! Cache misses are not errors; `get` returns `None` and bumps the miss counter.
//!
//! ## Example Usage
//!
//! ```
//! use tallycache::error::ConfigError;
//! use tallycache::policy::lru::LruCache;
//!
//! let cache: Result<LruCache<String, i32>, ConfigError> = LruCache::try_with_capacity(16);
//! assert!(cache.is_ok());
//!
//! let bad = LruCache::<String, i32>::try_with_capacity(-1);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// # Example
///
/// ```
/// use tallycache::policy::lfu::LfuCache;
///
/// let err = LfuCache::<u64, u64>::try_with_capacity(-4).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Converts a signed capacity into a `usize`, rejecting negatives.
pub fn validate_capacity(capacity: i64) -> Result<usize, ConfigError> {
    usize::try_from(capacity).map_err(|_| {
        ConfigError::new(format!(
            "capacity must be a non-negative integer, got {capacity}"
        ))
    })
}

// ---------------------------------------------------------------------------
// SnapshotError
// ---------------------------------------------------------------------------

/// Error returned by `to_json` / `merge_json`.
#[derive(Debug)]
pub enum SnapshotError {
    /// The snapshot was not valid JSON or a field had the wrong type.
    Json(serde_json::Error),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Json(e) => write!(f, "snapshot JSON error: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Json(err)
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
