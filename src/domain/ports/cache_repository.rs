//! CacheRepository port - change cache persistence

use std::path::Path;

use crate::domain::entities::ChangeCache;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors
#[derive(Debug)]
pub enum CacheError {
    /// Document is not valid JSON or has the wrong shape
    InvalidFormat(String),
    /// Written by a newer version of the tool
    UnsupportedVersion { found: u32, supported: u32 },
    /// Another run holds the cache lock
    Locked(String),
    Io(std::io::Error),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::InvalidFormat(msg) => write!(f, "Invalid cache format: {}", msg),
            CacheError::UnsupportedVersion { found, supported } => write!(
                f,
                "Cache version {} is newer than supported version {}",
                found, supported
            ),
            CacheError::Locked(path) => {
                write!(f, "Cache {} is locked by another deployment", path)
            }
            CacheError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(err)
    }
}

/// Loads and saves the change cache.
pub trait CacheRepository {
    /// Load the cache, or an empty one when the file does not exist.
    fn load_or_new(&self, path: &Path) -> CacheResult<ChangeCache>;

    /// Persist atomically (write to a temp file, then rename).
    fn save(&self, cache: &ChangeCache, path: &Path) -> CacheResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_error_display() {
        let err = CacheError::InvalidFormat("expected value at line 1".to_string());
        assert!(err.to_string().contains("expected value"));

        let err = CacheError::UnsupportedVersion {
            found: 3,
            supported: 1,
        };
        assert_eq!(
            err.to_string(),
            "Cache version 3 is newer than supported version 1"
        );
    }
}
