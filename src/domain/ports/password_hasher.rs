//! PasswordHasher port - hashing for password seed fields

/// Hashes plain-text passwords before they are bound into seed SQL.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, String>;
}
