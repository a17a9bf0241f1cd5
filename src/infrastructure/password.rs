//! bcrypt password hashing for seed data.

use crate::domain::ports::PasswordHasher;

/// Cost used for seeded account passwords.
pub const BCRYPT_COST: u32 = 10;

/// Produces `$2y$` bcrypt hashes, the prefix PHP's `password_hash` emits.
#[derive(Debug, Default, Clone, Copy)]
pub struct BcryptHasher;

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> Result<String, String> {
        bcrypt::hash_with_result(plain, BCRYPT_COST)
            .map(|parts| parts.format_for_version(bcrypt::Version::TwoY))
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_2y_cost_10_and_verifies() {
        let hash = BcryptHasher.hash("correct horse").unwrap();

        assert!(hash.starts_with("$2y$10$"));
        assert_eq!(hash.len(), 60);
        assert!(bcrypt::verify("correct horse", &hash).unwrap());
        assert!(!bcrypt::verify("wrong", &hash).unwrap());
    }

    #[test]
    fn salts_differ_between_calls() {
        let a = BcryptHasher.hash("same").unwrap();
        let b = BcryptHasher.hash("same").unwrap();
        assert_ne!(a, b);
    }
}
