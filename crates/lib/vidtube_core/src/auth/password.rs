//! Password hashing via bcrypt.

use crate::error::Error;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> Result<String, Error> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| Error::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash. bcrypt's comparison is
/// constant-time over the digest.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, Error> {
    bcrypt::verify(password, hash).map_err(|e| Error::Internal(format!("bcrypt verify: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }
}
