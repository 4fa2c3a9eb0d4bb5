/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{CryptoError, Result};

/// Hash a password with a fresh random salt
///
/// Returns a PHC-formatted string safe for database storage. Strength rules
/// are enforced by the caller's request validation, not here.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CryptoError::Hash(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored PHC hash
///
/// `Ok(false)` means the password is wrong; `Err` means the stored hash
/// could not be parsed or verification itself failed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| CryptoError::Hash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CryptoError::Hash(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").expect("should hash");
        assert!(verify_password("secret1", &hash).expect("should verify"));
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("secret1").expect("should hash");
        assert!(!verify_password("secret2", &hash).expect("verification should succeed"));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hash1 = hash_password("secret1").unwrap();
        let hash2 = hash_password("secret1").unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(matches!(
            verify_password("secret1", "not-a-phc-string"),
            Err(CryptoError::Hash(_))
        ));
    }
}
