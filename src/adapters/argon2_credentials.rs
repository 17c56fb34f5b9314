//! Argon2id password hashing.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

use crate::domain::error::StockfolioError;
use crate::ports::credential_port::CredentialPort;

pub struct Argon2Credentials {
    params: Params,
}

impl Argon2Credentials {
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Custom cost parameters, mainly so tests can hash cheaply.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Credentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialPort for Argon2Credentials {
    fn hash(&self, password: &str) -> Result<String, StockfolioError> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StockfolioError::Internal {
                reason: format!("password hashing failed: {}", e),
            })
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, StockfolioError> {
        let parsed = PasswordHash::new(hash).map_err(|e| StockfolioError::Internal {
            reason: format!("stored password hash is malformed: {}", e),
        })?;
        // Parameters are read from the stored hash, not from `self`.
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2Credentials {
        Argon2Credentials::with_params(Params::new(8, 1, 1, None).unwrap())
    }

    #[test]
    fn hash_then_verify() {
        let creds = cheap();
        let hash = creds.hash("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(creds.verify("hunter22", &hash).unwrap());
        assert!(!creds.verify("hunter23", &hash).unwrap());
    }

    #[test]
    fn salts_differ() {
        let creds = cheap();
        assert_ne!(creds.hash("same").unwrap(), creds.hash("same").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(cheap().verify("x", "not-a-hash").is_err());
    }
}
