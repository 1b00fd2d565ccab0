// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use super::token_generator::fill_random;
use super::AuthError;
use scrypt::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};

/// Minimum accepted password length in bytes
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length in bytes
pub const MAX_PASSWORD_LENGTH: usize = 72;

/// Salt size in bytes
const SALT_BYTES: usize = 16;

/// One-way password hasher using scrypt with a configurable work factor.
///
/// Hashes are PHC strings, so the parameters travel with each hash and
/// verification keeps working after the work factor is changed.
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::recommended(),
        }
    }
}

impl CredentialHasher {
    /// Create a hasher with CPU/memory cost `2^log_n`
    pub fn with_log_n(log_n: u8) -> Result<Self, AuthError> {
        let params = Params::new(
            log_n,
            Params::RECOMMENDED_R,
            Params::RECOMMENDED_P,
            Params::RECOMMENDED_LEN,
        )
        .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Self { params })
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let mut salt_bytes = [0u8; SALT_BYTES];
        fill_random(&mut salt_bytes)?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hashing(e.to_string()))?;

        let hash = Scrypt
            .hash_password_customized(plain.as_bytes(), None, None, self.params, &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// Verify a password against a hash.
    ///
    /// A mismatch is `Ok(false)`; only a malformed hash is an error.
    pub fn verify(&self, hash: &str, plain: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        match Scrypt.verify_password(plain.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hashing(e.to_string())),
        }
    }
}
