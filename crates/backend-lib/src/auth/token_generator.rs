// ============================
// crates/backend-lib/src/auth/token_generator.rs
// ============================
//! Secure token generation for session and CSRF tokens.
use super::AuthError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, TryRngCore};

/// Default token size in bytes (32 bytes = 256 bits of entropy)
const DEFAULT_TOKEN_BYTES: usize = 32;

/** Generate a cryptographically secure random token
This uses OS-provided entropy to create a secure random token
that is suitable for session IDs and CSRF tokens.
# Errors
`AuthError::RandomSource` if the OS entropy source fails
# Returns
A base64 URL-safe encoded string without padding */
pub fn generate_secure_token() -> Result<String, AuthError> {
    generate_secure_token_with_size(DEFAULT_TOKEN_BYTES)
}

/** Generate a cryptographically secure random token with specified size
# Arguments
* `bytes` - The size of the random token in bytes
# Returns
A base64 URL-safe encoded string without padding */
fn generate_secure_token_with_size(bytes: usize) -> Result<String, AuthError> {
    let mut buffer = vec![0u8; bytes];
    fill_random(&mut buffer)?;
    Ok(URL_SAFE_NO_PAD.encode(buffer))
}

/// Fill `buffer` from the OS random source
pub(crate) fn fill_random(buffer: &mut [u8]) -> Result<(), AuthError> {
    OsRng
        .try_fill_bytes(buffer)
        .map_err(|e| AuthError::RandomSource(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation() {
        // Generate two tokens and verify they're different
        let token1 = generate_secure_token().unwrap();
        let token2 = generate_secure_token().unwrap();

        assert_ne!(token1, token2);

        // 32 bytes of entropy in unpadded base64 is 43 chars
        assert_eq!(token1.len(), 43);

        // Test custom size
        let small_token = generate_secure_token_with_size(16).unwrap();
        let large_token = generate_secure_token_with_size(64).unwrap();

        assert!(small_token.len() < token1.len());
        assert!(large_token.len() > token1.len());
    }

    #[test]
    fn test_token_is_url_safe() {
        let token = generate_secure_token().unwrap();
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
