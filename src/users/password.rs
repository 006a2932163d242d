use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tracing::error;

/// How new password digests are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PasswordScheme {
    /// Unsalted hex SHA-256. Deterministic; kept for tables populated by
    /// earlier deployments.
    #[default]
    Sha256,
    /// Salted Argon2id PHC string.
    Argon2,
}

impl PasswordScheme {
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "argon2" => Ok(Self::Argon2),
            other => anyhow::bail!("unknown password scheme {other:?}; use sha256 or argon2"),
        }
    }

    pub fn hash(self, plain: &str) -> anyhow::Result<String> {
        match self {
            Self::Sha256 => Ok(sha256_hex(plain)),
            Self::Argon2 => argon2_hash(plain),
        }
    }
}

/// Lowercase hex SHA-256 of the UTF-8 bytes, always 64 characters.
pub fn sha256_hex(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

fn argon2_hash(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Checks `plain` against a stored digest of either scheme.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    if !stored.starts_with("$argon2") {
        return Ok(sha256_hex(plain).eq_ignore_ascii_case(stored));
    }
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
