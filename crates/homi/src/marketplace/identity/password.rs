use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use rand::rngs::OsRng;

/// The fixed symbol set the strength policy accepts.
pub const ALLOWED_SYMBOLS: &str = "!@#$%^&*()-_=+[]{};:,.?";

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordWeakness {
    TooShort,
    MissingUppercase,
    MissingDigit,
    MissingSymbol,
}

impl PasswordWeakness {
    pub const fn description(self) -> &'static str {
        match self {
            Self::TooShort => "must be at least 8 characters long",
            Self::MissingUppercase => "must contain an uppercase letter",
            Self::MissingDigit => "must contain a digit",
            Self::MissingSymbol => "must contain a symbol from the allowed set",
        }
    }
}

/// Apply the strength policy, collecting every unmet requirement.
pub fn check_strength(candidate: &str) -> Result<(), Vec<PasswordWeakness>> {
    let mut weaknesses = Vec::new();

    if candidate.chars().count() < MIN_PASSWORD_LENGTH {
        weaknesses.push(PasswordWeakness::TooShort);
    }
    if !candidate.chars().any(|c| c.is_ascii_uppercase()) {
        weaknesses.push(PasswordWeakness::MissingUppercase);
    }
    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        weaknesses.push(PasswordWeakness::MissingDigit);
    }
    if !candidate.chars().any(|c| ALLOWED_SYMBOLS.contains(c)) {
        weaknesses.push(PasswordWeakness::MissingSymbol);
    }

    if weaknesses.is_empty() {
        Ok(())
    } else {
        Err(weaknesses)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialHashError {
    #[error("unable to hash credential: {0}")]
    Hash(String),
}

/// One-way, salted, deliberately slow hashing collaborator. Kept behind a
/// trait so an external limiter or a test double can stand in.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialHashError>;
    /// Returns `false` for mismatches and for digests this hasher cannot
    /// parse, so callers see one uniform rejection path.
    fn verify(&self, digest: &str, plaintext: &str) -> Result<bool, CredentialHashError>;
}

/// Argon2id with the library defaults and a per-credential random salt.
#[derive(Debug, Default)]
pub struct Argon2CredentialHasher;

impl CredentialHasher for Argon2CredentialHasher {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| CredentialHashError::Hash(err.to_string()))?;
        Ok(digest.to_string())
    }

    fn verify(&self, digest: &str, plaintext: &str) -> Result<bool, CredentialHashError> {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(false),
        };
        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}
