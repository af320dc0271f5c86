//! Argon2id password hashing

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier, Version,
    password_hash::SaltString,
};
use thiserror::Error;
use tracing::error;

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory in KiB
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Cost used for every stored password
pub const HASH_COST: HashCost = HashCost {
    memory_kib: 19_456,
    iterations: 2,
    parallelism: 1,
};

/// Smallest cost Argon2 accepts, for tests only
#[cfg(test)]
pub(crate) const TEST_HASH_COST: HashCost = HashCost {
    memory_kib: 8,
    iterations: 1,
    parallelism: 1,
};

const DUMMY_PASSWORD: &str = "leaderboard-dummy-password";

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    Params(String),

    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hashes and verifies passwords with a fixed Argon2id cost
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new() -> Result<Self, PasswordError> {
        Self::with_cost(HASH_COST)
    }

    pub fn with_cost(cost: HashCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::Params(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, DUMMY_PASSWORD)?;

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a plaintext password into a PHC string
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, password)
    }

    /// Check a plaintext password against a stored digest
    ///
    /// A digest that cannot be parsed counts as a mismatch.
    pub fn verify(&self, digest: &str, password: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Stored password hash is malformed: {}", e);
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Verify against `digest`, or burn one verification and fail when there is none
    ///
    /// Used by login so that an unknown account costs as much as a wrong password.
    pub fn verify_or_dummy(&self, digest: Option<&str>, password: &str) -> bool {
        match digest {
            Some(digest) => self.verify(digest, password),
            None => {
                let _ = self.verify(&self.dummy_hash, password);
                false
            }
        }
    }

    /// [`hash`](Self::hash) on the blocking thread pool
    pub async fn hash_blocking(&self, password: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    /// [`verify_or_dummy`](Self::verify_or_dummy) on the blocking thread pool
    pub async fn verify_blocking(
        &self,
        digest: Option<String>,
        password: String,
    ) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        let matches = tokio::task::spawn_blocking(move || {
            hasher.verify_or_dummy(digest.as_deref(), &password)
        })
        .await?;
        Ok(matches)
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}
