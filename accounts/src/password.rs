//! Argon2id password hashing in PHC string format.

use std::sync::OnceLock;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::AccountError;

const DUMMY_PASSWORD: &str = "dailyread-absent-account";

/// Argon2id cost parameters for new hashes.
///
/// Verification reads the parameters out of the stored hash, so changing
/// these only affects passwords hashed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordHashing {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordHashing {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl PasswordHashing {
    fn argon2(&self) -> Result<Argon2<'static>, AccountError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| AccountError::Hashing(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    pub fn hash(&self, password: &str) -> Result<String, AccountError> {
        let mut salt = [0u8; 16];
        OsRng.fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt).map_err(|e| AccountError::Hashing(e.to_string()))?;
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AccountError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify against a throwaway hash made with these parameters, so a
    /// missing account costs the same as a wrong password. Always `false`.
    pub fn verify_absent(&self, password: &str, dummy: &OnceLock<String>) -> Result<bool, AccountError> {
        let phc = match dummy.get() {
            Some(phc) => phc,
            None => {
                let fresh = self.hash(DUMMY_PASSWORD)?;
                dummy.get_or_init(|| fresh)
            }
        };
        self.verify(password, phc);
        Ok(false)
    }

    /// A malformed stored hash verifies as `false`.
    pub fn verify(&self, password: &str, phc: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(phc) else {
            tracing::warn!("stored password hash is malformed");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
