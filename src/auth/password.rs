//! Password Hashing
//! Mission: Salted one-way credential hashes with bcrypt

use anyhow::{Context, Result};
use bcrypt::{hash, verify};

pub use bcrypt::DEFAULT_COST;

/// bcrypt accepts costs in this range
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Hashes and verifies passwords at a fixed bcrypt cost
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    cost: u32,
    // Verified against when the account does not exist, so a miss costs
    // the same as a wrong password.
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            anyhow::bail!("bcrypt cost must be between {MIN_COST} and {MAX_COST}, got {cost}");
        }
        let dummy_hash =
            hash("parley-dummy-password", cost).context("Failed to prepare dummy hash")?;
        Ok(Self { cost, dummy_hash })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a plaintext password with a fresh salt
    pub fn hash(&self, password: &str) -> Result<String> {
        hash(password, self.cost).context("Failed to hash password")
    }

    /// Check a plaintext password against a stored hash
    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        verify(password, password_hash).context("Failed to verify password")
    }

    /// Burn one verification against the dummy hash; always false
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = verify(password, &self.dummy_hash);
        false
    }
}
