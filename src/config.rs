//! Server configuration
//!
//! Parsed from command-line flags with environment fallbacks. The database
//! path and signing secret are mandatory; a missing or invalid value stops
//! startup.

use crate::auth::password::{DEFAULT_COST, MAX_COST, MIN_COST};
use anyhow::{bail, Result};
use clap::Parser;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const MIN_SECRET_LEN: usize = 16;
/// Ten years
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Parser, Clone)]
#[command(name = "parley")]
#[command(about = "Parley auth backend - registration, login and session tokens")]
pub struct Config {
    /// SQLite database file for user accounts
    #[arg(long, env = "DB_PATH")]
    pub db_path: PathBuf,

    /// Secret used to sign session tokens
    #[arg(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    pub jwt_secret: String,

    /// Address the HTTP server binds to
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Session token lifetime in hours
    #[arg(long, env = "TOKEN_TTL_HOURS", default_value_t = 24)]
    pub token_ttl_hours: i64,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = DEFAULT_COST)]
    pub bcrypt_cost: u32,
}

impl Config {
    /// Reject values clap cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            bail!("DB_PATH must not be empty");
        }
        if self.jwt_secret.trim().len() < MIN_SECRET_LEN {
            bail!("JWT_SECRET_KEY must be at least {MIN_SECRET_LEN} characters");
        }
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            bail!(
                "TOKEN_TTL_HOURS must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {}",
                self.token_ttl_hours
            );
        }
        if !(MIN_COST..=MAX_COST).contains(&self.bcrypt_cost) {
            bail!(
                "BCRYPT_COST must be between {MIN_COST} and {MAX_COST}, got {}",
                self.bcrypt_cost
            );
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("db_path", &self.db_path)
            .field("jwt_secret", &"<redacted>")
            .field("bind", &self.bind)
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}
