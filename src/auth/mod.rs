//! Authentication Module
//! Mission: Registration, login and session tokens over a SQLite credential store

pub mod api;
pub mod errors;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod user_store;
pub mod validation;

pub use api::AuthState;
pub use errors::{AuthError, StoreError, TokenError};
pub use jwt::{Clock, JwtHandler, ManualClock, SystemClock};
pub use middleware::auth_middleware;
pub use password::PasswordHasher;
pub use service::UserService;
pub use user_store::{CredentialStore, UserStore};
