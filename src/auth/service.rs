//! User Domain
//! Mission: Registration, login and token authentication, free of any HTTP types

use crate::auth::errors::{AuthError, StoreError};
use crate::auth::jwt::JwtHandler;
use crate::auth::models::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, User, UserResponse,
};
use crate::auth::password::PasswordHasher;
use crate::auth::user_store::CredentialStore;
use crate::auth::validation::{normalize_email, validate_login, validate_registration};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Orchestrates the credential store, password hasher and token handler
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<PasswordHasher>,
    jwt: Arc<JwtHandler>,
}

impl UserService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<PasswordHasher>,
        jwt: Arc<JwtHandler>,
    ) -> Self {
        Self { store, hasher, jwt }
    }

    /// Validate, hash, persist. Nothing is written unless validation passes.
    pub fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        validate_registration(&request).map_err(AuthError::Validation)?;

        let email = normalize_email(&request.email);
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let password_hash = self.hasher.hash(&request.password).map_err(|e| {
            error!(journey = "register", error = %e, "Password hashing failed");
            AuthError::Internal
        })?;

        match self.store.create_user(&email, &password_hash, name) {
            Ok(user) => {
                info!(journey = "register", user_id = %user.id, "✅ User registered");
                Ok(user)
            }
            Err(StoreError::Conflict) => {
                warn!(journey = "register", "Registration rejected: email already registered");
                Err(AuthError::UserAlreadyExists)
            }
            Err(e) => {
                error!(journey = "register", error = %e, "Failed to persist user");
                Err(AuthError::Internal)
            }
        }
    }

    /// Check credentials and issue a session token. Unknown email and wrong
    /// password produce the same error.
    pub fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        validate_login(&request).map_err(AuthError::Validation)?;

        let email = normalize_email(&request.email);
        let user = self.store.find_user_by_email(&email).map_err(|e| {
            error!(journey = "login", error = %e, "Failed to look up user");
            AuthError::Internal
        })?;

        let Some(user) = user else {
            self.hasher.verify_dummy(&request.password);
            warn!(journey = "login", "❌ Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        };

        let valid = self
            .hasher
            .verify(&request.password, &user.password_hash)
            .map_err(|e| {
                error!(journey = "login", user_id = %user.id, error = %e, "Stored hash unreadable");
                AuthError::Internal
            })?;
        if !valid {
            warn!(journey = "login", "❌ Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.jwt.issue(&user).map_err(|e| {
            error!(journey = "login", user_id = %user.id, error = %e, "Token issue failed");
            AuthError::Internal
        })?;

        info!(journey = "login", user_id = %user.id, "✅ Login successful");

        Ok(LoginResponse {
            token: issued.token,
            expires_in: issued.expires_in,
            user: UserResponse::from_user(&user),
        })
    }

    /// Verify a bearer token and return its claims
    pub fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        self.jwt.verify(token).map_err(AuthError::from)
    }

    /// Resolve verified claims to the stored account
    pub fn current_user(&self, claims: &Claims) -> Result<User, AuthError> {
        let id = claims.user_id().ok_or(AuthError::InvalidToken)?;
        self.store
            .find_user_by_id(&id)
            .map_err(|e| {
                error!(journey = "me", error = %e, "Failed to load user");
                AuthError::Internal
            })?
            .ok_or(AuthError::InvalidToken)
    }
}
