//! Login, signup and the persisted signed-in user.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::IdentityConfig;

use super::errors::{IdentityError, IdentityResult};
use super::store::{FileRecordStore, RecordStore};

/// Key under which the signed-in user is stored.
pub const USER_KEY: &str = "user";

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// The signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Display name.
    pub username: String,
}

/// Login and signup against a fixed credential pair.
pub struct IdentityService {
    store: Arc<dyn RecordStore>,
    username: String,
    password: String,
}

impl fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityService")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl IdentityService {
    /// Create a service over `store` accepting the configured credentials.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, config: &IdentityConfig) -> Self {
        Self {
            store,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Create a service persisting to `user.json` in the configured data dir.
    #[must_use]
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(Arc::new(FileRecordStore::new(&config.data_dir)), config)
    }

    /// Sign in with the configured credentials.
    ///
    /// # Errors
    /// Returns `InvalidCredentials` on mismatch, or a storage error.
    pub async fn login(&self, username: &str, password: &str) -> IdentityResult<UserIdentity> {
        if username != self.username || password != self.password {
            info!(username, "Rejected login");
            return Err(IdentityError::InvalidCredentials);
        }
        self.sign_in(username).await
    }

    /// Register and sign in a new user.
    ///
    /// # Errors
    /// Returns a validation error for a blank username, mismatched or short
    /// password, or a storage error.
    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> IdentityResult<UserIdentity> {
        let username = username.trim();
        if username.is_empty() {
            return Err(IdentityError::EmptyUsername);
        }
        if password != confirm_password {
            return Err(IdentityError::PasswordMismatch);
        }
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(IdentityError::PasswordTooShort {
                min: MIN_PASSWORD_CHARS,
            });
        }
        self.sign_in(username).await
    }

    /// Forget the signed-in user.
    ///
    /// # Errors
    /// Returns an error if the record cannot be removed.
    pub async fn logout(&self) -> IdentityResult<()> {
        self.store.remove(USER_KEY).await?;
        info!("User signed out");
        Ok(())
    }

    /// The signed-in user, if any.
    ///
    /// # Errors
    /// Returns an error if the record cannot be read or parsed.
    pub async fn current(&self) -> IdentityResult<Option<UserIdentity>> {
        match self.store.load(USER_KEY).await? {
            Some(document) => Ok(Some(serde_json::from_str(&document)?)),
            None => Ok(None),
        }
    }

    async fn sign_in(&self, username: &str) -> IdentityResult<UserIdentity> {
        let user = UserIdentity {
            username: username.to_string(),
        };
        self.store
            .save(USER_KEY, serde_json::to_string(&user)?)
            .await?;
        info!(username, "User signed in");
        Ok(user)
    }
}
