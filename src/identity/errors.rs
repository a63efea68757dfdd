//! Error types for the identity layer.

use thiserror::Error;

/// Identity errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Username or password does not match the configured credentials.
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,
    /// Password is shorter than the minimum.
    #[error("Password must be at least {min} characters long")]
    PasswordTooShort {
        /// Minimum length in characters.
        min: usize,
    },
    /// Username is blank.
    #[error("Username must not be empty")]
    EmptyUsername,
    /// Reading or writing the record failed.
    #[error("identity storage error: {0}")]
    Io(#[from] std::io::Error),
    /// The stored record cannot be (de)serialized.
    #[error("identity record is invalid: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IdentityError {
    /// Whether the error is caused by user input rather than storage.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Serialization(_))
    }
}

/// Convenience result alias for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
