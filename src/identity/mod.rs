//! Signed-in user identity.
//!
//! Login is checked against one configured credential pair; the signed-in
//! user is persisted as a single JSON record under the `user` key.

pub mod errors;
pub mod service;
pub mod store;

pub use errors::{IdentityError, IdentityResult};
pub use service::{IdentityService, MIN_PASSWORD_CHARS, USER_KEY, UserIdentity};
pub use store::{FileRecordStore, MemoryRecordStore, RecordStore, StoreFuture};
