//! Authentication module for managing the seller session.
//!
//! This module provides:
//! - `SessionManager`: sign-in, sign-out, start-up restore and seller updates
//! - `SessionStorage`: paired persistence of the seller record and bearer token
//! - `CredentialStore`: optional remembered passwords in the OS keychain
//!
//! A session is either fully present (seller and token) or absent; a 401 on
//! any authenticated request ends it.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::CredentialStore;
pub use session::{SessionError, SessionManager, SessionState, SIGN_IN_FALLBACK};
pub use storage::{FileStore, KeyValueStore, MemoryStore, SessionStorage};
