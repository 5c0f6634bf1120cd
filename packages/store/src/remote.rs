//! # Remote record store — the seam between the core and the hosted database
//!
//! [`RemoteStore`] is an async trait over the external record store's six
//! operations plus the connectivity probe. All remote calls the dispatcher
//! and sync engine make go through this trait, so the same logic works
//! against the HTTP adapter (the `api` crate) or the in-memory
//! [`crate::MemoryRemote`] used in tests.
//!
//! Implementations exchange the canonical [`Contact`] — translating to and
//! from the store's native field names is entirely their concern.
//!
//! ## Error taxonomy
//!
//! [`RemoteError`] is deliberately typed so the dispatcher branches on the
//! variant, never on message text:
//!
//! - [`RemoteError::Connectivity`] — network-unreachable. Flips the
//!   dispatcher to offline mode.
//! - [`RemoteError::Validation`] — the store rejected the request. Terminal
//!   for that single intent; does **not** change offline mode.
//! - [`RemoteError::NotFound`] — the record does not exist remotely.

use chrono::{DateTime, Utc};

use crate::models::{Communication, CommunicationType, Contact};

/// Failure modes of the remote record store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("record store unreachable: {0}")]
    Connectivity(String),
    #[error("record store rejected the request: {0}")]
    Validation(String),
    #[error("record not found")]
    NotFound,
}

impl RemoteError {
    /// Whether this failure means the store is unreachable (as opposed to
    /// having rejected the request).
    pub fn is_connectivity(&self) -> bool {
        matches!(self, RemoteError::Connectivity(_))
    }
}

/// Async trait over the hosted record store's operations.
pub trait RemoteStore {
    /// Bounded-time reachability check. Never fails: any error, abort, or
    /// timeout reports as `false`.
    fn check_availability(&self) -> impl std::future::Future<Output = bool>;

    fn list_contacts(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Contact>, RemoteError>>;

    fn get_contact(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Contact, RemoteError>>;

    /// Create a record. The store assigns its own id and timestamps; the
    /// returned contact is authoritative.
    fn create_contact(
        &self,
        contact: &Contact,
    ) -> impl std::future::Future<Output = Result<Contact, RemoteError>>;

    fn update_contact(
        &self,
        id: &str,
        contact: &Contact,
    ) -> impl std::future::Future<Output = Result<Contact, RemoteError>>;

    fn delete_contact(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RemoteError>>;

    /// Record a communication. `date` may be backdated; the stored entry
    /// keeps it verbatim.
    fn add_communication(
        &self,
        contact_id: &str,
        types: &[CommunicationType],
        notes: &str,
        date: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Communication, RemoteError>>;
}
