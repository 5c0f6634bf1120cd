//! In-memory [`RemoteStore`] for tests and local demos.
//!
//! Behaves like a well-behaved record store that honors client-assigned ids,
//! with two failure knobs: a global availability toggle (everything fails
//! with a connectivity error) and per-id rejection (the store refuses that
//! record with a validation error). Call counts are recorded so tests can
//! assert which network operations were — or were not — issued.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::models::{Communication, CommunicationType, Contact};
use crate::remote::{RemoteError, RemoteStore};

/// In-memory RemoteStore with failure injection.
#[derive(Clone, Debug, Default)]
pub struct MemoryRemote {
    contacts: Arc<Mutex<Vec<Contact>>>,
    available: Arc<AtomicBool>,
    reject_ids: Arc<Mutex<HashSet<String>>>,
    delete_calls: Arc<Mutex<HashMap<String, u32>>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            available: Arc::new(AtomicBool::new(true)),
            ..Self::default()
        }
    }

    /// Toggle reachability. While unavailable every operation fails with
    /// [`RemoteError::Connectivity`] and the probe reports `false`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Make the store reject any mutation touching `id` with a validation
    /// error.
    pub fn reject_id(&self, id: &str) {
        self.reject_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn clear_rejections(&self) {
        self.reject_ids.lock().unwrap().clear();
    }

    /// Number of delete calls issued for `id`, whatever their outcome.
    pub fn delete_calls_for(&self, id: &str) -> u32 {
        self.delete_calls
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    /// Records currently held by the store, in insertion order.
    pub fn records(&self) -> Vec<Contact> {
        self.contacts.lock().unwrap().clone()
    }

    /// Seed a record directly, bypassing the failure knobs.
    pub fn seed(&self, contact: Contact) {
        self.contacts.lock().unwrap().push(contact);
    }

    fn gate(&self, id: Option<&str>) -> Result<(), RemoteError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(RemoteError::Connectivity(
                "record store unavailable".to_string(),
            ));
        }
        if let Some(id) = id {
            if self.reject_ids.lock().unwrap().contains(id) {
                return Err(RemoteError::Validation(format!(
                    "record {id} rejected"
                )));
            }
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemote {
    async fn check_availability(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, RemoteError> {
        self.gate(None)?;
        Ok(self.contacts.lock().unwrap().clone())
    }

    async fn get_contact(&self, id: &str) -> Result<Contact, RemoteError> {
        self.gate(Some(id))?;
        self.contacts
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    async fn create_contact(&self, contact: &Contact) -> Result<Contact, RemoteError> {
        self.gate(Some(&contact.id))?;
        let mut stored = contact.clone();
        stored.updated_at = Utc::now();
        stored.synced = true;
        stored.deleted = false;

        let mut contacts = self.contacts.lock().unwrap();
        if contacts.iter().any(|c| c.id == stored.id) {
            return Err(RemoteError::Validation(format!(
                "record {} already exists",
                stored.id
            )));
        }
        contacts.push(stored.clone());
        Ok(stored)
    }

    async fn update_contact(&self, id: &str, contact: &Contact) -> Result<Contact, RemoteError> {
        self.gate(Some(id))?;
        let mut contacts = self.contacts.lock().unwrap();
        let existing = contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RemoteError::NotFound)?;
        let mut stored = contact.clone();
        stored.id = id.to_string();
        stored.created_at = existing.created_at;
        stored.updated_at = Utc::now();
        stored.synced = true;
        stored.deleted = false;
        *existing = stored.clone();
        Ok(stored)
    }

    async fn delete_contact(&self, id: &str) -> Result<bool, RemoteError> {
        *self
            .delete_calls
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_insert(0) += 1;
        self.gate(Some(id))?;
        let mut contacts = self.contacts.lock().unwrap();
        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        Ok(contacts.len() < before)
    }

    async fn add_communication(
        &self,
        contact_id: &str,
        types: &[CommunicationType],
        notes: &str,
        date: chrono::DateTime<Utc>,
    ) -> Result<Communication, RemoteError> {
        self.gate(Some(contact_id))?;
        if types.is_empty() {
            return Err(RemoteError::Validation(
                "communication needs at least one type".to_string(),
            ));
        }
        let communication = Communication {
            id: Uuid::new_v4().to_string(),
            types: types.to_vec(),
            notes: notes.to_string(),
            date,
        };
        let mut contacts = self.contacts.lock().unwrap();
        let contact = contacts
            .iter_mut()
            .find(|c| c.id == contact_id)
            .ok_or(RemoteError::NotFound)?;
        contact.last_contacted_at = Some(communication.date);
        contact.communications.insert(0, communication.clone());
        Ok(communication)
    }
}
