//! # Local mirror — the client-held copy of all contact records
//!
//! [`MirrorState`] is the single shared mutable resource of the core: the
//! ordered contact list, the selected contact, the pending-mutation queue,
//! and the offline/syncing/loading flags. It is only ever mutated through
//! [`MirrorState::apply`], which takes a [`Transition`] and performs a pure
//! local state change — no I/O, no clock reads. The [`crate::Dispatcher`]
//! owns the only instance and is the only caller.
//!
//! ## Invariants
//!
//! - `contacts` keeps insertion order; there is no implicit sort.
//! - Exactly one contact per `id`: updates replace, creates append, and a
//!   create for an existing id degrades to a replace.
//! - At most one [`PendingChange`] per contact id. A newer change replaces
//!   the queued one, with two refinements:
//!   - an `update` over a queued `create` keeps kind `create` (the record
//!     has still never reached the store) while carrying the latest data;
//!   - a `delete` over a queued `create` collapses to a pure local forget —
//!     the contact and its pending entry both vanish, and no remote delete
//!     is ever owed.
//! - Deleting while offline tombstones (`deleted = true`, `synced = false`)
//!   instead of removing, so a later sync can still issue the remote delete.
//! - Communications are prepended (newest first) and never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ChangeKind, Communication, Contact, PendingChange};

/// Full client-side state: the contact mirror plus sync bookkeeping.
/// Serialized as-is into the durable snapshot slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MirrorState {
    /// Insertion-ordered contact records, tombstones included.
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub selected_contact_id: Option<String>,
    /// Mutations recorded while offline, at most one per contact id.
    #[serde(default)]
    pub pending_changes: Vec<PendingChange>,
    #[serde(default)]
    pub offline_mode: bool,
    #[serde(default)]
    pub syncing: bool,
    #[serde(default)]
    pub loading: bool,
    /// Last user-visible notice or error; dismissed by setting `None`.
    #[serde(default)]
    pub notice: Option<String>,
}

/// A pure local state change. The remote half of each operation lives in the
/// dispatcher; transitions never touch the network.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Replace the whole contact list (post-sync reconciliation).
    SetContacts(Vec<Contact>),
    /// Append a contact, or replace it if the id already exists.
    AddContact(Contact),
    /// Replace the contact with the same id. Unknown ids are ignored.
    UpdateContact(Contact),
    /// Replace the contact stored under `local_id` with `contact`, which may
    /// carry a different (server-assigned) id.
    ReplaceContact { local_id: String, contact: Contact },
    /// Re-insert a contact at `index` (clamped to the list length), or
    /// replace in place if the id already exists. Used to restore a record
    /// at its original position after a failed remote delete.
    InsertContact { index: usize, contact: Contact },
    /// Tombstone when offline, remove outright when online.
    DeleteContact(String),
    /// Drop a contact from the mirror unconditionally, tombstoned or not.
    ForgetContact(String),
    Select(Option<String>),
    /// Prepend a communication and advance `last_contacted_at`.
    AddCommunication {
        contact_id: String,
        communication: Communication,
        synced: bool,
    },
    AddPendingChange(PendingChange),
    RemovePendingChange(String),
    ClearPendingChanges,
    SetOfflineMode(bool),
    SetSyncing(bool),
    SetLoading(bool),
    SetNotice(Option<String>),
}

impl MirrorState {
    /// Apply a transition in place. Pure: same state + same transition
    /// always yields the same result.
    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::SetContacts(contacts) => {
                self.contacts = contacts;
                if let Some(selected) = &self.selected_contact_id {
                    if !self.contacts.iter().any(|c| c.id == *selected) {
                        self.selected_contact_id = None;
                    }
                }
            }

            Transition::AddContact(contact) => {
                if let Some(existing) =
                    self.contacts.iter_mut().find(|c| c.id == contact.id)
                {
                    *existing = contact;
                } else {
                    self.contacts.push(contact);
                }
            }

            Transition::UpdateContact(contact) => {
                if let Some(existing) =
                    self.contacts.iter_mut().find(|c| c.id == contact.id)
                {
                    *existing = contact;
                }
            }

            Transition::ReplaceContact { local_id, contact } => {
                if let Some(existing) =
                    self.contacts.iter_mut().find(|c| c.id == local_id)
                {
                    if self.selected_contact_id.as_deref() == Some(local_id.as_str()) {
                        self.selected_contact_id = Some(contact.id.clone());
                    }
                    *existing = contact;
                }
            }

            Transition::InsertContact { index, contact } => {
                if let Some(existing) =
                    self.contacts.iter_mut().find(|c| c.id == contact.id)
                {
                    *existing = contact;
                } else {
                    let index = index.min(self.contacts.len());
                    self.contacts.insert(index, contact);
                }
            }

            Transition::DeleteContact(id) => {
                if self.offline_mode {
                    if let Some(contact) =
                        self.contacts.iter_mut().find(|c| c.id == id)
                    {
                        contact.deleted = true;
                        contact.synced = false;
                    }
                } else {
                    self.contacts.retain(|c| c.id != id);
                }
                if self.selected_contact_id.as_deref() == Some(id.as_str()) {
                    self.selected_contact_id = None;
                }
            }

            Transition::ForgetContact(id) => {
                self.contacts.retain(|c| c.id != id);
                if self.selected_contact_id.as_deref() == Some(id.as_str()) {
                    self.selected_contact_id = None;
                }
            }

            Transition::Select(id) => {
                self.selected_contact_id = match id {
                    Some(id) if self.contacts.iter().any(|c| c.id == id) => Some(id),
                    _ => None,
                };
            }

            Transition::AddCommunication {
                contact_id,
                communication,
                synced,
            } => {
                if let Some(contact) =
                    self.contacts.iter_mut().find(|c| c.id == contact_id)
                {
                    contact.last_contacted_at = Some(communication.date);
                    contact.updated_at = latest(contact.updated_at, communication.date);
                    contact.communications.insert(0, communication);
                    contact.synced = synced;
                }
            }

            Transition::AddPendingChange(change) => self.enqueue_change(change),

            Transition::RemovePendingChange(id) => {
                self.pending_changes.retain(|c| c.id != id);
            }

            Transition::ClearPendingChanges => self.pending_changes.clear(),

            Transition::SetOfflineMode(offline) => self.offline_mode = offline,
            Transition::SetSyncing(syncing) => self.syncing = syncing,
            Transition::SetLoading(loading) => self.loading = loading,
            Transition::SetNotice(notice) => self.notice = notice,
        }
    }

    /// Coalesce into the pending queue: one entry per contact id.
    fn enqueue_change(&mut self, mut change: PendingChange) {
        if let Some(existing) =
            self.pending_changes.iter_mut().find(|c| c.id == change.id)
        {
            match (existing.kind, change.kind) {
                // The record never reached the store, so the eventual replay
                // is still a create, just with the latest data.
                (ChangeKind::Create, ChangeKind::Update) => {
                    change.kind = ChangeKind::Create;
                }
                // Deleting a never-synced record: forget it locally, no
                // network delete is owed.
                (ChangeKind::Create, ChangeKind::Delete) => {
                    let id = change.id;
                    self.pending_changes.retain(|c| c.id != id);
                    self.contacts.retain(|c| c.id != id);
                    if self.selected_contact_id.as_deref() == Some(id.as_str()) {
                        self.selected_contact_id = None;
                    }
                    return;
                }
                _ => {}
            }
            *existing = change;
        } else {
            self.pending_changes.push(change);
        }
    }

    pub fn contact(&self, id: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn selected_contact(&self) -> Option<&Contact> {
        self.selected_contact_id
            .as_deref()
            .and_then(|id| self.contact(id))
    }

    /// Contacts with local changes the store has not confirmed, tombstones
    /// included. This is exactly the set the sync engine drains.
    pub fn unsynced_contacts(&self) -> Vec<Contact> {
        self.contacts.iter().filter(|c| !c.synced).cloned().collect()
    }

    /// Live (non-tombstoned) contact count, used for the Dunbar cap.
    pub fn live_contact_count(&self) -> usize {
        self.contacts.iter().filter(|c| !c.deleted).count()
    }

    pub fn pending_change(&self, id: &str) -> Option<&PendingChange> {
        self.pending_changes.iter().find(|c| c.id == id)
    }

    /// Whether a queued `create` exists for `id`, i.e. the record has only
    /// ever existed locally.
    pub fn has_pending_create(&self, id: &str) -> bool {
        self.pending_changes
            .iter()
            .any(|c| c.id == id && c.kind == ChangeKind::Create)
    }
}

fn latest(a: DateTime<Utc>, b: DateTime<Utc>) -> DateTime<Utc> {
    if b > a {
        b
    } else {
        a
    }
}
