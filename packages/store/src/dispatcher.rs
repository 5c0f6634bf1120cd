//! # Mutation dispatcher — the online/offline state machine
//!
//! [`Dispatcher`] is the core of the crate. It owns the only
//! [`MirrorState`] instance and is the sole writer to it: the UI (or any
//! other host) expresses every change as an [`Intent`] and hands it to
//! [`Dispatcher::dispatch`]. Each intent is applied to the local mirror
//! first — the mirror is authoritative for display regardless of server
//! reachability — and then, in online mode, pushed to the remote record
//! store.
//!
//! ## Mode transitions
//!
//! A remote call failing with [`crate::remote::RemoteError::Connectivity`] flips the
//! dispatcher into offline mode and queues the mutation as a
//! [`PendingChange`]. Validation errors are terminal for that single intent
//! and never change the mode. The way back online is deliberately narrow:
//! only a fully successful [`sync`](Dispatcher::sync) clears offline mode.
//! [`recheck_connectivity`](Dispatcher::recheck_connectivity) — which hosts
//! should call on the configured interval while offline — merely surfaces a
//! "ready to sync" notice, so a user's pending review is never silently
//! replayed.
//!
//! ## Persistence
//!
//! Every accepted transition is written through to the [`SnapshotStore`];
//! [`Dispatcher::load`] reads the slot once at startup, degrading a corrupt
//! snapshot to an empty mirror plus a warning. Registered listeners are
//! notified after every committed transition.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::KeeptouchConfig;
use crate::mirror::{MirrorState, Transition};
use crate::models::{
    Address, Birthday, ChangeKind, Communication, CommunicationType, Contact,
    ContactCategory, ContactStatus, MaritalStatus, PendingChange,
};
use crate::remote::RemoteStore;
use crate::snapshot::SnapshotStore;

/// Form input for a new contact. The dispatcher assigns the id and
/// timestamps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContactDraft {
    pub name: String,
    pub role: String,
    pub status: ContactStatus,
    pub category: ContactCategory,
    pub description: String,
    pub picture: Option<String>,
    pub birthday: Option<Birthday>,
    pub age: Option<u32>,
    pub address: Address,
    pub has_kids: bool,
    pub number_of_kids: Option<u32>,
    pub marital_status: Option<MaritalStatus>,
    pub additional_details: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

impl ContactDraft {
    fn into_contact(self, now: DateTime<Utc>, synced: bool) -> Contact {
        Contact {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            role: self.role,
            status: self.status,
            category: self.category,
            description: self.description,
            picture: self.picture,
            birthday: self.birthday,
            age: self.age,
            address: self.address,
            has_kids: self.has_kids,
            // Meaningless without kids; normalise away.
            number_of_kids: if self.has_kids { self.number_of_kids } else { None },
            marital_status: self.marital_status,
            additional_details: self.additional_details,
            phone_number: self.phone_number,
            email: self.email,
            communications: Vec::new(),
            last_contacted_at: None,
            created_at: now,
            updated_at: now,
            synced,
            deleted: false,
        }
    }
}

/// A user-level operation against the contact mirror.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    Create(ContactDraft),
    /// Whole-record replace by id.
    Update(Contact),
    Delete(String),
    LogCommunication {
        contact_id: String,
        /// Non-empty set of channels.
        types: Vec<CommunicationType>,
        notes: String,
        /// Defaults to now; may be backdated but not future-dated.
        date: Option<DateTime<Utc>>,
    },
    Select(Option<String>),
}

type Listener = Box<dyn Fn(&MirrorState)>;

/// The offline-tolerant sync core: local mirror + remote store + durable
/// snapshot, driven by [`Intent`]s.
pub struct Dispatcher<R, S> {
    state: MirrorState,
    remote: R,
    snapshot: S,
    config: KeeptouchConfig,
    listeners: Vec<Listener>,
}

impl<R: RemoteStore, S: SnapshotStore> Dispatcher<R, S> {
    pub fn new(remote: R, snapshot: S, config: KeeptouchConfig) -> Self {
        Self {
            state: MirrorState::default(),
            remote,
            snapshot,
            config,
            listeners: Vec::new(),
        }
    }

    /// Current mirror state. Read-only; all writes go through
    /// [`dispatch`](Self::dispatch).
    pub fn state(&self) -> &MirrorState {
        &self.state
    }

    pub fn config(&self) -> &KeeptouchConfig {
        &self.config
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Register a listener invoked after every committed transition.
    pub fn subscribe(&mut self, listener: impl Fn(&MirrorState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Startup: restore the durable snapshot (once, before any mutation),
    /// then probe the record store and fall back to offline mode when it is
    /// unreachable. A corrupt snapshot degrades to an empty mirror plus a
    /// warning notice.
    pub async fn load(&mut self) {
        match self.snapshot.load().await {
            Ok(Some(mut saved)) => {
                // Transient flags never survive a restart.
                saved.loading = false;
                saved.syncing = false;
                self.state = saved;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("snapshot slot unreadable, starting empty: {e}");
                self.state = MirrorState::default();
                self.state.notice = Some("Failed to load saved contacts.".to_string());
            }
        }
        self.notify();

        if !self.remote.check_availability().await {
            warn!("record store unreachable at startup, entering offline mode");
            self.commit(Transition::SetOfflineMode(true)).await;
            self.commit(Transition::SetNotice(Some(
                "Unable to connect to the server. Working in offline mode.".to_string(),
            )))
            .await;
        }
    }

    /// Apply one intent: always to the local mirror, and to the record store
    /// when online. Errors surface as a dismissible notice on the state;
    /// this never panics and never leaves `loading` set.
    pub async fn dispatch(&mut self, intent: Intent) {
        self.commit(Transition::SetLoading(true)).await;
        match intent {
            Intent::Create(draft) => self.create(draft).await,
            Intent::Update(contact) => self.update(contact).await,
            Intent::Delete(id) => self.delete(id).await,
            Intent::LogCommunication {
                contact_id,
                types,
                notes,
                date,
            } => self.log_communication(contact_id, types, notes, date).await,
            Intent::Select(id) => self.commit(Transition::Select(id)).await,
        }
        self.commit(Transition::SetLoading(false)).await;
    }

    async fn create(&mut self, draft: ContactDraft) {
        if draft.name.trim().is_empty() {
            self.notice("A contact needs a name.").await;
            return;
        }
        let cap = self.config.contacts.max_contacts;
        if self.state.live_contact_count() >= cap {
            self.notice(&format!(
                "Contact limit reached ({cap}). Remove a contact before adding another."
            ))
            .await;
            return;
        }

        let offline = self.state.offline_mode;
        let contact = draft.into_contact(Utc::now(), !offline);
        debug!(id = %contact.id, offline, "create contact");
        self.commit(Transition::AddContact(contact.clone())).await;

        if offline {
            let id = contact.id.clone();
            self.enqueue(ChangeKind::Create, &id, Some(contact)).await;
            return;
        }

        match self.remote.create_contact(&contact).await {
            Ok(mut server) => {
                server.synced = true;
                self.commit(Transition::ReplaceContact {
                    local_id: contact.id.clone(),
                    contact: server,
                })
                .await;
            }
            Err(e) if e.is_connectivity() => {
                self.go_offline().await;
                let mut local = contact.clone();
                local.synced = false;
                let id = local.id.clone();
                self.commit(Transition::UpdateContact(local.clone())).await;
                self.enqueue(ChangeKind::Create, &id, Some(local)).await;
            }
            Err(e) => self.notice(&e.to_string()).await,
        }
    }

    async fn update(&mut self, mut contact: Contact) {
        if contact.name.trim().is_empty() {
            self.notice("A contact needs a name.").await;
            return;
        }
        if self.state.contact(&contact.id).is_none() {
            self.notice("Cannot update: contact not found.").await;
            return;
        }

        let offline = self.state.offline_mode;
        contact.updated_at = Utc::now();
        contact.synced = !offline;
        debug!(id = %contact.id, offline, "update contact");
        self.commit(Transition::UpdateContact(contact.clone())).await;

        if offline {
            let id = contact.id.clone();
            self.enqueue(ChangeKind::Update, &id, Some(contact)).await;
            return;
        }

        match self.remote.update_contact(&contact.id, &contact).await {
            Ok(mut server) => {
                server.synced = true;
                self.commit(Transition::UpdateContact(server)).await;
            }
            Err(e) if e.is_connectivity() => {
                self.go_offline().await;
                contact.synced = false;
                let id = contact.id.clone();
                self.commit(Transition::UpdateContact(contact.clone())).await;
                self.enqueue(ChangeKind::Update, &id, Some(contact)).await;
            }
            Err(e) => self.notice(&e.to_string()).await,
        }
    }

    async fn delete(&mut self, id: String) {
        let Some(position) = self.state.contacts.iter().position(|c| c.id == id) else {
            self.notice("Cannot delete: contact not found.").await;
            return;
        };
        let contact = self.state.contacts[position].clone();

        if self.state.offline_mode {
            debug!(id = %id, "tombstone contact (offline)");
            self.commit(Transition::DeleteContact(id.clone())).await;
            self.enqueue(ChangeKind::Delete, &id, None).await;
            return;
        }

        debug!(id = %id, "delete contact");
        self.commit(Transition::DeleteContact(id.clone())).await;

        match self.remote.delete_contact(&id).await {
            Ok(_) => {}
            Err(e) if e.is_connectivity() => {
                self.go_offline().await;
                // The record left the mirror above; bring it back as a
                // tombstone at its original position so sync can still
                // issue the remote delete.
                let mut tombstone = contact;
                tombstone.deleted = true;
                tombstone.synced = false;
                self.commit(Transition::InsertContact {
                    index: position,
                    contact: tombstone,
                })
                .await;
                self.enqueue(ChangeKind::Delete, &id, None).await;
            }
            Err(e) => self.notice(&e.to_string()).await,
        }
    }

    async fn log_communication(
        &mut self,
        contact_id: String,
        types: Vec<CommunicationType>,
        notes: String,
        date: Option<DateTime<Utc>>,
    ) {
        if types.is_empty() {
            self.notice("A communication needs at least one type.").await;
            return;
        }
        let now = Utc::now();
        let date = date.unwrap_or(now);
        if date > now {
            self.notice("A communication cannot be dated in the future.").await;
            return;
        }
        if self.state.contact(&contact_id).is_none() {
            self.notice("Cannot log communication: contact not found.").await;
            return;
        }

        let offline = self.state.offline_mode;
        let communication = Communication {
            id: Uuid::new_v4().to_string(),
            types: types.clone(),
            notes: notes.clone(),
            date,
        };
        debug!(contact = %contact_id, offline, "log communication");
        self.commit(Transition::AddCommunication {
            contact_id: contact_id.clone(),
            communication,
            synced: !offline,
        })
        .await;

        if offline {
            let mutated = self.state.contact(&contact_id).cloned();
            self.enqueue(ChangeKind::Update, &contact_id, mutated).await;
            return;
        }

        let result = match self.remote.add_communication(&contact_id, &types, &notes, date).await {
            Ok(_) => self.remote.get_contact(&contact_id).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(mut fresh) => {
                fresh.synced = true;
                self.commit(Transition::UpdateContact(fresh)).await;
            }
            Err(e) if e.is_connectivity() => {
                self.go_offline().await;
                if let Some(mut mutated) = self.state.contact(&contact_id).cloned() {
                    mutated.synced = false;
                    self.commit(Transition::UpdateContact(mutated.clone())).await;
                    self.enqueue(ChangeKind::Update, &contact_id, Some(mutated)).await;
                }
            }
            Err(e) => self.notice(&e.to_string()).await,
        }
    }

    /// While offline, re-probe the record store. A reachable store only
    /// surfaces a "ready to sync" notice — the explicit sync call remains
    /// the sole path back online.
    pub async fn recheck_connectivity(&mut self) {
        if !self.state.offline_mode {
            return;
        }
        if self.remote.check_availability().await {
            debug!("connection restored, awaiting explicit sync");
            self.commit(Transition::SetNotice(Some(
                "Connection restored. Run sync to upload your changes.".to_string(),
            )))
            .await;
        }
    }

    /// Dismiss the current notice.
    pub async fn dismiss_notice(&mut self) {
        self.commit(Transition::SetNotice(None)).await;
    }

    async fn go_offline(&mut self) {
        if !self.state.offline_mode {
            warn!("connectivity error, switching to offline mode");
            self.commit(Transition::SetOfflineMode(true)).await;
        }
        self.commit(Transition::SetNotice(Some(
            "Network connection lost. Working in offline mode.".to_string(),
        )))
        .await;
    }

    async fn enqueue(&mut self, kind: ChangeKind, id: &str, data: Option<Contact>) {
        self.commit(Transition::AddPendingChange(PendingChange {
            kind,
            id: id.to_string(),
            data,
            timestamp: Utc::now(),
        }))
        .await;
    }

    async fn notice(&mut self, message: &str) {
        self.commit(Transition::SetNotice(Some(message.to_string()))).await;
    }

    /// Apply a transition, write the snapshot through, notify listeners.
    pub(crate) async fn commit(&mut self, transition: Transition) {
        self.state.apply(transition);
        if let Err(e) = self.snapshot.save(&self.state).await {
            warn!("failed to persist snapshot: {e}");
            self.state.notice = Some("Failed to save contacts locally.".to_string());
        }
        self.notify();
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(&self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRemote;
    use crate::snapshot::{MemorySnapshot, SnapshotStore};
    use chrono::TimeZone;
    use std::cell::Cell;
    use std::rc::Rc;

    fn dispatcher() -> Dispatcher<MemoryRemote, MemorySnapshot> {
        Dispatcher::new(
            MemoryRemote::new(),
            MemorySnapshot::new(),
            KeeptouchConfig::default().with_retry_backoff_ms(0),
        )
    }

    fn draft(name: &str) -> ContactDraft {
        ContactDraft {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_online_create_reaches_remote() {
        let mut d = dispatcher();
        d.dispatch(Intent::Create(draft("Ada"))).await;

        assert_eq!(d.state().contacts.len(), 1);
        let contact = &d.state().contacts[0];
        assert!(contact.synced);
        assert_eq!(d.remote().records().len(), 1);
        assert_eq!(d.remote().records()[0].id, contact.id);
        assert!(d.state().pending_changes.is_empty());
        assert!(!d.state().offline_mode);
        assert!(!d.state().loading);
    }

    #[tokio::test]
    async fn test_connectivity_failure_flips_offline_and_queues() {
        let mut d = dispatcher();
        d.remote().set_available(false);
        d.dispatch(Intent::Create(draft("Ada"))).await;

        assert!(d.state().offline_mode);
        let contact = &d.state().contacts[0];
        assert!(!contact.synced);
        assert_eq!(d.state().pending_changes.len(), 1);
        assert_eq!(d.state().pending_changes[0].kind, ChangeKind::Create);
        assert!(d.state().notice.as_deref().unwrap().contains("offline"));
        assert!(d.remote().records().is_empty());
    }

    #[tokio::test]
    async fn test_offline_create_queues_without_touching_network() {
        let mut d = dispatcher();
        d.remote().set_available(false);
        d.commit(Transition::SetOfflineMode(true)).await;

        d.dispatch(Intent::Create(draft("Ada"))).await;

        let contact = &d.state().contacts[0];
        assert!(!contact.synced);
        assert_eq!(d.state().pending_change(&contact.id).unwrap().kind, ChangeKind::Create);
        assert_eq!(
            d.state().pending_change(&contact.id).unwrap().data.as_ref().unwrap().name,
            "Ada"
        );
        assert!(d.remote().records().is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_does_not_flip_offline() {
        let mut d = dispatcher();
        d.dispatch(Intent::Create(draft("Ada"))).await;
        let id = d.state().contacts[0].id.clone();

        d.remote().reject_id(&id);
        let mut edited = d.state().contacts[0].clone();
        edited.role = "Engineer".to_string();
        d.dispatch(Intent::Update(edited)).await;

        assert!(!d.state().offline_mode);
        assert!(d.state().pending_changes.is_empty());
        assert!(d.state().notice.as_deref().unwrap().contains("rejected"));
    }

    #[tokio::test]
    async fn test_dunbar_cap_rejects_create() {
        let mut d = Dispatcher::new(MemoryRemote::new(), MemorySnapshot::new(), {
            let mut c = KeeptouchConfig::default();
            c.contacts.max_contacts = 2;
            c
        });
        d.dispatch(Intent::Create(draft("One"))).await;
        d.dispatch(Intent::Create(draft("Two"))).await;
        d.dispatch(Intent::Create(draft("Three"))).await;

        assert_eq!(d.state().contacts.len(), 2);
        assert!(d.state().notice.as_deref().unwrap().contains("limit"));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let mut d = dispatcher();
        d.dispatch(Intent::Create(draft("  "))).await;
        assert!(d.state().contacts.is_empty());
        assert!(d.state().notice.is_some());
    }

    #[tokio::test]
    async fn test_log_communication_sets_last_contacted() {
        let mut d = dispatcher();
        d.dispatch(Intent::Create(draft("Ada"))).await;
        let id = d.state().contacts[0].id.clone();

        let date = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        d.dispatch(Intent::LogCommunication {
            contact_id: id.clone(),
            types: vec![CommunicationType::Call, CommunicationType::Email],
            notes: "Quarterly catch-up".to_string(),
            date: Some(date),
        })
        .await;

        let contact = d.state().contact(&id).unwrap();
        // The online path refetches the authoritative record, which carries
        // the store's own communication entry.
        assert_eq!(contact.communications.len(), 1);
        assert!(contact.synced);
    }

    #[tokio::test]
    async fn test_online_backdated_communication_keeps_its_date() {
        let mut d = dispatcher();
        d.dispatch(Intent::Create(draft("Ada"))).await;
        let id = d.state().contacts[0].id.clone();

        let date = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        d.dispatch(Intent::LogCommunication {
            contact_id: id.clone(),
            types: vec![CommunicationType::Call],
            notes: String::new(),
            date: Some(date),
        })
        .await;

        // The backdated date survives the remote write and the
        // authoritative refetch.
        let contact = d.state().contact(&id).unwrap();
        assert!(contact.synced);
        assert_eq!(contact.communications[0].date, date);
        assert_eq!(contact.last_contacted_at, Some(date));
    }

    #[tokio::test]
    async fn test_offline_log_communication_prepends_and_queues_update() {
        let mut d = dispatcher();
        d.dispatch(Intent::Create(draft("Ada"))).await;
        let id = d.state().contacts[0].id.clone();
        d.remote().set_available(false);
        d.commit(Transition::SetOfflineMode(true)).await;

        let date = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        d.dispatch(Intent::LogCommunication {
            contact_id: id.clone(),
            types: vec![CommunicationType::Video],
            notes: String::new(),
            date: Some(date),
        })
        .await;

        let contact = d.state().contact(&id).unwrap();
        assert_eq!(contact.last_contacted_at, Some(date));
        assert_eq!(contact.communications[0].date, date);
        assert!(!contact.synced);

        let pending = d.state().pending_change(&id).unwrap();
        assert_eq!(pending.kind, ChangeKind::Update);
        assert_eq!(
            pending.data.as_ref().unwrap().last_contacted_at,
            Some(date)
        );
    }

    #[tokio::test]
    async fn test_future_dated_communication_rejected() {
        let mut d = dispatcher();
        d.dispatch(Intent::Create(draft("Ada"))).await;
        let id = d.state().contacts[0].id.clone();

        d.dispatch(Intent::LogCommunication {
            contact_id: id.clone(),
            types: vec![CommunicationType::Call],
            notes: String::new(),
            date: Some(Utc::now() + chrono::Duration::days(2)),
        })
        .await;

        assert!(d.state().contact(&id).unwrap().communications.is_empty());
        assert!(d.state().notice.as_deref().unwrap().contains("future"));
    }

    #[tokio::test]
    async fn test_offline_delete_tombstones_and_queues() {
        let mut d = dispatcher();
        d.dispatch(Intent::Create(draft("Ada"))).await;
        let id = d.state().contacts[0].id.clone();
        d.remote().set_available(false);
        d.commit(Transition::SetOfflineMode(true)).await;

        d.dispatch(Intent::Delete(id.clone())).await;

        let tombstone = d.state().contact(&id).unwrap();
        assert!(tombstone.deleted);
        assert!(!tombstone.synced);
        assert_eq!(d.state().pending_change(&id).unwrap().kind, ChangeKind::Delete);
    }

    #[tokio::test]
    async fn test_online_delete_connectivity_failure_restores_tombstone() {
        let mut d = dispatcher();
        d.dispatch(Intent::Create(draft("Ada"))).await;
        let id = d.state().contacts[0].id.clone();

        // The store drops offline between the create and the delete.
        d.remote().set_available(false);
        d.dispatch(Intent::Delete(id.clone())).await;

        assert!(d.state().offline_mode);
        let tombstone = d.state().contact(&id).unwrap();
        assert!(tombstone.deleted);
        assert_eq!(d.state().pending_change(&id).unwrap().kind, ChangeKind::Delete);
    }

    #[tokio::test]
    async fn test_failed_online_delete_restores_tombstone_in_place() {
        let mut d = dispatcher();
        for name in ["First", "Second", "Third"] {
            d.dispatch(Intent::Create(draft(name))).await;
        }
        let id = d.state().contacts[1].id.clone();

        d.remote().set_available(false);
        d.dispatch(Intent::Delete(id.clone())).await;

        // Mirror order is insertion order; the tombstone keeps its slot.
        assert_eq!(d.state().contacts[1].id, id);
        assert!(d.state().contacts[1].deleted);
        assert_eq!(d.state().contacts[0].name, "First");
        assert_eq!(d.state().contacts[2].name, "Third");
    }

    #[tokio::test]
    async fn test_recheck_connectivity_never_flips_online() {
        let mut d = dispatcher();
        d.commit(Transition::SetOfflineMode(true)).await;

        d.recheck_connectivity().await;

        assert!(d.state().offline_mode);
        assert!(d.state().notice.as_deref().unwrap().contains("sync"));
    }

    #[tokio::test]
    async fn test_load_restores_snapshot_and_clears_transient_flags() {
        let snapshot = MemorySnapshot::new();
        {
            let mut d = Dispatcher::new(
                MemoryRemote::new(),
                snapshot.clone(),
                KeeptouchConfig::default(),
            );
            d.dispatch(Intent::Create(draft("Ada"))).await;
            d.commit(Transition::SetSyncing(true)).await;
        }

        let mut d = Dispatcher::new(MemoryRemote::new(), snapshot, KeeptouchConfig::default());
        d.load().await;

        assert_eq!(d.state().contacts.len(), 1);
        assert!(!d.state().syncing);
        assert!(!d.state().loading);
    }

    #[tokio::test]
    async fn test_load_corrupt_snapshot_degrades_to_empty() {
        let snapshot = MemorySnapshot::with_raw("{definitely not json");
        let mut d = Dispatcher::new(MemoryRemote::new(), snapshot, KeeptouchConfig::default());
        d.load().await;

        assert!(d.state().contacts.is_empty());
        assert!(d.state().notice.as_deref().unwrap().contains("load"));
    }

    #[tokio::test]
    async fn test_load_enters_offline_mode_when_unreachable() {
        let remote = MemoryRemote::new();
        remote.set_available(false);
        let mut d = Dispatcher::new(remote, MemorySnapshot::new(), KeeptouchConfig::default());
        d.load().await;

        assert!(d.state().offline_mode);
        assert!(d.state().notice.as_deref().unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_write_through_snapshot_after_every_transition() {
        let snapshot = MemorySnapshot::new();
        let mut d = Dispatcher::new(
            MemoryRemote::new(),
            snapshot.clone(),
            KeeptouchConfig::default(),
        );
        d.dispatch(Intent::Create(draft("Ada"))).await;

        let persisted = snapshot.load().await.unwrap().unwrap();
        assert_eq!(persisted.contacts.len(), 1);
        assert_eq!(persisted, *d.state());
    }

    #[tokio::test]
    async fn test_listeners_observe_transitions() {
        let mut d = dispatcher();
        let seen = Rc::new(Cell::new(0usize));
        let seen_by_listener = Rc::clone(&seen);
        d.subscribe(move |state| {
            seen_by_listener.set(state.contacts.len());
        });

        d.dispatch(Intent::Create(draft("Ada"))).await;
        assert_eq!(seen.get(), 1);
    }

    #[tokio::test]
    async fn test_select_ignores_unknown_id() {
        let mut d = dispatcher();
        d.dispatch(Intent::Create(draft("Ada"))).await;
        let id = d.state().contacts[0].id.clone();

        d.dispatch(Intent::Select(Some(id.clone()))).await;
        assert_eq!(d.state().selected_contact().unwrap().id, id);

        d.dispatch(Intent::Select(Some("nope".to_string()))).await;
        assert!(d.state().selected_contact().is_none());
    }
}
