//! # Sync engine — replaying offline work against the record store
//!
//! [`Dispatcher::sync`] drains every unsynced contact (queued creates and
//! updates, plus tombstoned deletes) against the remote store. It is invoked
//! explicitly — typically from a user action once connectivity returns —
//! and is the only operation that can clear offline mode.
//!
//! Failure semantics are itemized, not batch-atomic: items are processed
//! sequentially, each failure is recorded and the batch continues, so sync
//! makes maximal forward progress. A partially failed run leaves the failed
//! items unsynced with their pending changes intact, ready for the next
//! attempt, and keeps the dispatcher offline.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::mirror::Transition;
use crate::models::Contact;
use crate::remote::RemoteStore;
use crate::snapshot::SnapshotStore;

/// Per-run outcome counts, also surfaced as a state notice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Items left queued because the store was unreachable.
    pub skipped: usize,
    /// One message per failed item.
    pub errors: Vec<String>,
}

impl SyncReport {
    /// Every selected item succeeded. A skipped item was selected but never
    /// replayed, so it counts against full success too.
    pub fn is_full_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && self.succeeded > 0
    }
}

impl<R: RemoteStore, S: SnapshotStore> Dispatcher<R, S> {
    /// Drain the pending work against the record store.
    ///
    /// 1. Re-probe connectivity; an unreachable store aborts with an error
    ///    notice unless the dispatcher is already offline (offline runs can
    ///    still resolve pure-local forgets).
    /// 2. Process each unsynced contact sequentially: tombstones become
    ///    remote deletes (with retries), everything else a create or update
    ///    depending on whether a queued create exists for the id. On an
    ///    unreachable run, items needing the network stay queued and count
    ///    as skipped.
    /// 3. Only when every selected item succeeded: leave offline mode,
    ///    clear the queue, and refetch the authoritative list; a refetch
    ///    failure degrades to a warning.
    ///
    /// `syncing` is cleared on every path out of this function.
    pub async fn sync(&mut self) -> SyncReport {
        let available = self.remote().check_availability().await;
        if !available && !self.state().offline_mode {
            self.commit(Transition::SetNotice(Some(
                "Cannot sync: server is unavailable.".to_string(),
            )))
            .await;
            return SyncReport::default();
        }

        self.commit(Transition::SetSyncing(true)).await;
        let report = self.sync_items(available).await;
        self.finish_sync(available, &report).await;
        self.commit(Transition::SetSyncing(false)).await;
        report
    }

    async fn sync_items(&mut self, available: bool) -> SyncReport {
        let unsynced = self.state().unsynced_contacts();
        debug!(count = unsynced.len(), "starting sync");

        let mut report = SyncReport::default();
        for contact in unsynced {
            if contact.deleted {
                self.sync_delete(&contact, available, &mut report).await;
                continue;
            }
            // Creates and updates need the store; leave them queued on an
            // unreachable run. They still count against full success.
            if !available {
                debug!(id = %contact.id, "skipping unsynced contact, store unreachable");
                report.skipped += 1;
                continue;
            }
            self.sync_upsert(&contact, &mut report).await;
        }
        report
    }

    /// Resolve a tombstone: forget never-synced records locally, otherwise
    /// issue the remote delete with linear-backoff retries.
    async fn sync_delete(
        &mut self,
        contact: &Contact,
        available: bool,
        report: &mut SyncReport,
    ) {
        // A tombstone still carrying a queued create only ever existed
        // locally; dropping it settles the delete without any network call.
        if self.state().has_pending_create(&contact.id) {
            debug!(id = %contact.id, "forgetting never-synced tombstone");
            self.commit(Transition::ForgetContact(contact.id.clone())).await;
            self.commit(Transition::RemovePendingChange(contact.id.clone())).await;
            report.succeeded += 1;
            return;
        }
        if !available {
            debug!(id = %contact.id, "skipping remote delete, store unreachable");
            report.skipped += 1;
            return;
        }

        let attempts = self.config().sync.delete_retry_attempts.max(1);
        let backoff = Duration::from_millis(self.config().sync.retry_backoff_ms);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match self.remote().delete_contact(&contact.id).await {
                Ok(_) => {
                    self.commit(Transition::ForgetContact(contact.id.clone())).await;
                    self.commit(Transition::RemovePendingChange(contact.id.clone())).await;
                    report.succeeded += 1;
                    return;
                }
                Err(e) => {
                    warn!(id = %contact.id, attempt, "remote delete failed: {e}");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
        report.failed += 1;
        if let Some(e) = last_error {
            report.errors.push(format!("delete {}: {e}", contact.id));
        }
    }

    /// Replay a create or update, single-shot: a failure here is recorded
    /// and the batch moves on.
    async fn sync_upsert(&mut self, contact: &Contact, report: &mut SyncReport) {
        let is_new = self.state().has_pending_create(&contact.id);
        let result = if is_new {
            self.remote().create_contact(contact).await
        } else {
            self.remote().update_contact(&contact.id, contact).await
        };

        match result {
            Ok(mut server) => {
                server.synced = true;
                self.commit(Transition::ReplaceContact {
                    local_id: contact.id.clone(),
                    contact: server,
                })
                .await;
                self.commit(Transition::RemovePendingChange(contact.id.clone())).await;
                report.succeeded += 1;
            }
            Err(e) => {
                warn!(id = %contact.id, is_new, "sync failed: {e}");
                report.failed += 1;
                report.errors.push(format!("{}: {e}", contact.id));
            }
        }
    }

    async fn finish_sync(&mut self, available: bool, report: &SyncReport) {
        if report.is_full_success() {
            info!(succeeded = report.succeeded, "sync complete");
            self.commit(Transition::SetOfflineMode(false)).await;
            self.commit(Transition::ClearPendingChanges).await;

            // Reconcile with server truth. A refetch failure is a warning,
            // never a rollback of the sync that just succeeded.
            if available {
                match self.remote().list_contacts().await {
                    Ok(mut contacts) => {
                        for contact in &mut contacts {
                            contact.synced = true;
                            contact.deleted = false;
                        }
                        self.commit(Transition::SetContacts(contacts)).await;
                    }
                    Err(e) => {
                        warn!("post-sync refetch failed: {e}");
                        self.commit(Transition::SetNotice(Some(
                            "Sync succeeded but refreshing contacts failed.".to_string(),
                        )))
                        .await;
                        return;
                    }
                }
            }
            self.commit(Transition::SetNotice(Some(format!(
                "Sync successful: processed {} contacts.",
                report.succeeded
            ))))
            .await;
        } else if report.succeeded > 0 {
            info!(
                succeeded = report.succeeded,
                failed = report.failed,
                skipped = report.skipped,
                "partial sync"
            );
            self.commit(Transition::SetNotice(Some(format!(
                "Partial sync: {} succeeded, {} still pending.",
                report.succeeded,
                report.failed + report.skipped
            ))))
            .await;
        } else if report.failed > 0 {
            self.commit(Transition::SetNotice(Some(
                "Sync failed: no contacts were processed.".to_string(),
            )))
            .await;
        }
    }
}
