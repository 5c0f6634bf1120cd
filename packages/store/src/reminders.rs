//! Keep-in-touch reminders and contact statistics.
//!
//! Pure scans over the mirror: no I/O, no clock reads — callers pass
//! `today` so the checks are deterministic and testable. The staleness
//! threshold comes from `[contacts] stale_after_days` in the config.

use chrono::{DateTime, Utc};

use crate::mirror::MirrorState;
use crate::models::{Contact, ContactCategory, ContactStatus};

/// Why a contact needs attention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReminderReason {
    NeverContacted,
    /// Days since the last communication.
    Stale(i64),
}

/// One contact due for a touch.
#[derive(Clone, Debug, PartialEq)]
pub struct Reminder {
    pub contact_id: String,
    pub name: String,
    pub reason: ReminderReason,
}

impl Reminder {
    pub fn message(&self) -> String {
        match &self.reason {
            ReminderReason::NeverContacted => {
                format!("{} has never been contacted.", self.name)
            }
            ReminderReason::Stale(days) => {
                format!("{} hasn't been contacted in {days} days.", self.name)
            }
        }
    }
}

/// The date of the most recent valid communication, preferring the
/// explicit `last_contacted_at` marker.
fn last_contact_date(contact: &Contact) -> Option<DateTime<Utc>> {
    contact.last_contacted_at.or_else(|| {
        contact
            .communications
            .iter()
            .filter(|c| !c.types.is_empty())
            .map(|c| c.date)
            .max()
    })
}

/// Scan the mirror for contacts that have gone un-touched for at least
/// `stale_after_days`, or were never contacted at all. Tombstones are
/// skipped. Mirror order is preserved.
pub fn due_reminders(
    state: &MirrorState,
    today: DateTime<Utc>,
    stale_after_days: i64,
) -> Vec<Reminder> {
    state
        .contacts
        .iter()
        .filter(|c| !c.deleted)
        .filter_map(|contact| {
            let reason = match last_contact_date(contact) {
                None => Some(ReminderReason::NeverContacted),
                Some(last) => {
                    let days = (today - last).num_days();
                    (days >= stale_after_days).then_some(ReminderReason::Stale(days))
                }
            }?;
            Some(Reminder {
                contact_id: contact.id.clone(),
                name: contact.name.clone(),
                reason,
            })
        })
        .collect()
}

/// Aggregate counts for the statistics view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactStatistics {
    pub total: usize,
    pub by_status: Vec<(ContactStatus, usize)>,
    pub by_category: Vec<(ContactCategory, usize)>,
    pub never_contacted: usize,
}

/// Compute statistics over live (non-tombstoned) contacts.
pub fn statistics(state: &MirrorState) -> ContactStatistics {
    let live: Vec<&Contact> = state.contacts.iter().filter(|c| !c.deleted).collect();

    let mut by_status: Vec<(ContactStatus, usize)> = Vec::new();
    let mut by_category: Vec<(ContactCategory, usize)> = Vec::new();
    for contact in &live {
        match by_status.iter_mut().find(|(s, _)| *s == contact.status) {
            Some((_, n)) => *n += 1,
            None => by_status.push((contact.status, 1)),
        }
        match by_category.iter_mut().find(|(c, _)| *c == contact.category) {
            Some((_, n)) => *n += 1,
            None => by_category.push((contact.category, 1)),
        }
    }

    ContactStatistics {
        total: live.len(),
        by_status,
        by_category,
        never_contacted: live
            .iter()
            .filter(|c| last_contact_date(c).is_none())
            .count(),
    }
}
