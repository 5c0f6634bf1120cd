pub mod config;
pub mod dispatcher;
pub mod mirror;
pub mod models;
pub mod reminders;
pub mod remote;
pub mod snapshot;
pub mod sync;

mod memory;
pub use memory::MemoryRemote;

pub use config::KeeptouchConfig;
pub use dispatcher::{ContactDraft, Dispatcher, Intent};
pub use mirror::{MirrorState, Transition};
pub use models::{
    Address, Birthday, ChangeKind, Communication, CommunicationType, Contact,
    ContactCategory, ContactStatus, MaritalStatus, Parsed, PendingChange,
};
pub use reminders::{due_reminders, statistics, ContactStatistics, Reminder, ReminderReason};
pub use remote::{RemoteError, RemoteStore};
pub use snapshot::{FileSnapshot, MemorySnapshot, SnapshotError, SnapshotStore};
pub use sync::SyncReport;
