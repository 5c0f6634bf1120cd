//! # Durable snapshot slot — mirror state across restarts
//!
//! [`SnapshotStore`] persists the serialized [`MirrorState`] to a single
//! named slot. The dispatcher writes through after every accepted transition
//! and reads the slot exactly once at startup.
//!
//! A corrupt slot must never take the app down: `load` reports it as
//! [`SnapshotError::Corrupt`] and the dispatcher degrades to an empty mirror
//! plus a user-visible warning. A missing slot is simply `Ok(None)`.
//!
//! ## Implementations
//!
//! | Store | Medium | Use |
//! |-------|--------|-----|
//! | [`MemorySnapshot`] | in-process string slot | tests |
//! | [`FileSnapshot`] | one JSON file | desktop persistence |

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::mirror::MirrorState;

/// Failure modes of the durable slot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot slot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
}

/// Async trait for loading and saving the mirror snapshot.
pub trait SnapshotStore {
    /// Read the last saved snapshot. `Ok(None)` when no snapshot exists;
    /// `Err(Corrupt)` when one exists but fails to parse.
    fn load(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<MirrorState>, SnapshotError>>;

    /// Serialize and persist the full state, replacing any previous slot.
    fn save(
        &self,
        state: &MirrorState,
    ) -> impl std::future::Future<Output = Result<(), SnapshotError>>;
}

/// In-memory snapshot slot for tests.
#[derive(Clone, Debug, Default)]
pub struct MemorySnapshot {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with raw text, e.g. malformed JSON for corruption tests.
    pub fn with_raw(raw: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.to_string()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().unwrap().clone()
    }
}

impl SnapshotStore for MemorySnapshot {
    async fn load(&self) -> Result<Option<MirrorState>, SnapshotError> {
        match self.slot.lock().unwrap().as_deref() {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, state: &MirrorState) -> Result<(), SnapshotError> {
        let raw = serde_json::to_string(state)?;
        *self.slot.lock().unwrap() = Some(raw);
        Ok(())
    }
}

/// File-backed snapshot slot: one JSON file holding the whole mirror.
#[derive(Clone, Debug)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshot {
    async fn load(&self) -> Result<Option<MirrorState>, SnapshotError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn save(&self, state: &MirrorState) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string(state)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}
