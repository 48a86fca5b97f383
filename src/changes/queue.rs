//! Changes Queue

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    changes::{ChangeEntry, ChangeId, NewChange},
    notify::{SubscriptionId, Subscribers},
    storage::{CHANGES_STORAGE_KEY, Storage, StorageError},
};

/// Errors raised by queue mutations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue could not be read or written.
    #[error("pending changes storage failed")]
    Storage(#[from] StorageError),

    /// The queue could not be encoded or decoded.
    #[error("pending changes are not valid JSON")]
    Serialize(#[from] serde_json::Error),
}

/// Persisted, newest-first list of pending changes.
#[derive(Debug)]
pub struct ChangesQueue<S: Storage> {
    storage: S,
    entries: Vec<ChangeEntry>,
    open: bool,
    subscribers: Subscribers<[ChangeEntry]>,
}

impl<S: Storage> ChangesQueue<S> {
    /// Load the queue persisted in `storage`.
    ///
    /// Missing or unreadable data yields an empty queue.
    pub fn load(storage: S) -> Self {
        let entries = read_entries(&storage).unwrap_or_else(|error| {
            warn!(%error, "pending changes unreadable, starting empty");
            Vec::new()
        });

        Self {
            storage,
            entries,
            open: false,
            subscribers: Subscribers::new(),
        }
    }

    /// Re-read the persisted queue.
    ///
    /// On failure the in-memory entries are kept, so the next mutation does
    /// not overwrite changes that are still on disk.
    pub fn reload(&mut self) {
        match read_entries(&self.storage) {
            Ok(entries) => {
                if entries != self.entries {
                    self.entries = entries;
                    self.subscribers.notify(&self.entries);
                }
            }
            Err(error) => {
                warn!(%error, "could not re-read pending changes, keeping current queue");
            }
        }
    }

    /// Stamp `change` and put it at the front of the queue. Opens the queue
    /// panel so the admin sees what was just queued.
    ///
    /// # Errors
    ///
    /// Returns a [`QueueError`] if the queue cannot be persisted.
    pub fn add_change(&mut self, change: NewChange) -> Result<ChangeEntry, QueueError> {
        let entry = ChangeEntry::stamp(change);

        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        entries.push(entry.clone());
        entries.extend(self.entries.iter().cloned());

        self.commit(entries)?;
        self.open = true;

        debug!(id = %entry.id, kind = %entry.kind, resource = %entry.resource, "change queued");

        Ok(entry)
    }

    /// Drop the change with `id`. Returns `false` if there was none.
    ///
    /// # Errors
    ///
    /// Returns a [`QueueError`] if the queue cannot be persisted.
    pub fn remove_change(&mut self, id: &ChangeId) -> Result<bool, QueueError> {
        if !self.entries.iter().any(|entry| entry.id == *id) {
            return Ok(false);
        }

        let entries = self
            .entries
            .iter()
            .filter(|entry| entry.id != *id)
            .cloned()
            .collect();

        self.commit(entries)?;

        Ok(true)
    }

    /// Drop every change.
    ///
    /// # Errors
    ///
    /// Returns a [`QueueError`] if the queue cannot be persisted.
    pub fn clear(&mut self) -> Result<(), QueueError> {
        self.commit(Vec::new())
    }

    fn commit(&mut self, entries: Vec<ChangeEntry>) -> Result<(), QueueError> {
        let raw = serde_json::to_string(&entries)?;

        self.storage.set(CHANGES_STORAGE_KEY, &raw)?;

        self.entries = entries;
        self.subscribers.notify(&self.entries);

        Ok(())
    }

    /// Show the queue panel.
    pub fn open(&mut self) {
        self.open = true;
    }

    /// Hide the queue panel.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Whether the queue panel is shown.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Pending changes, newest first.
    pub fn entries(&self) -> &[ChangeEntry] {
        &self.entries
    }

    /// Number of pending changes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Be told about every change to the queue.
    pub fn subscribe(
        &mut self,
        callback: impl Fn(&[ChangeEntry]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    /// Stop being told about changes.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

/// Read the persisted queue. Entries that do not parse are skipped; a value
/// that is not an array at all is an error.
fn read_entries<S: Storage>(storage: &S) -> Result<Vec<ChangeEntry>, QueueError> {
    let Some(raw) = storage.get(CHANGES_STORAGE_KEY)? else {
        return Ok(Vec::new());
    };

    let values: Vec<serde_json::Value> = serde_json::from_str(&raw)?;

    let entries = values
        .into_iter()
        .filter_map(|value| {
            serde_json::from_value(value)
                .inspect_err(|error| warn!(%error, "skipping unreadable pending change"))
                .ok()
        })
        .collect();

    Ok(entries)
}
