//! Append-only QC audit log. Exactly one entry per submission, ordered by
//! sequence number (and therefore by timestamp). Entries are never deleted
//! here; retention beyond a window is an operator concern.

use parking_lot::RwLock;

use crate::models::QcLogEntry;

pub struct QcLog {
    entries: RwLock<Vec<QcLogEntry>>,
}

impl QcLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append one entry, assigning the next sequence number. The write is
    /// atomic: readers see the entry fully or not at all.
    pub fn append(&self, mut entry: QcLogEntry) -> u64 {
        let mut entries = self.entries.write();
        entry.seq = entries.len() as u64 + 1;

        let seq = entry.seq;
        entries.push(entry);
        seq
    }

    /// Run a read against the entries, ascending by sequence. The lock is
    /// held only for the duration of the closure.
    pub fn with_entries<R>(&self, f: impl FnOnce(&[QcLogEntry]) -> R) -> R {
        f(&self.entries.read())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for QcLog {
    fn default() -> Self {
        Self::new()
    }
}
