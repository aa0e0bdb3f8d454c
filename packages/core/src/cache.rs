use std::sync::Arc;

use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::rules::{Detector, Snapshot};

/// Shared, wholesale-replaced set of compiled detectors.
///
/// Readers get a cheap clone of the current [`Snapshot`]; a snapshot is never
/// changed after it is built, so a reader keeps a consistent view even while a
/// refresh swaps in a new one. Writers take the lock through [`Self::write`]
/// and may hold it across a whole refresh cycle, which keeps readers waiting
/// until the cycle is done.
pub struct DetectorCache {
    snapshot: RwLock<Snapshot>,
}

impl DetectorCache {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::from(Vec::<Detector>::new())),
        }
    }

    /// Current snapshot; empty until the first successful population.
    pub async fn read(&self) -> Snapshot {
        Arc::clone(&*self.snapshot.read().await)
    }

    /// Take exclusive access for a refresh cycle.
    pub async fn write(&self) -> SnapshotWriter<'_> {
        SnapshotWriter {
            guard: self.snapshot.write().await,
        }
    }
}

impl Default for DetectorCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive handle on the snapshot. Readers wait until it is dropped.
pub struct SnapshotWriter<'a> {
    guard: RwLockWriteGuard<'a, Snapshot>,
}

impl SnapshotWriter<'_> {
    pub fn replace(&mut self, detectors: Vec<Detector>) {
        *self.guard = Arc::from(detectors);
    }
}
