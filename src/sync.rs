//! Per-team mutual exclusion for load-mutate-save critical sections.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed async mutexes, one per team directory. Every task-list or mailbox
/// mutation holds the team's lock across its whole read-modify-write so
/// concurrent claims cannot clobber each other within the process.
#[derive(Default)]
pub struct TeamLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TeamLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, team_name: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(team_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}
