use dashmap::DashSet;
use std::sync::LazyLock;

use crate::storage::ItemId;

// ────────────────────────────────────────────────────────────────
// ProcessingGuard - Prevents concurrent runs for the same item
// ────────────────────────────────────────────────────────────────

static IN_PROGRESS: LazyLock<DashSet<ItemId>> = LazyLock::new(DashSet::new);

pub struct ProcessingGuard(ItemId);

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        IN_PROGRESS.remove(&self.0);
    }
}

pub fn try_acquire(id: &ItemId) -> Option<ProcessingGuard> {
    if IN_PROGRESS.insert(id.clone()) {
        Some(ProcessingGuard(id.clone()))
    } else {
        None
    }
}
