//! Small shared identifier types used across the face and registrar layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonically increasing identifier handed out for pending Interests,
/// registered filters, and registered prefixes. Distinct calls always
/// produce distinct ids, even across different tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out strictly increasing `EntryId`s for a single Face.
#[derive(Debug, Default)]
pub struct EntryIdAllocator {
    next: AtomicU64,
}

impl EntryIdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next(&self) -> EntryId {
        EntryId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_produces_distinct_increasing_ids() {
        let alloc = EntryIdAllocator::new();
        let a = alloc.next();
        let b = alloc.next();
        let c = alloc.next();
        assert!(a.0 < b.0 && b.0 < c.0);
    }
}
