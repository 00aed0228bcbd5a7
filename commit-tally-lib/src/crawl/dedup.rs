use std::collections::HashSet;
use std::sync::Mutex;

/// Commit identifiers already seen in one repository, across all of its branches.
///
/// Each repository gets its own set; it is shared by that repository's branch tasks
/// and dropped once they have all finished.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: Mutex<HashSet<String>>,
}

impl DedupSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `oid`, returning `true` if it had not been seen before.
    ///
    /// The check and the insert happen under one lock, so when several branches race on the
    /// same commit exactly one of them gets `true`.
    pub fn check_and_mark(&self, oid: &str) -> bool {
        let mut seen = self.seen.lock().expect("lock not poisoned");
        if seen.contains(oid) {
            return false;
        }
        seen.insert(oid.to_owned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.lock().expect("lock not poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
