use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

/// Commit count for one author, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorStats {
    pub email: String,
    pub name: String,
    pub commits: u64,
}

#[derive(Debug, Clone)]
struct AuthorEntry {
    name: String,
    commits: u64,
    /// Insertion order, used to break ties between equal counts.
    first_seen: usize,
}

/// Per-author commit counts, shared by every branch task of a crawl.
///
/// Authors are identified by their exact email address. The stored display name is the one from
/// the most recently recorded commit.
#[derive(Debug, Default)]
pub struct Tally {
    authors: Mutex<HashMap<String, AuthorEntry>>,
}

impl Tally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one commit for `email`, remembering `name` as the author's display name.
    pub fn record_commit(&self, email: &str, name: &str) {
        let mut authors = self.authors.lock().expect("lock not poisoned");
        if let Some(entry) = authors.get_mut(email) {
            entry.commits += 1;
            name.clone_into(&mut entry.name);
        } else {
            let first_seen = authors.len();
            let _ = authors.insert(
                email.to_owned(),
                AuthorEntry {
                    name: name.to_owned(),
                    commits: 1,
                    first_seen,
                },
            );
        }
    }

    /// The `n` authors with the most commits, most prolific first.
    ///
    /// Authors with equal counts are ordered by when they were first recorded.
    #[must_use]
    pub fn top(&self, n: usize) -> Vec<AuthorStats> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    /// Every author, most prolific first.
    #[must_use]
    pub fn ranked(&self) -> Vec<AuthorStats> {
        let authors = self.authors.lock().expect("lock not poisoned");
        let mut entries: Vec<_> = authors.iter().collect();
        entries.sort_by(|(_, a), (_, b)| b.commits.cmp(&a.commits).then(a.first_seen.cmp(&b.first_seen)));
        entries.into_iter().map(|(email, entry)| to_stats(email, entry)).collect()
    }

    /// Every author, in the order they were first recorded.
    #[must_use]
    pub fn authors(&self) -> Vec<AuthorStats> {
        let authors = self.authors.lock().expect("lock not poisoned");
        let mut entries: Vec<_> = authors.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.first_seen);
        entries.into_iter().map(|(email, entry)| to_stats(email, entry)).collect()
    }

    /// Look up a single author.
    #[must_use]
    pub fn get(&self, email: &str) -> Option<AuthorStats> {
        let authors = self.authors.lock().expect("lock not poisoned");
        authors.get(email).map(|entry| to_stats(email, entry))
    }

    #[must_use]
    pub fn author_count(&self) -> usize {
        self.authors.lock().expect("lock not poisoned").len()
    }

    #[must_use]
    pub fn total_commits(&self) -> u64 {
        self.authors.lock().expect("lock not poisoned").values().map(|entry| entry.commits).sum()
    }

    /// A detached copy of the current counts.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let authors = self.authors.lock().expect("lock not poisoned").clone();
        Self {
            authors: Mutex::new(authors),
        }
    }
}

fn to_stats(email: &str, entry: &AuthorEntry) -> AuthorStats {
    AuthorStats {
        email: email.to_owned(),
        name: entry.name.clone(),
        commits: entry.commits,
    }
}
