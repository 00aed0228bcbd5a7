use core::fmt::{Display, Formatter};
use std::sync::Arc;

/// Commit messages starting with this prefix are merges of reviewed changes and are not counted.
pub const MERGE_PULL_REQUEST_PREFIX: &str = "Merge pull request #";

/// The kinds of queries issued against the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryKind {
    Repositories,
    Branches,
    Commits,
    DefaultBranch,
}

impl QueryKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Repositories => "repositories",
            Self::Branches => "branches",
            Self::Commits => "commits",
            Self::DefaultBranch => "default branch",
        }
    }

    /// All query kinds in a consistent order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Repositories, Self::Branches, Self::Commits, Self::DefaultBranch]
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl Display for QueryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub nodes: Vec<T>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    /// A page that is followed by another one starting after `end_cursor`.
    #[must_use]
    pub fn more(nodes: Vec<T>, end_cursor: impl Into<String>) -> Self {
        Self {
            nodes,
            end_cursor: Some(end_cursor.into()),
            has_next_page: true,
        }
    }

    /// The final page of a listing.
    #[must_use]
    pub const fn last(nodes: Vec<T>) -> Self {
        Self {
            nodes,
            end_cursor: None,
            has_next_page: false,
        }
    }

    /// The cursor to request the following page with, if there is one.
    ///
    /// A page claiming more data but carrying no cursor is treated as the last one, since
    /// requesting again without a cursor would restart the listing.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        if self.has_next_page { self.end_cursor.as_deref() } else { None }
    }

    /// Whether the remote announced more data without a cursor to fetch it with.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.has_next_page && self.end_cursor.is_none()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            nodes: self.nodes.into_iter().map(f).collect(),
            end_cursor: self.end_cursor,
            has_next_page: self.has_next_page,
        }
    }
}

/// A commit as returned by the remote's history listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitNode {
    pub oid: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
}

impl CommitNode {
    #[must_use]
    pub fn new(oid: impl Into<String>, message: impl Into<String>, author_name: impl Into<String>, author_email: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            message: message.into(),
            author_name: author_name.into(),
            author_email: author_email.into(),
        }
    }
}

/// A commit observed on a specific branch of a specific repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub oid: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub repository: Arc<str>,
    pub branch: Arc<str>,
}

impl CommitRecord {
    #[must_use]
    pub fn observed(node: CommitNode, repository: &Arc<str>, branch: &Arc<str>) -> Self {
        Self {
            oid: node.oid,
            message: node.message,
            author_name: node.author_name,
            author_email: node.author_email,
            repository: Arc::clone(repository),
            branch: Arc::clone(branch),
        }
    }

    /// Whether this commit merges a pull request.
    #[must_use]
    pub fn is_merge_pull_request(&self) -> bool {
        self.message.starts_with(MERGE_PULL_REQUEST_PREFIX)
    }
}

/// Qualified ref name for a branch, as expected by the commit history query.
#[must_use]
pub fn branch_ref(branch: &str) -> String {
    format!("refs/heads/{branch}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(message: &str) -> CommitRecord {
        CommitRecord::observed(
            CommitNode::new("abc", message, "Ada", "ada@example.com"),
            &Arc::from("repo"),
            &Arc::from("main"),
        )
    }

    #[test]
    fn test_next_cursor_only_when_more_pages() {
        let page = Page::more(vec![1, 2], "c1");
        assert_eq!(page.next_cursor(), Some("c1"));

        let page: Page<u32> = Page::last(vec![]);
        assert_eq!(page.next_cursor(), None);
    }

    #[test]
    fn test_next_cursor_ignores_stale_cursor_on_last_page() {
        let page = Page {
            nodes: vec![1],
            end_cursor: Some("c9".to_string()),
            has_next_page: false,
        };
        assert_eq!(page.next_cursor(), None);
    }

    #[test]
    fn test_next_cursor_missing_cursor_ends_listing() {
        let page = Page {
            nodes: vec![1],
            end_cursor: None,
            has_next_page: true,
        };
        assert_eq!(page.next_cursor(), None);
        assert!(page.is_truncated());
        assert!(!Page::more(vec![1], "c1").is_truncated());
        assert!(!Page::last(vec![1]).is_truncated());
    }

    #[test]
    fn test_map_keeps_pagination() {
        let page = Page::more(vec![1, 2], "c1").map(|n| n * 10);
        assert_eq!(page.nodes, vec![10, 20]);
        assert_eq!(page.next_cursor(), Some("c1"));
    }

    #[test]
    fn test_merge_pull_request_detection() {
        assert!(record("Merge pull request #42 from ada/feature").is_merge_pull_request());
        assert!(!record("Merge branch 'main' into feature").is_merge_pull_request());
        assert!(!record("fix: Merge pull request # handling").is_merge_pull_request());
        assert!(!record("merge pull request #1").is_merge_pull_request());
    }

    #[test]
    fn test_observed_carries_location() {
        let commit = record("msg");
        assert_eq!(&*commit.repository, "repo");
        assert_eq!(&*commit.branch, "main");
        assert_eq!(commit.author_email, "ada@example.com");
    }

    #[test]
    fn test_branch_ref() {
        assert_eq!(branch_ref("feature/x"), "refs/heads/feature/x");
    }

    #[test]
    fn test_query_kind_names() {
        assert_eq!(QueryKind::Repositories.to_string(), "repositories");
        assert_eq!(QueryKind::DefaultBranch.name(), "default branch");
        assert_eq!(QueryKind::all().len(), 4);
        assert_eq!(QueryKind::Commits.index(), 2);
    }
}
