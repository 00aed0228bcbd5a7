//! GraphQL documents and the shapes of their replies.

use crate::crawl::{CommitNode, Page, RemoteError};
use serde::Deserialize;

pub const REPOSITORIES_QUERY: &str = r"
query($org: String!, $first: Int!, $cursor: String) {
  organization(login: $org) {
    repositories(first: $first, after: $cursor) {
      pageInfo { endCursor hasNextPage }
      nodes { name }
    }
  }
}";

pub const BRANCHES_QUERY: &str = r#"
query($owner: String!, $repo: String!, $first: Int!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    refs(refPrefix: "refs/heads/", first: $first, after: $cursor) {
      pageInfo { endCursor hasNextPage }
      nodes { name }
    }
  }
}"#;

pub const COMMITS_QUERY: &str = r"
query($owner: String!, $repo: String!, $branch: String!, $first: Int!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    ref(qualifiedName: $branch) {
      target {
        ... on Commit {
          history(first: $first, after: $cursor) {
            pageInfo { endCursor hasNextPage }
            nodes { oid message author { name email } }
          }
        }
      }
    }
  }
}";

pub const DEFAULT_BRANCH_QUERY: &str = r"
query($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    defaultBranchRef { name }
  }
}";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
struct Connection<T> {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<Option<T>>,
}

impl<T> Connection<T> {
    fn into_page<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            nodes: self.nodes.into_iter().flatten().map(f).collect(),
            end_cursor: self.page_info.end_cursor,
            has_next_page: self.page_info.has_next_page,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct RepositoriesData {
    organization: Option<Organization>,
}

#[derive(Debug, Deserialize)]
struct Organization {
    repositories: Connection<Named>,
}

impl RepositoriesData {
    pub fn into_page(self, org: &str) -> Result<Page<String>, RemoteError> {
        let organization = self
            .organization
            .ok_or_else(|| RemoteError::malformed(format!("organization '{org}' not found")))?;
        Ok(organization.repositories.into_page(|repo| repo.name))
    }
}

#[derive(Debug, Deserialize)]
pub struct BranchesData {
    repository: Option<BranchesRepository>,
}

#[derive(Debug, Deserialize)]
struct BranchesRepository {
    refs: Option<Connection<Named>>,
}

impl BranchesData {
    pub fn into_page(self, owner: &str, repo: &str) -> Result<Page<String>, RemoteError> {
        let refs = self
            .repository
            .ok_or_else(|| missing_repository(owner, repo))?
            .refs
            .ok_or_else(|| RemoteError::malformed(format!("no branch listing for '{owner}/{repo}'")))?;
        Ok(refs.into_page(|branch| branch.name))
    }
}

#[derive(Debug, Deserialize)]
pub struct CommitsData {
    repository: Option<CommitsRepository>,
}

#[derive(Debug, Deserialize)]
struct CommitsRepository {
    #[serde(rename = "ref")]
    git_ref: Option<GitRef>,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    target: Option<CommitTarget>,
}

/// The target of a ref; `history` is only present when the target is a commit.
#[derive(Debug, Deserialize)]
struct CommitTarget {
    history: Option<Connection<Commit>>,
}

#[derive(Debug, Deserialize)]
struct Commit {
    oid: String,
    #[serde(default)]
    message: String,
    author: Option<GitActor>,
}

#[derive(Debug, Deserialize)]
struct GitActor {
    name: Option<String>,
    email: Option<String>,
}

impl CommitsData {
    pub fn into_page(self, owner: &str, repo: &str, branch_ref: &str) -> Result<Page<CommitNode>, RemoteError> {
        let history = self
            .repository
            .ok_or_else(|| missing_repository(owner, repo))?
            .git_ref
            .ok_or_else(|| RemoteError::malformed(format!("ref '{branch_ref}' not found in '{owner}/{repo}'")))?
            .target
            .and_then(|target| target.history)
            .ok_or_else(|| RemoteError::malformed(format!("ref '{branch_ref}' in '{owner}/{repo}' does not point to a commit")))?;

        Ok(history.into_page(|commit| {
            let (name, email) = commit
                .author
                .map(|author| (author.name.unwrap_or_default(), author.email.unwrap_or_default()))
                .unwrap_or_default();
            CommitNode::new(commit.oid, commit.message, name, email)
        }))
    }
}

#[derive(Debug, Deserialize)]
pub struct DefaultBranchData {
    repository: Option<DefaultBranchRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefaultBranchRepository {
    default_branch_ref: Option<Named>,
}

impl DefaultBranchData {
    pub fn into_branch(self, owner: &str, repo: &str) -> Result<Option<String>, RemoteError> {
        let repository = self.repository.ok_or_else(|| missing_repository(owner, repo))?;
        Ok(repository.default_branch_ref.map(|branch| branch.name))
    }
}

fn missing_repository(owner: &str, repo: &str) -> RemoteError {
    RemoteError::malformed(format!("repository '{owner}/{repo}' not found"))
}
