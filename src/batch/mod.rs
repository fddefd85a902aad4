//! Apply one operation across many repositories, with optional rollback.
//!
//! Repositories are processed strictly one at a time, in input order. Every
//! success is remembered. With rollback enabled, the first failure undoes all
//! earlier creations (oldest first) and stops the batch; repositories that
//! were never reached are reported as skipped. With rollback disabled every
//! repository is attempted regardless of failures.
//!
//! # Example
//!
//! ```rust,no_run
//! use gh_fanout::batch::{Batch, CreateBranches};
//! use gh_fanout::github::{Credential, GitHubClient};
//! use gh_fanout::types::{parse_repositories, BranchSpec};
//!
//! let client = GitHubClient::new(Credential::new("ghp_token", "acme")?)?;
//! let spec = BranchSpec::new("release/2.0", "main");
//! let mut op = CreateBranches::new(&client, &spec)?;
//!
//! let outcome = Batch::new(parse_repositories(["api", "web", "worker"])?)
//!     .rollback(true)
//!     .run(&mut op)?;
//!
//! println!("{}", outcome.summary());
//! # Ok::<(), gh_fanout::error::FanoutError>(())
//! ```

mod operations;
mod outcome;

pub use operations::{CreateBranches, FnOperation, OpenPullRequests};
pub use outcome::{BatchOutcome, BatchSummary, OperationResult, RollbackFailure};

use std::collections::HashSet;
use std::fmt;

use crate::error::{FanoutError, Result};
use crate::types::RepositoryRef;

/// What a successful create call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied<H> {
    /// The resource was created by this call; it is eligible for rollback.
    Created(H),
    /// The resource was already there; it is never rolled back.
    AlreadyExisted(H),
}

/// A create operation and its inverse, applied per repository.
pub trait BatchOperation {
    /// Identifies a created resource well enough to undo it.
    type Handle: Clone + fmt::Debug + fmt::Display;

    /// Create the resource in `repo`.
    fn apply(&mut self, repo: &RepositoryRef) -> Result<Applied<Self::Handle>>;

    /// Undo a resource previously returned by [`BatchOperation::apply`].
    fn revert(&mut self, handle: &Self::Handle) -> Result<()>;
}

/// A batch of repositories and the rollback policy to run them with.
#[derive(Debug, Clone)]
pub struct Batch {
    repos: Vec<RepositoryRef>,
    rollback: bool,
    default_owner: Option<String>,
}

impl Batch {
    /// Create a batch over `repos`, with rollback disabled.
    pub fn new(repos: impl IntoIterator<Item = RepositoryRef>) -> Self {
        Self {
            repos: repos.into_iter().collect(),
            rollback: false,
            default_owner: None,
        }
    }

    /// Enable or disable rollback on first failure.
    pub fn rollback(mut self, enabled: bool) -> Self {
        self.rollback = enabled;
        self
    }

    /// Owner that bare names resolve to, so `owner/name` and `name` count as
    /// the same repository when checking for duplicates.
    pub fn default_owner(mut self, owner: impl Into<String>) -> Self {
        self.default_owner = Some(owner.into());
        self
    }

    pub fn repos(&self) -> &[RepositoryRef] {
        &self.repos
    }

    /// Reject an empty list, blank names and duplicates.
    pub fn validate(&self) -> Result<()> {
        if self.repos.is_empty() {
            return Err(FanoutError::InvalidInput(
                "no repositories to process".into(),
            ));
        }

        let mut seen = HashSet::new();
        for repo in &self.repos {
            if repo.name().trim().is_empty() {
                return Err(FanoutError::InvalidInput(
                    "repository name must not be empty".into(),
                ));
            }
            let key = match &self.default_owner {
                Some(owner) => repo.key(owner),
                None => repo.to_string(),
            };
            if !seen.insert(key) {
                return Err(FanoutError::InvalidInput(format!(
                    "repository '{}' listed more than once",
                    repo
                )));
            }
        }

        Ok(())
    }

    /// Run `op` against every repository.
    ///
    /// Only invalid input is returned as an error; every remote failure is
    /// recorded in the outcome instead.
    pub fn run<O: BatchOperation>(&self, op: &mut O) -> Result<BatchOutcome<O::Handle>> {
        self.validate()?;

        let mut outcome = BatchOutcome::default();
        let mut created: Vec<(RepositoryRef, O::Handle)> = Vec::new();

        for (index, repo) in self.repos.iter().enumerate() {
            match op.apply(repo) {
                Ok(Applied::Created(handle)) => {
                    tracing::info!(%repo, %handle, "created");
                    created.push((repo.clone(), handle.clone()));
                    outcome
                        .entries
                        .push((repo.clone(), OperationResult::Created(handle)));
                }
                Ok(Applied::AlreadyExisted(handle)) => {
                    tracing::info!(%repo, %handle, "already exists, leaving untouched");
                    outcome
                        .entries
                        .push((repo.clone(), OperationResult::AlreadyExisted(handle)));
                }
                Err(err) => {
                    tracing::warn!(%repo, error = %err, "operation failed");
                    outcome.entries.push((
                        repo.clone(),
                        OperationResult::Failed {
                            kind: err.kind(),
                            message: err.to_string(),
                        },
                    ));

                    if self.rollback {
                        roll_back(op, &created, &mut outcome);
                        outcome.skipped = self.repos[index + 1..].to_vec();
                        outcome.halted = true;
                        if !outcome.skipped.is_empty() {
                            tracing::warn!(
                                skipped = outcome.skipped.len(),
                                "batch halted, remaining repositories not attempted"
                            );
                        }
                        break;
                    }
                }
            }
        }

        Ok(outcome)
    }
}

/// Undo every created resource in creation order. Failures are recorded, not raised.
fn roll_back<O: BatchOperation>(
    op: &mut O,
    created: &[(RepositoryRef, O::Handle)],
    outcome: &mut BatchOutcome<O::Handle>,
) {
    if created.is_empty() {
        return;
    }

    tracing::warn!(count = created.len(), "rolling back created resources");

    for (repo, handle) in created {
        match op.revert(handle) {
            Ok(()) => {
                tracing::info!(%repo, %handle, "rolled back");
                outcome.rolled_back.push(handle.clone());
            }
            Err(err) => {
                tracing::error!(%repo, %handle, error = %err, "rollback failed");
                outcome.rollback_failures.push(RollbackFailure {
                    repo: repo.clone(),
                    handle: handle.clone(),
                    kind: err.kind(),
                    message: err.to_string(),
                });
            }
        }
    }
}
