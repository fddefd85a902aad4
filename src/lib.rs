//! # gh-fanout
//!
//! Fan a routine GitHub operation out across many repositories owned by one
//! account:
//! - Create a branch from a base branch in every selected repository
//! - Open a pull request from a branch into a base branch in every repository
//! - Optionally roll back earlier successes when a later repository fails
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gh_fanout::prelude::*;
//!
//! let client = GitHubClient::new(Credential::new("ghp_token", "acme")?)?;
//! let spec = PullRequestSpec::new("Release 2.0", "release/2.0").body("Automated");
//! let mut op = OpenPullRequests::new(&client, &spec)?;
//!
//! let outcome = Batch::new(parse_repositories(["api", "web"])?)
//!     .rollback(true)
//!     .run(&mut op)?;
//!
//! for (repo, result) in &outcome.entries {
//!     println!("{}: {:?}", repo, result);
//! }
//! # Ok::<(), gh_fanout::error::FanoutError>(())
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod select;
pub mod types;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::batch::{
        Applied, Batch, BatchOperation, BatchOutcome, BatchSummary, CreateBranches, FnOperation,
        OpenPullRequests, OperationResult, RollbackFailure,
    };
    pub use crate::config::{FileConfig, Overrides, Settings};
    pub use crate::error::{ErrorKind, FanoutError, Result};
    pub use crate::github::{
        BranchOps, BranchStatus, Credential, GitHubClient, GitHubRepo, PullRequestOps, RepoOps,
    };
    pub use crate::types::{
        BranchHandle, BranchSpec, PullRequestHandle, PullRequestSpec, RepositoryRef,
        dedupe_for_owner, parse_repositories,
    };
}

pub use prelude::*;
