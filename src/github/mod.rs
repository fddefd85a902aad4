//! GitHub API integration for fan-out operations.
//!
//! This module provides a blocking client for the handful of REST calls the
//! batch needs:
//! - Create and delete branches (git references)
//! - Open and close pull requests
//! - List the repositories visible to a token
//!
//! # Example
//!
//! ```rust,no_run
//! use gh_fanout::github::{BranchOps, Credential, GitHubClient};
//! use gh_fanout::types::RepositoryRef;
//!
//! let client = GitHubClient::new(Credential::new("ghp_your_token_here", "my-account")?)?;
//! let repo = RepositoryRef::parse("widgets")?;
//!
//! client.create_branch(&repo, "release/1.4", "main")?;
//! # Ok::<(), gh_fanout::error::FanoutError>(())
//! ```

mod branch;
mod client;
mod pr;
mod repos;

pub use branch::{BranchOps, BranchStatus};
pub use client::{Credential, DEFAULT_API_URL, DEFAULT_TIMEOUT, GitHubClient, GitHubClientBuilder};
pub use pr::PullRequestOps;
pub use repos::{GitHubRepo, RepoOps, RepoOwner};
