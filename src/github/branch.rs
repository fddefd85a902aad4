//! Branch (git reference) operations.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{FanoutError, Result};
use crate::github::GitHubClient;
use crate::github::client::{encode_ref, failure, is_not_found, response_message};
use crate::types::RepositoryRef;

/// What `create_branch` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    /// GitHub confirmed the new reference.
    Created,
    /// A branch with that name was already there; nothing was changed.
    AlreadyExists,
}

/// Branch operations against a remote repository.
pub trait BranchOps {
    /// Commit SHA that `branch` currently points at.
    fn branch_sha(&self, repo: &RepositoryRef, branch: &str) -> Result<String>;

    /// Whether `branch` exists in `repo`.
    fn branch_exists(&self, repo: &RepositoryRef, branch: &str) -> Result<bool>;

    /// Create `new_branch` at the tip of `base_branch`.
    ///
    /// An existing branch with the same name is left untouched and reported
    /// as [`BranchStatus::AlreadyExists`].
    fn create_branch(
        &self,
        repo: &RepositoryRef,
        new_branch: &str,
        base_branch: &str,
    ) -> Result<BranchStatus>;

    /// Delete `branch` from `repo`.
    fn delete_branch(&self, repo: &RepositoryRef, branch: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Serialize)]
struct CreateRef<'a> {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: &'a str,
}

impl BranchOps for GitHubClient {
    fn branch_sha(&self, repo: &RepositoryRef, branch: &str) -> Result<String> {
        let endpoint = format!("{}/git/ref/heads/{}", self.repo_path(repo), encode_ref(branch));
        let response = self.send::<()>(Method::GET, &endpoint, None)?;
        let status = response.status();

        if status == StatusCode::OK {
            let reference: GitRef = response.json()?;
            return Ok(reference.object.sha);
        }

        if is_not_found(status) {
            return Err(FanoutError::NotFound {
                message: format!(
                    "branch '{}' not found in {} ({}: {})",
                    branch,
                    repo,
                    status,
                    response_message(response)
                ),
            });
        }

        Err(failure(response))
    }

    fn branch_exists(&self, repo: &RepositoryRef, branch: &str) -> Result<bool> {
        // Exact ref lookup; `/branches/{name}` redirects for renamed branches.
        let endpoint = format!("{}/git/ref/heads/{}", self.repo_path(repo), encode_ref(branch));
        let response = self.send::<()>(Method::GET, &endpoint, None)?;
        let status = response.status();

        match status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ if is_not_found(status) => Err(FanoutError::NotFound {
                message: format!(
                    "cannot look up branch '{}' in {} ({}: {})",
                    branch,
                    repo,
                    status,
                    response_message(response)
                ),
            }),
            _ => Err(failure(response)),
        }
    }

    fn create_branch(
        &self,
        repo: &RepositoryRef,
        new_branch: &str,
        base_branch: &str,
    ) -> Result<BranchStatus> {
        if new_branch.trim().is_empty() || base_branch.trim().is_empty() {
            return Err(FanoutError::InvalidInput(
                "branch and base branch names are required".into(),
            ));
        }

        if self.branch_exists(repo, new_branch)? {
            tracing::debug!(%repo, branch = new_branch, "branch already exists");
            return Ok(BranchStatus::AlreadyExists);
        }

        let sha = self.branch_sha(repo, base_branch)?;
        let endpoint = format!("{}/git/refs", self.repo_path(repo));
        let payload = CreateRef {
            ref_name: format!("refs/heads/{}", new_branch),
            sha: &sha,
        };
        let response = self.send(Method::POST, &endpoint, Some(&payload))?;
        let status = response.status();

        if status == StatusCode::CREATED {
            return Ok(BranchStatus::Created);
        }

        let message = response_message(response);
        // Someone else created it between the existence check and the POST.
        if status == StatusCode::UNPROCESSABLE_ENTITY && message.contains("already exists") {
            return Ok(BranchStatus::AlreadyExists);
        }

        Err(FanoutError::remote(
            status,
            format!("failed to create branch in {}: {}: {}", repo, status, message),
        ))
    }

    fn delete_branch(&self, repo: &RepositoryRef, branch: &str) -> Result<()> {
        let endpoint = format!("{}/git/refs/heads/{}", self.repo_path(repo), encode_ref(branch));
        let response = self.send::<()>(Method::DELETE, &endpoint, None)?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        Err(FanoutError::remote(
            status,
            format!(
                "failed to delete branch in {}: {}: {}",
                repo,
                status,
                response_message(response)
            ),
        ))
    }
}
