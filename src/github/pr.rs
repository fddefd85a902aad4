//! Pull request operations.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{FanoutError, Result};
use crate::github::GitHubClient;
use crate::github::client::response_message;
use crate::types::{PullRequestHandle, PullRequestSpec, RepositoryRef};

/// Pull request operations.
pub trait PullRequestOps {
    /// Open a pull request from `spec.head` into `spec.base`.
    fn create_pull_request(
        &self,
        repo: &RepositoryRef,
        spec: &PullRequestSpec,
    ) -> Result<PullRequestHandle>;

    /// Close a pull request. GitHub has no delete, so this is the inverse of create.
    fn close_pull_request(&self, repo: &RepositoryRef, number: u64) -> Result<()>;
}

#[derive(Serialize)]
struct CreatePullRequest<'a> {
    title: &'a str,
    body: &'a str,
    head: String,
    base: &'a str,
    draft: bool,
}

#[derive(Serialize)]
struct UpdateState {
    state: &'static str,
}

#[derive(Deserialize)]
struct CreatedPullRequest {
    number: u64,
    #[serde(default)]
    html_url: String,
}

impl PullRequestOps for GitHubClient {
    fn create_pull_request(
        &self,
        repo: &RepositoryRef,
        spec: &PullRequestSpec,
    ) -> Result<PullRequestHandle> {
        spec.validate()?;

        let endpoint = format!("{}/pulls", self.repo_path(repo));
        let payload = CreatePullRequest {
            title: &spec.title,
            body: &spec.body,
            // Head branches always live in the credential owner's account.
            head: format!("{}:{}", self.owner(), spec.head),
            base: &spec.base,
            draft: spec.draft,
        };
        let response = self.send(Method::POST, &endpoint, Some(&payload))?;
        let status = response.status();

        if status != StatusCode::CREATED {
            let message = response_message(response);
            let hint = if status == StatusCode::UNPROCESSABLE_ENTITY {
                " (branch may not exist, have no commits, or a PR may already exist)"
            } else {
                ""
            };
            return Err(FanoutError::remote(
                status,
                format!("failed to create PR in {}: {}: {}{}", repo, status, message, hint),
            ));
        }

        let created: CreatedPullRequest = match response.json() {
            Ok(created) => created,
            Err(err) => {
                // The PR exists but without a number it can never be closed.
                tracing::error!(
                    %repo,
                    head = %spec.head,
                    error = %err,
                    "pull request was opened but the response could not be read; it will not be rolled back"
                );
                return Err(FanoutError::Remote {
                    status: Some(status.as_u16()),
                    message: format!(
                        "PR opened in {} from '{}' but its response was unreadable; close it by hand: {}",
                        repo, spec.head, err
                    ),
                    source: Some(err),
                });
            }
        };
        Ok(PullRequestHandle {
            repo: repo.clone(),
            number: created.number,
            html_url: created.html_url,
        })
    }

    fn close_pull_request(&self, repo: &RepositoryRef, number: u64) -> Result<()> {
        let endpoint = format!("{}/pulls/{}", self.repo_path(repo), number);
        let payload = UpdateState { state: "closed" };
        let response = self.send(Method::PATCH, &endpoint, Some(&payload))?;
        let status = response.status();

        if status == StatusCode::OK {
            return Ok(());
        }

        Err(FanoutError::remote(
            status,
            format!(
                "failed to close PR #{} in {}: {}: {}",
                number,
                repo,
                status,
                response_message(response)
            ),
        ))
    }
}
