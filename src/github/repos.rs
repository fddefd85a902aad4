//! GitHub repository listing.

use crate::error::Result;
use crate::github::GitHubClient;
use crate::types::RepositoryRef;
use serde::Deserialize;

/// Upper bound on pages fetched, so a misbehaving server cannot loop us forever.
const MAX_PAGES: u32 = 100;

/// Repository information from GitHub API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    pub full_name: String,
    pub owner: RepoOwner,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(rename = "private", default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwner {
    pub login: String,
}

/// Repository listing operations.
pub trait RepoOps {
    /// List every repository visible to the credential.
    fn list_repos(&self) -> Result<Vec<GitHubRepo>>;

    /// List visible repositories as references, bare names for the credential owner.
    fn list_repositories(&self) -> Result<Vec<RepositoryRef>>;
}

impl RepoOps for GitHubClient {
    fn list_repos(&self) -> Result<Vec<GitHubRepo>> {
        let mut all_repos = Vec::new();
        let mut page = 1;

        loop {
            let endpoint = format!("/user/repos?per_page=100&page={}", page);
            let repos: Vec<GitHubRepo> = self.get(&endpoint)?;

            if repos.is_empty() {
                break;
            }

            let last_page = repos.len() < 100;
            all_repos.extend(repos);
            page += 1;

            if last_page || page > MAX_PAGES {
                break;
            }
        }

        tracing::debug!(count = all_repos.len(), "listed repositories");
        Ok(all_repos)
    }

    fn list_repositories(&self) -> Result<Vec<RepositoryRef>> {
        let owner = self.owner();
        Ok(self
            .list_repos()?
            .into_iter()
            .map(|repo| {
                if repo.owner.login.eq_ignore_ascii_case(owner) {
                    RepositoryRef::new(repo.name)
                } else {
                    RepositoryRef::with_owner(repo.owner.login, repo.name)
                }
            })
            .collect())
    }
}
