//! Core value types: repository references and operation parameters.

use crate::error::{FanoutError, Result};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Default base branch when none is configured.
pub const DEFAULT_BASE_BRANCH: &str = "main";

static SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("static pattern"));

/// A single target repository, written `owner/name` or just `name`.
///
/// A bare name is resolved against the credential's owner by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryRef {
    owner: Option<String>,
    name: String,
}

impl RepositoryRef {
    /// Parse and normalize a repository reference.
    ///
    /// Surrounding whitespace is trimmed. Empty input, more than one `/`,
    /// empty halves and characters GitHub does not allow are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(FanoutError::InvalidInput(
                "repository name must not be empty".into(),
            ));
        }

        let (owner, name) = match trimmed.split_once('/') {
            Some((owner, name)) => (Some(owner), name),
            None => (None, trimmed),
        };

        if let Some(owner) = owner {
            validate_segment(owner, trimmed)?;
        }
        validate_segment(name, trimmed)?;

        Ok(Self {
            owner: owner.map(String::from),
            name: name.to_string(),
        })
    }

    /// Build a bare reference, owned by whoever the credential names.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            owner: None,
            name: name.into(),
        }
    }

    /// Build a reference with an explicit owner.
    pub fn with_owner(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            name: name.into(),
        }
    }

    /// The explicit owner, if one was given.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owner to use against the API, falling back to `default`.
    pub fn owner_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.owner.as_deref().unwrap_or(default)
    }

    /// Drop an explicit owner equal to `default_owner`, leaving a bare name.
    pub fn relative_to(&self, default_owner: &str) -> Self {
        match &self.owner {
            Some(owner) if owner.eq_ignore_ascii_case(default_owner) => Self::new(self.name.clone()),
            _ => self.clone(),
        }
    }

    /// Identity of the repository once the owner is resolved.
    ///
    /// GitHub compares owners and names case-insensitively, so the key is
    /// lowercased.
    pub fn key(&self, default_owner: &str) -> String {
        format!("{}/{}", self.owner_or(default_owner), self.name).to_ascii_lowercase()
    }
}

fn validate_segment(segment: &str, whole: &str) -> Result<()> {
    if segment.is_empty() || segment == "." || segment == ".." || !SEGMENT.is_match(segment) {
        return Err(FanoutError::InvalidInput(format!(
            "'{}' is not a valid repository (expected 'owner/name' or 'name')",
            whole
        )));
    }
    Ok(())
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{}/{}", owner, self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for RepositoryRef {
    type Err = FanoutError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Collapse duplicates, keeping the first occurrence and input order.
pub fn dedupe<I>(refs: I) -> Vec<RepositoryRef>
where
    I: IntoIterator<Item = RepositoryRef>,
{
    let mut seen = HashSet::new();
    refs.into_iter()
        .filter(|r| seen.insert(r.to_string()))
        .collect()
}

/// Collapse references that name the same repository once bare names are
/// resolved against `default_owner`.
///
/// Survivors keep the first occurrence's position and are written relative
/// to `default_owner`, so `acme/widgets` and `widgets` collapse to `widgets`.
pub fn dedupe_for_owner<I>(refs: I, default_owner: &str) -> Vec<RepositoryRef>
where
    I: IntoIterator<Item = RepositoryRef>,
{
    let mut seen = HashSet::new();
    refs.into_iter()
        .filter(|r| seen.insert(r.key(default_owner)))
        .map(|r| r.relative_to(default_owner))
        .collect()
}

/// Parse a raw list of names into a deduplicated list of references.
///
/// Blank entries are dropped. Any malformed entry fails the whole list, as
/// does a list that ends up empty.
pub fn parse_repositories<I, S>(inputs: I) -> Result<Vec<RepositoryRef>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parsed = inputs
        .into_iter()
        .filter(|s| !s.as_ref().trim().is_empty())
        .map(|s| RepositoryRef::parse(s.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let repos = dedupe(parsed);
    if repos.is_empty() {
        return Err(FanoutError::InvalidInput(
            "no valid repositories selected".into(),
        ));
    }
    Ok(repos)
}

/// Parameters for creating a branch in each repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSpec {
    pub new_name: String,
    pub base: String,
}

impl BranchSpec {
    pub fn new(new_name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            new_name: new_name.into(),
            base: base.into(),
        }
    }

    /// Check that both branch names are present.
    pub fn validate(&self) -> Result<()> {
        require("branch name", &self.new_name)?;
        require("base branch", &self.base)
    }
}

/// Parameters for opening a pull request in each repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSpec {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
    pub draft: bool,
}

impl PullRequestSpec {
    /// Pull request parameters targeting the default base branch.
    pub fn new(title: impl Into<String>, head: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: String::new(),
            head: head.into(),
            base: DEFAULT_BASE_BRANCH.into(),
            draft: false,
        }
    }

    /// Set the pull request description.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the branch to merge into.
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Open the pull request as a draft.
    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    /// Check that title, head and base are present.
    pub fn validate(&self) -> Result<()> {
        require("pull request title", &self.title)?;
        require("head branch", &self.head)?;
        require("base branch", &self.base)
    }
}

fn require(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FanoutError::InvalidInput(format!("{} is required", what)));
    }
    Ok(())
}

/// A branch created (or found) by this tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHandle {
    pub repo: RepositoryRef,
    pub branch: String,
}

impl fmt::Display for BranchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repo, self.branch)
    }
}

/// A pull request opened by this tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestHandle {
    pub repo: RepositoryRef,
    pub number: u64,
    pub html_url: String,
}

impl fmt::Display for PullRequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}
