//! GitHub API client.

use reqwest::Method;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::error::{FanoutError, Result};
use crate::types::RepositoryRef;

/// Public GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Access token plus the account that owns the target repositories.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    owner: String,
}

impl Credential {
    pub fn new(token: impl Into<String>, owner: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let owner = owner.into();
        if token.trim().is_empty() {
            return Err(FanoutError::Config("GitHub token must not be empty".into()));
        }
        if owner.trim().is_empty() {
            return Err(FanoutError::Config("repository owner must not be empty".into()));
        }
        Ok(Self {
            token: token.trim().to_string(),
            owner: owner.trim().to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .finish()
    }
}

/// Client for interacting with the GitHub API.
///
/// Every call is a single blocking attempt bounded by the configured timeout.
#[derive(Clone)]
pub struct GitHubClient {
    pub(crate) credential: Credential,
    pub(crate) base_url: String,
    pub(crate) client: Client,
}

impl GitHubClient {
    /// Create a client against the public API with the default timeout.
    pub fn new(credential: Credential) -> Result<Self> {
        Self::builder(credential).build()
    }

    /// Start configuring a client.
    pub fn builder(credential: Credential) -> GitHubClientBuilder {
        GitHubClientBuilder {
            credential,
            base_url: DEFAULT_API_URL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The account that bare repository names resolve against.
    pub fn owner(&self) -> &str {
        self.credential.owner()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the default headers for API requests.
    pub(crate) fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.credential.token()))
            .map_err(|_| FanoutError::Config("GitHub token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("gh-fanout"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// `/repos/{owner}/{name}` for a reference, using the credential owner for bare names.
    pub(crate) fn repo_path(&self, repo: &RepositoryRef) -> String {
        format!(
            "/repos/{}/{}",
            urlencoding::encode(repo.owner_or(self.owner())),
            urlencoding::encode(repo.name())
        )
    }

    /// Send a request and hand back the response, whatever its status.
    pub(crate) fn send<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%method, %url, "github request");

        let mut request = self
            .client
            .request(method, &url)
            .headers(self.headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send()?)
    }

    /// Make a GET request to the GitHub API.
    pub(crate) fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self.send::<()>(Method::GET, endpoint, None)?;

        if !response.status().is_success() {
            return Err(failure(response));
        }

        Ok(response.json()?)
    }
}

/// Builder for [`GitHubClient`].
pub struct GitHubClientBuilder {
    credential: Credential,
    base_url: String,
    timeout: Duration,
}

impl GitHubClientBuilder {
    /// Point the client at a different API root.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        // Remove trailing slash if present
        while url.ends_with('/') {
            url.pop();
        }
        self.base_url = url;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<GitHubClient> {
        url::Url::parse(&self.base_url).map_err(|e| {
            FanoutError::Config(format!("invalid API URL '{}': {}", self.base_url, e))
        })?;

        let client = Client::builder().timeout(self.timeout).build()?;
        Ok(GitHubClient {
            credential: self.credential,
            base_url: self.base_url,
            client,
        })
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Turn a non-success response into a remote error carrying GitHub's message.
pub(crate) fn failure(response: Response) -> FanoutError {
    let status = response.status();
    let message = response_message(response);
    FanoutError::remote(status, format!("{}: {}", status, message))
}

/// Body text of a response, preferring GitHub's `message` field.
pub(crate) fn response_message(response: Response) -> String {
    let body = response.text().unwrap_or_default();
    match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => parsed.message,
        Err(_) if body.trim().is_empty() => "no response body".into(),
        Err(_) => body,
    }
}

/// Status codes that mean "the thing you referred to is not visible to you".
pub(crate) fn is_not_found(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::NOT_FOUND
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::CONFLICT
    )
}

/// Percent-encode a branch name for use in a URL path, keeping `/` separators.
pub(crate) fn encode_ref(branch: &str) -> String {
    branch
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
