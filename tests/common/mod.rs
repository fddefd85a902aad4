//! Shared HTTP test double for the blocking GitHub client.
//!
//! The mock server lives on its own tokio runtime; the blocking client is
//! driven from the test thread, outside any async context.

#![allow(dead_code)]

use gh_fanout::github::{Credential, GitHubClient};
use std::time::Duration;
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

pub const OWNER: &str = "acme";
pub const TOKEN: &str = "test-token";

pub struct MockGitHub {
    server: MockServer,
    runtime: Runtime,
}

impl MockGitHub {
    pub fn start() -> Self {
        let runtime = Runtime::new().expect("tokio runtime");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn client(&self) -> GitHubClient {
        GitHubClient::builder(Credential::new(TOKEN, OWNER).unwrap())
            .base_url(self.server.uri())
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    /// `METHOD /path` for every request received, in order.
    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url.path()))
            .collect()
    }
}
