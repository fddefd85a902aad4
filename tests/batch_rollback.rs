//! Integration tests for the batch orchestrator and its rollback policy.

mod common;

use common::MockGitHub;
use gh_fanout::prelude::*;
use serde_json::json;
use std::cell::RefCell;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// Test double that records every call and fails on chosen repositories.
#[derive(Default)]
struct Recorder {
    fail_create: Vec<String>,
    fail_revert: Vec<String>,
    calls: Vec<String>,
}

impl Recorder {
    fn failing(repos: &[&str]) -> Self {
        Self {
            fail_create: repos.iter().map(|r| r.to_string()).collect(),
            ..Default::default()
        }
    }

    fn creates(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| c.strip_prefix("create "))
            .collect()
    }

    fn reverts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| c.strip_prefix("revert "))
            .collect()
    }
}

impl BatchOperation for Recorder {
    type Handle = String;

    fn apply(&mut self, repo: &RepositoryRef) -> Result<Applied<String>> {
        let name = repo.to_string();
        self.calls.push(format!("create {}", name));
        if self.fail_create.contains(&name) {
            return Err(FanoutError::remote(
                reqwest::StatusCode::UNPROCESSABLE_ENTITY,
                format!("create failed in {}", name),
            ));
        }
        Ok(Applied::Created(name))
    }

    fn revert(&mut self, handle: &String) -> Result<()> {
        self.calls.push(format!("revert {}", handle));
        if self.fail_revert.contains(handle) {
            return Err(FanoutError::remote(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                format!("revert failed in {}", handle),
            ));
        }
        Ok(())
    }
}

fn repos(names: &[&str]) -> Vec<RepositoryRef> {
    names.iter().map(|n| RepositoryRef::parse(n).unwrap()).collect()
}

fn entry_names<H>(outcome: &BatchOutcome<H>) -> Vec<String> {
    outcome.entries.iter().map(|(r, _)| r.to_string()).collect()
}

#[test]
fn test_all_succeed_one_created_per_repo_in_order() {
    let mut op = Recorder::default();
    let outcome = Batch::new(repos(&["a/x", "a/y", "a/z"]))
        .rollback(true)
        .run(&mut op)
        .unwrap();

    assert_eq!(entry_names(&outcome), vec!["a/x", "a/y", "a/z"]);
    assert!(outcome
        .entries
        .iter()
        .all(|(r, res)| *res == OperationResult::Created(r.to_string())));
    assert!(outcome.is_success());
    assert!(op.reverts().is_empty());
}

#[test]
fn test_failure_with_rollback_undoes_and_halts() {
    let mut op = Recorder::failing(&["a/y"]);
    let outcome = Batch::new(repos(&["a/x", "a/y", "a/z"]))
        .rollback(true)
        .run(&mut op)
        .unwrap();

    assert_eq!(entry_names(&outcome), vec!["a/x", "a/y"]);
    assert_eq!(outcome.entries[0].1, OperationResult::Created("a/x".into()));
    assert!(matches!(
        &outcome.entries[1].1,
        OperationResult::Failed { kind: ErrorKind::Remote, message } if message.contains("a/y")
    ));
    assert_eq!(op.reverts(), vec!["a/x"]);
    assert!(!op.creates().contains(&"a/z"));
    assert_eq!(outcome.rolled_back, vec!["a/x".to_string()]);
    assert_eq!(outcome.skipped, repos(&["a/z"]));
    assert!(outcome.halted);
    assert!(!outcome.is_success());
}

#[test]
fn test_failure_on_first_repo_with_rollback_halts_without_reverting() {
    let mut op = Recorder::failing(&["a/x"]);
    let outcome = Batch::new(repos(&["a/x", "a/y"]))
        .rollback(true)
        .run(&mut op)
        .unwrap();

    assert_eq!(op.calls, vec!["create a/x"]);
    assert_eq!(entry_names(&outcome), vec!["a/x"]);
    assert!(outcome.rolled_back.is_empty());
    assert_eq!(outcome.skipped, repos(&["a/y"]));
}

#[test]
fn test_rollback_runs_in_creation_order() {
    let mut op = Recorder::failing(&["d"]);
    Batch::new(repos(&["a", "b", "c", "d", "e"]))
        .rollback(true)
        .run(&mut op)
        .unwrap();

    assert_eq!(
        op.calls,
        vec![
            "create a", "create b", "create c", "create d", "revert a", "revert b", "revert c",
        ]
    );
}

#[test]
fn test_rollback_failure_does_not_stop_remaining_rollbacks() {
    let mut op = Recorder {
        fail_create: vec!["c".into()],
        fail_revert: vec!["a".into()],
        ..Default::default()
    };
    let outcome = Batch::new(repos(&["a", "b", "c"]))
        .rollback(true)
        .run(&mut op)
        .unwrap();

    assert_eq!(op.reverts(), vec!["a", "b"]);
    assert_eq!(outcome.rolled_back, vec!["b".to_string()]);
    assert!(outcome.rollback_partial_failure());
    assert_eq!(outcome.rollback_failures.len(), 1);
    assert_eq!(outcome.rollback_failures[0].handle, "a");
    assert_eq!(outcome.rollback_failures[0].kind, ErrorKind::Remote);
    assert!(outcome.rollback_failures[0].message.contains("revert failed"));
}

#[test]
fn test_failure_without_rollback_continues() {
    let mut op = Recorder::failing(&["a/y"]);
    let outcome = Batch::new(repos(&["a/x", "a/y", "a/z"]))
        .rollback(false)
        .run(&mut op)
        .unwrap();

    assert_eq!(op.creates(), vec!["a/x", "a/y", "a/z"]);
    assert!(op.reverts().is_empty());
    assert_eq!(entry_names(&outcome), vec!["a/x", "a/y", "a/z"]);
    assert!(outcome.entries[1].1.is_failed());
    assert_eq!(outcome.entries[2].1, OperationResult::Created("a/z".into()));
    assert!(outcome.skipped.is_empty());
    assert!(!outcome.halted);
    assert!(!outcome.is_success());

    let summary = outcome.summary();
    assert_eq!((summary.created, summary.failed), (2, 1));
}

#[test]
fn test_empty_batch_is_invalid_input_before_any_call() {
    let mut op = Recorder::default();
    let err = Batch::new(Vec::new()).run(&mut op).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(op.calls.is_empty());
}

#[test]
fn test_duplicate_repositories_rejected_before_any_call() {
    let mut op = Recorder::default();
    let err = Batch::new(repos(&["a/x", "a/x"]))
        .run(&mut op)
        .unwrap_err();

    assert!(matches!(err, FanoutError::InvalidInput(_)));
    assert!(op.calls.is_empty());
}

#[test]
fn test_implied_owner_duplicate_rejected_before_any_call() {
    let mut op = Recorder::default();
    let err = Batch::new(repos(&["acme/widgets", "widgets"]))
        .default_owner("acme")
        .run(&mut op)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(op.calls.is_empty());

    let outcome = Batch::new(repos(&["acme/widgets", "other/widgets"]))
        .default_owner("acme")
        .run(&mut op)
        .unwrap();
    assert_eq!(outcome.entries.len(), 2);
}

#[test]
fn test_closure_pair_operation() {
    let reverted = RefCell::new(Vec::new());
    let mut op = FnOperation::new(
        |repo: &RepositoryRef| {
            if repo.name() == "bad" {
                Err(FanoutError::NotFound {
                    message: "missing".into(),
                })
            } else {
                Ok(Applied::Created(repo.name().len()))
            }
        },
        |handle: &usize| {
            reverted.borrow_mut().push(*handle);
            Ok(())
        },
    );

    let outcome = Batch::new(repos(&["abc", "de", "bad"]))
        .rollback(true)
        .run(&mut op)
        .unwrap();

    assert_eq!(*reverted.borrow(), vec![3, 2]);
    assert!(matches!(
        outcome.entries[2].1,
        OperationResult::Failed {
            kind: ErrorKind::NotFound,
            ..
        }
    ));
}

#[test]
fn test_branch_batch_rolls_back_over_http() {
    let github = MockGitHub::start();

    for repo in ["x", "y"] {
        github.mount(
            Mock::given(method("GET"))
                .and(path(format!("/repos/acme/{}/git/ref/heads/release", repo)))
                .respond_with(ResponseTemplate::new(404)),
        );
    }
    github.mount(
        Mock::given(method("GET"))
            .and(path("/repos/acme/x/git/ref/heads/main"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "object": { "sha": "abc" } })),
            ),
    );
    github.mount(
        Mock::given(method("GET"))
            .and(path("/repos/acme/y/git/ref/heads/main"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" }))),
    );
    github.mount(
        Mock::given(method("POST"))
            .and(path("/repos/acme/x/git/refs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({}))),
    );
    github.mount(
        Mock::given(method("DELETE"))
            .and(path("/repos/acme/x/git/refs/heads/release"))
            .respond_with(ResponseTemplate::new(204)),
    );

    let client = github.client();
    let spec = BranchSpec::new("release", "main");
    let mut op = CreateBranches::new(&client, &spec).unwrap();

    let outcome = Batch::new(repos(&["x", "y", "z"]))
        .rollback(true)
        .run(&mut op)
        .unwrap();

    assert_eq!(entry_names(&outcome), vec!["x", "y"]);
    assert!(matches!(
        outcome.entries[1].1,
        OperationResult::Failed {
            kind: ErrorKind::NotFound,
            ..
        }
    ));
    assert_eq!(outcome.rolled_back.len(), 1);
    assert_eq!(outcome.rolled_back[0].to_string(), "x@release");
    assert_eq!(outcome.skipped, repos(&["z"]));

    let lines = github.request_lines();
    assert_eq!(
        lines.last().map(String::as_str),
        Some("DELETE /repos/acme/x/git/refs/heads/release")
    );
    assert!(!lines.iter().any(|l| l.contains("/acme/z/")));
}

#[test]
fn test_pull_request_batch_closes_on_rollback() {
    let github = MockGitHub::start();
    github.mount(
        Mock::given(method("POST"))
            .and(path("/repos/acme/x/pulls"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "number": 5 }))),
    );
    github.mount(
        Mock::given(method("POST"))
            .and(path("/repos/acme/y/pulls"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({ "message": "Validation Failed" })),
            ),
    );
    github.mount(
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/x/pulls/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "number": 5 }))),
    );

    let client = github.client();
    let spec = PullRequestSpec::new("Release", "release");
    let mut op = OpenPullRequests::new(&client, &spec).unwrap();

    let outcome = Batch::new(repos(&["x", "y"]))
        .rollback(true)
        .run(&mut op)
        .unwrap();

    assert_eq!(outcome.rolled_back.len(), 1);
    assert_eq!(outcome.rolled_back[0].number, 5);
    assert!(!outcome.rollback_partial_failure());
    assert_eq!(
        github.request_lines().last().map(String::as_str),
        Some("PATCH /repos/acme/x/pulls/5")
    );
}

#[test]
fn test_pull_request_batch_opens_one_pr_for_owner_and_bare_spelling() {
    let github = MockGitHub::start();
    github.mount(
        Mock::given(method("POST"))
            .and(path("/repos/acme/widgets/pulls"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "number": 1 }))),
    );

    let client = github.client();
    let spec = PullRequestSpec::new("Release", "release");
    let mut op = OpenPullRequests::new(&client, &spec).unwrap();

    let targets = dedupe_for_owner(repos(&["acme/widgets", "widgets"]), client.owner());
    let outcome = Batch::new(targets)
        .default_owner(client.owner())
        .rollback(true)
        .run(&mut op)
        .unwrap();

    assert!(outcome.is_success());
    assert!(outcome.rolled_back.is_empty());
    assert_eq!(
        github.request_lines(),
        vec!["POST /repos/acme/widgets/pulls"]
    );
}
