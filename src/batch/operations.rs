//! Concrete batch operations backed by the GitHub client traits.

use std::fmt;
use std::marker::PhantomData;

use crate::batch::{Applied, BatchOperation};
use crate::error::Result;
use crate::github::{BranchOps, BranchStatus, PullRequestOps};
use crate::types::{BranchHandle, BranchSpec, PullRequestHandle, PullRequestSpec, RepositoryRef};

/// Create the same branch in every repository; undo by deleting it.
pub struct CreateBranches<'a, C: BranchOps> {
    client: &'a C,
    spec: &'a BranchSpec,
}

impl<'a, C: BranchOps> CreateBranches<'a, C> {
    pub fn new(client: &'a C, spec: &'a BranchSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self { client, spec })
    }
}

impl<C: BranchOps> BatchOperation for CreateBranches<'_, C> {
    type Handle = BranchHandle;

    fn apply(&mut self, repo: &RepositoryRef) -> Result<Applied<BranchHandle>> {
        let status = self
            .client
            .create_branch(repo, &self.spec.new_name, &self.spec.base)?;
        let handle = BranchHandle {
            repo: repo.clone(),
            branch: self.spec.new_name.clone(),
        };
        Ok(match status {
            BranchStatus::Created => Applied::Created(handle),
            BranchStatus::AlreadyExists => Applied::AlreadyExisted(handle),
        })
    }

    fn revert(&mut self, handle: &BranchHandle) -> Result<()> {
        self.client.delete_branch(&handle.repo, &handle.branch)
    }
}

/// Open the same pull request in every repository; undo by closing it.
pub struct OpenPullRequests<'a, C: PullRequestOps> {
    client: &'a C,
    spec: &'a PullRequestSpec,
}

impl<'a, C: PullRequestOps> OpenPullRequests<'a, C> {
    pub fn new(client: &'a C, spec: &'a PullRequestSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self { client, spec })
    }
}

impl<C: PullRequestOps> BatchOperation for OpenPullRequests<'_, C> {
    type Handle = PullRequestHandle;

    fn apply(&mut self, repo: &RepositoryRef) -> Result<Applied<PullRequestHandle>> {
        self.client
            .create_pull_request(repo, self.spec)
            .map(Applied::Created)
    }

    fn revert(&mut self, handle: &PullRequestHandle) -> Result<()> {
        self.client.close_pull_request(&handle.repo, handle.number)
    }
}

/// A batch operation built from a create closure and its inverse.
pub struct FnOperation<H, C, R> {
    create: C,
    rollback: R,
    _handle: PhantomData<fn() -> H>,
}

impl<H, C, R> FnOperation<H, C, R>
where
    C: FnMut(&RepositoryRef) -> Result<Applied<H>>,
    R: FnMut(&H) -> Result<()>,
{
    pub fn new(create: C, rollback: R) -> Self {
        Self {
            create,
            rollback,
            _handle: PhantomData,
        }
    }
}

impl<H, C, R> BatchOperation for FnOperation<H, C, R>
where
    H: Clone + fmt::Debug + fmt::Display,
    C: FnMut(&RepositoryRef) -> Result<Applied<H>>,
    R: FnMut(&H) -> Result<()>,
{
    type Handle = H;

    fn apply(&mut self, repo: &RepositoryRef) -> Result<Applied<H>> {
        (self.create)(repo)
    }

    fn revert(&mut self, handle: &H) -> Result<()> {
        (self.rollback)(handle)
    }
}
