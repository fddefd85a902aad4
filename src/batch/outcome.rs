//! Per-repository results and batch summaries.

use std::fmt;

use crate::error::ErrorKind;
use crate::types::RepositoryRef;

/// Result recorded for one attempted repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult<H> {
    /// Created by this run.
    Created(H),
    /// Already present; left alone and never rolled back.
    AlreadyExisted(H),
    /// The create call failed.
    Failed { kind: ErrorKind, message: String },
}

impl<H> OperationResult<H> {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The handle, for either success variant.
    pub fn handle(&self) -> Option<&H> {
        match self {
            Self::Created(h) | Self::AlreadyExisted(h) => Some(h),
            Self::Failed { .. } => None,
        }
    }
}

/// A rollback call that itself failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackFailure<H> {
    pub repo: RepositoryRef,
    pub handle: H,
    pub kind: ErrorKind,
    pub message: String,
}

/// Everything that happened during one batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome<H> {
    /// One entry per attempted repository, in input order.
    pub entries: Vec<(RepositoryRef, OperationResult<H>)>,
    /// Handles successfully undone, in the order they were undone.
    pub rolled_back: Vec<H>,
    /// Rollback calls that failed. Reported, never retried.
    pub rollback_failures: Vec<RollbackFailure<H>>,
    /// Repositories never attempted because the batch halted.
    pub skipped: Vec<RepositoryRef>,
    /// Whether a failure triggered the rollback-and-halt path.
    pub halted: bool,
}

impl<H> Default for BatchOutcome<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            rolled_back: Vec::new(),
            rollback_failures: Vec::new(),
            skipped: Vec::new(),
            halted: false,
        }
    }
}

impl<H> BatchOutcome<H> {
    /// True when every repository in the batch succeeded.
    pub fn is_success(&self) -> bool {
        !self.halted
            && self.skipped.is_empty()
            && self.entries.iter().all(|(_, result)| !result.is_failed())
    }

    /// True when at least one rollback call failed.
    pub fn rollback_partial_failure(&self) -> bool {
        !self.rollback_failures.is_empty()
    }

    /// Repositories whose create call failed, with the failure message.
    pub fn failures(&self) -> impl Iterator<Item = (&RepositoryRef, ErrorKind, &str)> {
        self.entries.iter().filter_map(|(repo, result)| match result {
            OperationResult::Failed { kind, message } => Some((repo, *kind, message.as_str())),
            _ => None,
        })
    }

    /// Count results by category.
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            attempted: self.entries.len(),
            rolled_back: self.rolled_back.len(),
            rollback_failures: self.rollback_failures.len(),
            skipped: self.skipped.len(),
            ..BatchSummary::default()
        };

        for (_, result) in &self.entries {
            match result {
                OperationResult::Created(_) => summary.created += 1,
                OperationResult::AlreadyExisted(_) => summary.already_existed += 1,
                OperationResult::Failed { .. } => summary.failed += 1,
            }
        }

        summary
    }
}

/// Summary of a batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub created: usize,
    pub already_existed: usize,
    pub failed: usize,
    pub rolled_back: usize,
    pub rollback_failures: usize,
    pub skipped: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attempted: {} created, {} already existed, {} failed",
            self.attempted, self.created, self.already_existed, self.failed
        )?;
        if self.rolled_back > 0 || self.rollback_failures > 0 {
            write!(
                f,
                "; {} rolled back, {} rollback failure(s)",
                self.rolled_back, self.rollback_failures
            )?;
        }
        if self.skipped > 0 {
            write!(f, "; {} skipped", self.skipped)?;
        }
        Ok(())
    }
}
