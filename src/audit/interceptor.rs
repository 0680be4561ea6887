//! Save interception
//!
//! Wraps a unit of work's commit: captures the pending changes, commits,
//! and hands the event to a sink.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::assembler::EventAssembler;
use super::event::{AuditEvent, CommitOutcome};
use super::sink::{AsyncAuditSink, AuditSink};
use crate::error::{AuditError, AuditResult};
use crate::session::UnitOfWork;

/// When the event reaches the sink relative to the commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitHook {
    /// Write the event first; a sink failure aborts the commit
    PreCommit,
    /// Commit first, then write the event with the commit outcome
    #[default]
    PostCommit,
}

impl fmt::Display for CommitHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreCommit => write!(f, "pre"),
            Self::PostCommit => write!(f, "post"),
        }
    }
}

impl FromStr for CommitHook {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pre" | "pre-commit" | "pre_commit" => Ok(Self::PreCommit),
            "post" | "post-commit" | "post_commit" => Ok(Self::PostCommit),
            other => Err(AuditError::Config(format!(
                "Unknown commit hook '{}'. Use 'pre' or 'post'",
                other
            ))),
        }
    }
}

/// Audits every save of a unit of work
pub struct AuditInterceptor<S> {
    assembler: EventAssembler,
    sink: S,
    hook: CommitHook,
}

impl<S> AuditInterceptor<S> {
    pub fn new(assembler: EventAssembler, sink: S, hook: CommitHook) -> Self {
        Self {
            assembler,
            sink,
            hook,
        }
    }

    pub fn assembler(&self) -> &EventAssembler {
        &self.assembler
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn hook(&self) -> CommitHook {
        self.hook
    }

    /// Commit and fold the result into the captured event
    fn commit_with_outcome<U>(uow: &mut U, event: &mut Option<AuditEvent>) -> AuditResult<usize>
    where
        U: UnitOfWork + ?Sized,
    {
        let result = uow.commit();
        if let Some(event) = event.as_mut() {
            event.complete(CommitOutcome::from_result(&result));
        }
        if let Err(e) = &result {
            tracing::warn!(error = %e, "commit failed");
        }
        result
    }

    /// Pick the error to surface once both the commit and the sink have run
    fn settle(commit: AuditResult<usize>, written: AuditResult<()>) -> AuditResult<usize> {
        match (commit, written) {
            (Ok(rows), Ok(())) => Ok(rows),
            (Ok(_), Err(e)) => Err(e),
            (Err(commit_err), Ok(())) => Err(commit_err),
            (Err(commit_err), Err(sink_err)) => {
                tracing::warn!(error = %sink_err, "audit sink failed after a failed commit");
                Err(commit_err)
            }
        }
    }
}

impl<S: AuditSink> AuditInterceptor<S> {
    /// Audit and commit a unit of work; returns the affected row count
    ///
    /// With [`CommitHook::PostCommit`] a failed commit is still recorded
    /// before its error is returned.
    pub fn save_changes<U>(&self, uow: &mut U) -> AuditResult<usize>
    where
        U: UnitOfWork + ?Sized,
    {
        let mut event = self.assembler.create_event(&*uow)?;

        match self.hook {
            CommitHook::PreCommit => {
                if let Some(event) = &event {
                    self.sink.write(event)?;
                }
                uow.commit()
            }
            CommitHook::PostCommit => {
                let commit = Self::commit_with_outcome(uow, &mut event);
                let written = match &event {
                    Some(event) => self.sink.write(event),
                    None => Ok(()),
                };
                Self::settle(commit, written)
            }
        }
    }
}

impl<S: AsyncAuditSink> AuditInterceptor<S> {
    /// Asynchronous counterpart of `save_changes`
    pub async fn save_changes_async<U>(&self, uow: &mut U) -> AuditResult<usize>
    where
        U: UnitOfWork + ?Sized,
    {
        let mut event = self.assembler.create_event(&*uow)?;

        match self.hook {
            CommitHook::PreCommit => {
                if let Some(event) = &event {
                    self.sink.write_async(event).await?;
                }
                uow.commit()
            }
            CommitHook::PostCommit => {
                let commit = Self::commit_with_outcome(uow, &mut event);
                let written = match &event {
                    Some(event) => self.sink.write_async(event).await,
                    None => Ok(()),
                };
                Self::settle(commit, written)
            }
        }
    }
}
