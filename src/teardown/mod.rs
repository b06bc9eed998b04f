//! Ordered, fail-fast teardown of an instance pool and its network.
//!
//! The sequencer drives each resource in [`ResourceKind::TEARDOWN_ORDER`] to
//! the absent state, one call at a time. A resource the provider reports as
//! missing counts as absent. Any other failure stops the sequence; there is
//! no retry, rollback or resume, and the error records which resources were
//! confirmed absent so an operator can pick up from there.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{info, info_span, warn};

use crate::provider::{ProviderError, ResourceClient};
use crate::resource::{ResourceIds, ResourceKind};

/// Exit code for a complete teardown.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code when the sequence failed before any resource was confirmed absent.
pub const EXIT_NOTHING_DELETED: i32 = 2;
/// Exit code when the sequence failed after some resources were confirmed absent.
pub const EXIT_PARTIAL: i32 = 3;
/// Exit code when the sequence was cancelled at a step boundary.
pub const EXIT_CANCELLED: i32 = 130;

/// Shared flag used to request cancellation between steps.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates a flag that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Takes effect before the next step starts.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a step reached the absent state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StepOutcome {
    /// The provider accepted the deletion.
    Deleted,
    /// The provider reported the resource as not found.
    AlreadyAbsent,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => f.write_str("deleted"),
            Self::AlreadyAbsent => f.write_str("already absent"),
        }
    }
}

/// A step confirmed absent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepRecord {
    /// One-based position in the sequence.
    pub step: usize,
    /// Resource kind handled by the step.
    pub kind: ResourceKind,
    /// Identifier passed to the provider.
    pub id: String,
    /// How the resource became absent.
    pub outcome: StepOutcome,
}

/// Summary of a complete teardown.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TeardownReport {
    /// Every step, in order.
    pub steps: Vec<StepRecord>,
}

impl TeardownReport {
    /// Number of resources the provider deleted during this run.
    #[must_use]
    pub fn deleted(&self) -> usize {
        self.count(StepOutcome::Deleted)
    }

    /// Number of resources that were already gone.
    #[must_use]
    pub fn already_absent(&self) -> usize {
        self.count(StepOutcome::AlreadyAbsent)
    }

    fn count(&self, outcome: StepOutcome) -> usize {
        self.steps
            .iter()
            .filter(|record| record.outcome == outcome)
            .count()
    }
}

/// Errors returned by [`TeardownSequencer::teardown`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TeardownError {
    /// A step failed with an error other than not-found.
    #[error(
        "teardown failed at step {step} ({kind} {id}): {source}; {}",
        progress(.completed)
    )]
    StepFailed {
        /// One-based position of the failing step.
        step: usize,
        /// Resource kind of the failing step.
        kind: ResourceKind,
        /// Identifier passed to the provider.
        id: String,
        /// Provider error returned by the step.
        #[source]
        source: ProviderError,
        /// Steps confirmed absent before the failure.
        completed: Vec<StepRecord>,
    },
    /// Cancellation was observed before a step started.
    #[error("teardown cancelled before step {next_step} ({kind}); {}", progress(.completed))]
    Cancelled {
        /// One-based position of the step that was not started.
        next_step: usize,
        /// Resource kind of that step.
        kind: ResourceKind,
        /// Steps confirmed absent before cancellation.
        completed: Vec<StepRecord>,
    },
}

impl TeardownError {
    /// Steps confirmed absent before the sequence stopped.
    #[must_use]
    pub fn completed(&self) -> &[StepRecord] {
        match self {
            Self::StepFailed { completed, .. } | Self::Cancelled { completed, .. } => completed,
        }
    }

    /// Process exit code distinguishing failures with and without progress.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled { .. } => EXIT_CANCELLED,
            Self::StepFailed { completed, .. } if completed.is_empty() => EXIT_NOTHING_DELETED,
            Self::StepFailed { .. } => EXIT_PARTIAL,
        }
    }
}

fn progress(completed: &[StepRecord]) -> String {
    let absent = completed
        .iter()
        .map(|record| record.kind.label())
        .collect::<Vec<_>>();
    let remaining = ResourceKind::TEARDOWN_ORDER
        .iter()
        .skip(completed.len())
        .map(|kind| kind.label())
        .collect::<Vec<_>>();
    format!(
        "confirmed absent: [{}]; not confirmed: [{}]",
        absent.join(", "),
        remaining.join(", ")
    )
}

/// Runs the seven ensure-absent calls in order against a client.
#[derive(Clone, Debug)]
pub struct TeardownSequencer<C> {
    client: C,
    cancellation: Option<CancellationFlag>,
}

impl<C: ResourceClient> TeardownSequencer<C> {
    /// Creates a sequencer using the given provider client.
    #[must_use]
    pub const fn new(client: C) -> Self {
        Self {
            client,
            cancellation: None,
        }
    }

    /// Observes `flag` between steps.
    #[must_use]
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Returns the underlying client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Tears down every resource named in `ids`, in dependency order.
    ///
    /// Each call blocks until the client returns. A not-found response
    /// counts as success. Cancellation is only observed before a step
    /// starts, never while a call is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`TeardownError::StepFailed`] on the first failure other than
    /// not-found, and [`TeardownError::Cancelled`] when cancellation was
    /// requested. Later steps are not attempted in either case.
    pub fn teardown(&self, ids: &ResourceIds) -> Result<TeardownReport, TeardownError> {
        let span = info_span!("teardown");
        let _entered = span.enter();
        let mut completed = Vec::with_capacity(ResourceKind::TEARDOWN_ORDER.len());

        for (kind, id) in ids.in_teardown_order() {
            let step = kind.step();
            if self.is_cancelled() {
                warn!(step, kind = %kind, "teardown cancelled");
                return Err(TeardownError::Cancelled {
                    next_step: step,
                    kind,
                    completed,
                });
            }

            info!(step, kind = %kind, id, "ensuring resource is absent");
            let outcome = match self.client.ensure_absent(kind, id) {
                Ok(()) => StepOutcome::Deleted,
                Err(err) if err.is_not_found() => StepOutcome::AlreadyAbsent,
                Err(err) => {
                    warn!(step, kind = %kind, id, error = %err, "teardown step failed");
                    return Err(TeardownError::StepFailed {
                        step,
                        kind,
                        id: id.to_owned(),
                        source: err,
                        completed,
                    });
                }
            };

            info!(step, kind = %kind, id, outcome = %outcome, "resource absent");
            completed.push(StepRecord {
                step,
                kind,
                id: id.to_owned(),
                outcome,
            });
        }

        Ok(TeardownReport { steps: completed })
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
    }
}
