//! The contract every test case implements
//!
//! A case is started once with [`TestCase::run`] and then polled through
//! [`TestCase::status`] on every scheduler tick until it stops being
//! pending. `run` must not block: long work belongs in a spawned task that
//! reports back through a [`Completer`].

use tokio::sync::watch;

use crate::remote::{ApiClient, EventListener};

/// Progress of a started case as seen by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseStatus {
    /// Still working (or hanging; the scheduler cannot tell)
    Pending,
    /// Finished successfully
    Completed,
    /// Finished with an explicit failure
    Failed(String),
}

impl CaseStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, CaseStatus::Pending)
    }
}

/// A unit of work run against the service under test
pub trait TestCase: Send {
    /// Human-readable name used in progress output and errors
    fn name(&self) -> &str;

    /// Begin the case's work
    ///
    /// Called exactly once, from within the tokio runtime, with the run's
    /// shared collaborators.
    fn run(&mut self, client: &ApiClient, events: &EventListener);

    /// Current completion status
    fn status(&self) -> CaseStatus;
}

/// Create a connected completion pair
///
/// The [`Completer`] goes to the task doing the work, the
/// [`CompletionFlag`] stays with the case for polling.
pub fn completion() -> (Completer, CompletionFlag) {
    let (tx, rx) = watch::channel(CaseStatus::Pending);
    (Completer { tx }, CompletionFlag { rx })
}

/// Writing side of a case's completion status
///
/// Dropping it while the status is still pending marks the case failed,
/// so a task that panics or returns early is not mistaken for a hang.
#[derive(Debug)]
pub struct Completer {
    tx: watch::Sender<CaseStatus>,
}

impl Completer {
    /// Mark the case completed
    pub fn complete(self) {
        self.tx.send_replace(CaseStatus::Completed);
    }

    /// Mark the case failed
    pub fn fail(self, reason: impl Into<String>) {
        self.tx.send_replace(CaseStatus::Failed(reason.into()));
    }

    /// Report the outcome of a fallible body
    pub fn finish<E: std::fmt::Display>(self, result: std::result::Result<(), E>) {
        match result {
            Ok(()) => self.complete(),
            Err(e) => self.fail(e.to_string()),
        }
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        self.tx.send_if_modified(|status| {
            if status.is_pending() {
                *status = CaseStatus::Failed("case task ended without reporting".to_string());
                true
            } else {
                false
            }
        });
    }
}

/// Reading side of a case's completion status
#[derive(Debug, Clone)]
pub struct CompletionFlag {
    rx: watch::Receiver<CaseStatus>,
}

impl CompletionFlag {
    pub fn status(&self) -> CaseStatus {
        self.rx.borrow().clone()
    }
}
