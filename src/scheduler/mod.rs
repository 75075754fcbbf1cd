//! Sequential case scheduler
//!
//! The scheduler is a state machine woken once per clock tick. Each tick it
//! either starts the next configured case, or polls the case in progress:
//!
//! - `Starting`/`Advancing`: load and start the next case, or finish the
//!   run when none is left. A freshly started case is first polled on the
//!   following tick.
//! - `Running`: a completed case advances to the next one on the same tick;
//!   a failed case ends the run; a pending case uses up one tick of its
//!   budget and times the run out once the budget is exceeded.
//!
//! Completion is checked before the budget, so a case completing on the
//! tick that would exceed it still succeeds. Terminal phases absorb every
//! further tick.

mod clock;

pub use clock::TickClock;

use crate::common::config::RunConfig;
use crate::common::{Error, Result};
use crate::remote::{ApiClient, EventListener};
use crate::testing::{CaseLoader, CaseStatus, TestCase};

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No case started yet
    Starting,
    /// A case is in progress
    Running,
    /// The current case completed; the next one is about to start
    Advancing,
    /// Every case completed
    Finished,
    /// A case stayed pending past the tick budget
    TimedOut,
    /// A case reported failure
    Failed,
    /// A case could not be loaded
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Phase::Finished | Phase::TimedOut | Phase::Failed | Phase::Aborted
        )
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// All cases completed
    Finished { cases: usize },
    /// The named case exceeded its tick budget
    TimedOut { case: String, ticks: u64 },
    /// The named case reported failure
    Failed { case: String, reason: String },
    /// The identifier could not be resolved to a case
    Aborted { case: String, reason: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Finished { .. })
    }

    /// The error describing a failed run, `None` on success
    pub fn error(&self) -> Option<Error> {
        match self {
            RunOutcome::Finished { .. } => None,
            RunOutcome::TimedOut { case, ticks } => Some(Error::Timeout {
                name: case.clone(),
                ticks: *ticks,
            }),
            RunOutcome::Failed { case, reason } => Some(Error::CaseFailed {
                name: case.clone(),
                reason: reason.clone(),
            }),
            RunOutcome::Aborted { case, reason } => Some(Error::CaseAborted {
                id: case.clone(),
                reason: reason.clone(),
            }),
        }
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Runs configured cases one at a time
pub struct Scheduler<L> {
    config: RunConfig,
    loader: L,
    client: ApiClient,
    events: EventListener,
    case_index: usize,
    current: Option<Box<dyn TestCase>>,
    tick_count: u64,
    phase: Phase,
    outcome: Option<RunOutcome>,
}

impl<L: CaseLoader> Scheduler<L> {
    pub fn new(config: RunConfig, loader: L, client: ApiClient, events: EventListener) -> Self {
        Self {
            config,
            loader,
            client,
            events,
            case_index: 0,
            current: None,
            tick_count: 0,
            phase: Phase::Starting,
            outcome: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the next case to start
    pub fn case_index(&self) -> usize {
        self.case_index
    }

    /// Ticks the current case has been pending since it started
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Name of the case in progress
    ///
    /// A case is released as soon as it completes, so this is `None`
    /// between cases and once the run has ended.
    pub fn current_case(&self) -> Option<&str> {
        self.current.as_deref().map(|case| case.name())
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Handle one clock tick
    ///
    /// Returns the outcome once the run has reached a terminal phase, and
    /// keeps returning it on later ticks. A case that cannot be loaded is
    /// returned as an error on the tick that tried to load it.
    pub fn tick(&mut self) -> Result<Option<RunOutcome>> {
        loop {
            match self.phase {
                Phase::Starting | Phase::Advancing => return self.start_next(),
                Phase::Running => {
                    let case = self.current.as_deref().ok_or_else(|| {
                        Error::Internal("scheduler running without a current case".to_string())
                    })?;

                    match case.status() {
                        CaseStatus::Completed => {
                            tracing::info!(
                                case = case.name(),
                                ticks = self.tick_count,
                                "Test case completed"
                            );
                            self.current = None;
                            self.phase = Phase::Advancing;
                        }
                        CaseStatus::Failed(reason) => {
                            let outcome = RunOutcome::Failed {
                                case: case.name().to_string(),
                                reason,
                            };
                            return Ok(Some(self.terminate(Phase::Failed, outcome)));
                        }
                        CaseStatus::Pending => {
                            self.tick_count += 1;
                            tracing::trace!(
                                case = case.name(),
                                ticks = self.tick_count,
                                "Test case pending"
                            );
                            if self.tick_count > self.config.timeout {
                                let outcome = RunOutcome::TimedOut {
                                    case: case.name().to_string(),
                                    ticks: self.tick_count,
                                };
                                return Ok(Some(self.terminate(Phase::TimedOut, outcome)));
                            }
                            return Ok(None);
                        }
                    }
                }
                Phase::Finished | Phase::TimedOut | Phase::Failed | Phase::Aborted => {
                    return Ok(self.outcome.clone());
                }
            }
        }
    }

    /// Drive the scheduler from a clock until the run ends
    ///
    /// The clock is stopped before returning.
    pub async fn run(&mut self, clock: &mut TickClock) -> Result<RunOutcome> {
        while let Some(tick) = clock.tick().await {
            tracing::trace!(tick, phase = ?self.phase, "Tick");
            match self.tick() {
                Ok(Some(outcome)) => {
                    clock.stop();
                    return Ok(outcome);
                }
                Ok(None) => {}
                Err(e) => {
                    clock.stop();
                    return Err(e);
                }
            }
        }
        Err(Error::ClockStopped)
    }

    fn start_next(&mut self) -> Result<Option<RunOutcome>> {
        let Some(id) = self.config.cases.get(self.case_index).cloned() else {
            let outcome = RunOutcome::Finished {
                cases: self.case_index,
            };
            return Ok(Some(self.terminate(Phase::Finished, outcome)));
        };

        let mut case = match self.loader.load(&id) {
            Ok(case) => case,
            Err(e) => {
                let outcome = RunOutcome::Aborted {
                    case: id,
                    reason: e.to_string(),
                };
                self.terminate(Phase::Aborted, outcome);
                return Err(e);
            }
        };
        self.case_index += 1;

        tracing::info!(
            case = case.name(),
            id = %id,
            index = self.case_index,
            total = self.config.cases.len(),
            "Starting test case"
        );
        case.run(&self.client, &self.events);

        self.current = Some(case);
        self.tick_count = 0;
        self.phase = Phase::Running;
        Ok(None)
    }

    fn terminate(&mut self, phase: Phase, outcome: RunOutcome) -> RunOutcome {
        tracing::debug!(?phase, ?outcome, "Run reached terminal state");
        self.phase = phase;
        self.current = None;
        self.outcome = Some(outcome.clone());
        outcome
    }
}
