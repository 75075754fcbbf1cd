//! functest - sequential functional test runner
//!
//! This library provides the case scheduler, the case contract and loaders,
//! and the clients for the service under test.

pub mod cli;
pub mod commands;
pub mod common;
pub mod remote;
pub mod scheduler;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use scheduler::{Phase, RunOutcome, Scheduler, TickClock};
pub use testing::{CaseLoader, CaseStatus, TestCase};
