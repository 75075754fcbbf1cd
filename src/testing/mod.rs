//! Test cases and their loading
//!
//! Cases are resolved from identifiers by a [`CaseLoader`], started once
//! and polled by the scheduler. Scenario files describe cases as a list of
//! API requests and awaited events so assertions are made against
//! structured responses rather than console output.

pub mod case;
mod config;
pub mod loader;
mod runner;

pub use case::{completion, CaseStatus, Completer, CompletionFlag, TestCase};
pub use config::*;
pub use loader::{CaseLoader, Registry, ScenarioLoader};
pub use runner::{run_steps, ScenarioCase};
