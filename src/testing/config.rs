//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML scenario files.

use serde::Deserialize;
use serde_json::Value;

use crate::remote::HttpMethod;

/// A complete test scenario loaded from a YAML file
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TestScenario {
    /// Name of the test scenario
    pub name: String,
    /// Optional description of what the test verifies
    pub description: Option<String>,
    /// The sequence of test steps to execute
    pub steps: Vec<TestStep>,
}

/// A single test step in the execution flow
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Call the service's API
    Request {
        /// HTTP method (default: GET)
        #[serde(default)]
        method: HttpMethod,
        /// Path below the endpoint (e.g., "/resources/flavors")
        path: String,
        /// Optional JSON body
        body: Option<Value>,
        /// Optional expectations for the response
        expect: Option<ResponseExpectation>,
    },
    /// Wait for an event on the event stream
    AwaitEvent {
        /// Expected event name
        event: Option<String>,
        /// JSON subset the event data must contain
        contains: Option<Value>,
    },
    /// Pause before the next step
    Sleep {
        /// Pause duration in milliseconds
        millis: u64,
    },
}

impl TestStep {
    /// Short description for progress output
    pub fn describe(&self) -> String {
        match self {
            TestStep::Request { method, path, .. } => format!("{} {}", method, path),
            TestStep::AwaitEvent { event, .. } => match event {
                Some(name) => format!("await event '{}'", name),
                None => "await event".to_string(),
            },
            TestStep::Sleep { millis } => format!("sleep {}ms", millis),
        }
    }
}

/// Expectations for a request's response
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ResponseExpectation {
    /// Expected HTTP status (default: any 2xx)
    pub status: Option<u16>,
    /// JSON subset the response body must contain
    pub body_contains: Option<Value>,
}
