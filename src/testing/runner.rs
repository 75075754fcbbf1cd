//! Scenario case implementation
//!
//! Runs the steps of a YAML scenario against the API client and the event
//! listener in a background task, reporting the outcome through the case's
//! completion flag.

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::common::{json_contains, Error, Result};
use crate::remote::events::wait_for_event;
use crate::remote::{ApiClient, Event, EventListener, HttpMethod};

use super::case::{completion, CaseStatus, CompletionFlag, TestCase};
use super::config::{ResponseExpectation, TestScenario, TestStep};

/// A test case backed by a scenario file
pub struct ScenarioCase {
    id: String,
    scenario: Arc<TestScenario>,
    flag: Option<CompletionFlag>,
}

impl ScenarioCase {
    pub fn new(id: impl Into<String>, scenario: TestScenario) -> Self {
        Self {
            id: id.into(),
            scenario: Arc::new(scenario),
            flag: None,
        }
    }

    /// Identifier the case was loaded under
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn scenario(&self) -> &TestScenario {
        &self.scenario
    }
}

impl TestCase for ScenarioCase {
    fn name(&self) -> &str {
        &self.scenario.name
    }

    fn run(&mut self, client: &ApiClient, events: &EventListener) {
        let (completer, flag) = completion();
        self.flag = Some(flag);

        // Subscribe before any request goes out so no event is missed
        let mut rx = events.subscribe();
        let client = client.clone();
        let scenario = Arc::clone(&self.scenario);

        println!(
            "\n{} {}",
            "Running Test:".blue().bold(),
            scenario.name.white().bold()
        );
        if let Some(desc) = &scenario.description {
            println!("  {}", desc.dimmed());
        }

        tokio::spawn(async move {
            let result = run_steps(&scenario, &client, &mut rx).await;
            completer.finish(result);
        });
    }

    fn status(&self) -> CaseStatus {
        self.flag
            .as_ref()
            .map(CompletionFlag::status)
            .unwrap_or(CaseStatus::Pending)
    }
}

/// Execute the scenario's steps in order, stopping at the first failure
pub async fn run_steps(
    scenario: &TestScenario,
    client: &ApiClient,
    rx: &mut broadcast::Receiver<Event>,
) -> Result<()> {
    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;

        match execute_step(client, rx, step).await {
            Ok(()) => {
                println!(
                    "  {} Step {}: {}",
                    "✓".green(),
                    step_num,
                    step.describe().dimmed()
                );
            }
            Err(e) => {
                println!("  {} Step {}: {}", "✗".red(), step_num, e);
                return Err(Error::StepFailed {
                    step: step_num,
                    action: step.describe(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Execute a single test step
async fn execute_step(
    client: &ApiClient,
    rx: &mut broadcast::Receiver<Event>,
    step: &TestStep,
) -> Result<()> {
    match step {
        TestStep::Request {
            method,
            path,
            body,
            expect,
        } => execute_request_step(client, *method, path, body.as_ref(), expect.as_ref()).await,
        TestStep::AwaitEvent { event, contains } => {
            let received = wait_for_event(rx, event.as_deref(), contains.as_ref()).await?;
            tracing::debug!(name = received.kind(), "Awaited event arrived");
            Ok(())
        }
        TestStep::Sleep { millis } => {
            tokio::time::sleep(Duration::from_millis(*millis)).await;
            Ok(())
        }
    }
}

/// Execute a request step
async fn execute_request_step(
    client: &ApiClient,
    method: HttpMethod,
    path: &str,
    body: Option<&Value>,
    expect: Option<&ResponseExpectation>,
) -> Result<()> {
    let response = client.request(method, path, body).await?;

    match expect.and_then(|e| e.status) {
        Some(expected) if expected != response.status => {
            return Err(Error::UnexpectedStatus {
                method: method.to_string(),
                path: path.to_string(),
                expected,
                actual: response.status,
            });
        }
        None if !response.is_success() => {
            return Err(Error::TestAssertion(format!(
                "{} {}: expected a 2xx status, got {}",
                method, path, response.status
            )));
        }
        _ => {}
    }

    if let Some(expected_body) = expect.and_then(|e| e.body_contains.as_ref()) {
        if !json_contains(&response.body, expected_body) {
            return Err(Error::TestAssertion(format!(
                "{} {}: response body {} does not contain {}",
                method, path, response.body, expected_body
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;
    use serde_json::json;

    fn collaborators() -> (ApiClient, EventListener) {
        // Nothing listens here; only steps that avoid HTTP are exercised
        let endpoint = Url::parse("http://127.0.0.1:9").unwrap();
        let client = ApiClient::new(&endpoint).unwrap();
        let events = EventListener::new(endpoint.join("/events").unwrap());
        (client, events)
    }

    fn scenario(yaml: &str) -> TestScenario {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[tokio::test]
    async fn test_case_is_pending_before_run() {
        let case = ScenarioCase::new("1", scenario("name: idle\nsteps: []\n"));
        assert_eq!(case.id(), "1");
        assert_eq!(case.name(), "idle");
        assert_eq!(case.status(), CaseStatus::Pending);
    }

    #[tokio::test]
    async fn test_empty_scenario_completes() {
        let (client, events) = collaborators();
        let mut case = ScenarioCase::new("1", scenario("name: empty\nsteps: []\n"));

        case.run(&client, &events);
        tokio::task::yield_now().await;
        for _ in 0..10 {
            if !case.status().is_pending() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(case.status(), CaseStatus::Completed);
    }

    #[tokio::test]
    async fn test_await_event_step_completes_on_matching_event() {
        let (client, events) = collaborators();
        let mut case = ScenarioCase::new(
            "2",
            scenario(
                r#"
name: wait for update
steps:
  - action: await_event
    event: update
    contains: {status: ACTIVE}
"#,
            ),
        );

        case.run(&client, &events);
        events.publish(Event {
            name: Some("update".to_string()),
            data: json!({"status": "BUILD"}),
        });
        tokio::task::yield_now().await;
        assert!(case.status().is_pending());

        events.publish(Event {
            name: Some("update".to_string()),
            data: json!({"status": "ACTIVE"}),
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(case.status(), CaseStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_request_fails_case() {
        let (client, _events) = collaborators();
        let scenario = scenario(
            r#"
name: unreachable
steps:
  - action: request
    path: /resources
"#,
        );
        let (_tx, mut rx) = broadcast::channel(1);

        let err = run_steps(&scenario, &client, &mut rx).await.unwrap_err();
        assert!(matches!(err, Error::StepFailed { step: 1, .. }));
    }
}
