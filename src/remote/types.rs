//! Types exchanged with the service under test

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::json_contains;

/// Event name assumed for frames without an `event:` field
pub const DEFAULT_EVENT_NAME: &str = "message";

/// One event received from the service's event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The `event:` field of the frame, if present
    pub name: Option<String>,
    /// Frame data, parsed as JSON when possible, otherwise a JSON string
    pub data: Value,
}

impl Event {
    /// Effective event name
    pub fn kind(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_EVENT_NAME)
    }

    /// Check the event against an optional name and an optional data subset
    pub fn matches(&self, name: Option<&str>, contains: Option<&Value>) -> bool {
        if let Some(name) = name {
            if self.kind() != name {
                return false;
            }
        }
        contains.map(|c| json_contains(&self.data, c)).unwrap_or(true)
    }
}

/// Response to an API request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Body as JSON; non-JSON text becomes a string, an empty body `null`
    pub body: Value,
}

impl ApiResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP methods available to scenario requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", reqwest::Method::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_matches_name_and_data() {
        let event = Event {
            name: Some("update".to_string()),
            data: json!({"id": "1", "status": "ACTIVE"}),
        };

        assert!(event.matches(None, None));
        assert!(event.matches(Some("update"), Some(&json!({"status": "ACTIVE"}))));
        assert!(!event.matches(Some("create"), None));
        assert!(!event.matches(None, Some(&json!({"status": "ERROR"}))));
    }

    #[test]
    fn test_unnamed_event_is_message() {
        let event = Event {
            name: None,
            data: json!("ping"),
        };
        assert!(event.matches(Some("message"), None));
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Post.to_string(), "POST");
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
    }
}
