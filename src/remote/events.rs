//! Listener for the service's server-sent event stream
//!
//! A single background task reads the stream and fans events out to every
//! subscriber through a broadcast channel. Cases subscribe before issuing
//! the request whose effects they want to observe, and [`EventListener::connect`]
//! only returns once the service has accepted the stream, so nothing is
//! missed.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::common::{Error, Result};

use super::codec::SseDecoder;
use super::types::Event;

/// Events buffered per subscriber before it starts lagging
const CHANNEL_CAPACITY: usize = 1024;

/// Handle to the event stream, cheap to clone
#[derive(Debug, Clone)]
pub struct EventListener {
    url: Url,
    tx: broadcast::Sender<Event>,
}

impl EventListener {
    /// Create a listener for the given stream URL
    ///
    /// Nothing is read until [`EventListener::connect`] is called.
    pub fn new(url: Url) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { url, tx }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Receive every event published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Spawn the task reading the stream and wait until it is connected
    ///
    /// Returns once the service has answered the stream request, the
    /// request has failed, or `ready_timeout` has passed. A failed or closed
    /// stream is logged; cases waiting on events will then run into their
    /// timeout.
    pub async fn connect(&self, http: reqwest::Client, ready_timeout: Duration) -> JoinHandle<()> {
        let listener = self.clone();
        let (ready_tx, ready_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            match listener.stream_events(&http, ready_tx).await {
                Ok(count) => {
                    tracing::debug!(url = %listener.url, count, "Event stream closed")
                }
                Err(e) => tracing::warn!(url = %listener.url, "Event stream unavailable: {}", e),
            }
        });

        match tokio::time::timeout(ready_timeout, ready_rx).await {
            Ok(Ok(())) => {}
            // Reader gave up before connecting and has logged why
            Ok(Err(_)) => {}
            Err(_) => tracing::warn!(
                url = %self.url,
                timeout_ms = ready_timeout.as_millis() as u64,
                "Event stream not connected yet, continuing without it"
            ),
        }
        task
    }

    async fn stream_events(
        &self,
        http: &reqwest::Client,
        ready: oneshot::Sender<()>,
    ) -> Result<usize> {
        let response = http
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::UnexpectedStatus {
                method: "GET".to_string(),
                path: self.url.to_string(),
                expected: 200,
                actual: response.status().as_u16(),
            });
        }
        tracing::debug!(url = %self.url, "Event stream connected");
        let _ = ready.send(());

        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();
        let mut count = 0;

        while let Some(chunk) = stream.next().await {
            for event in decoder.feed(&chunk?) {
                tracing::trace!(name = event.kind(), "Event received");
                self.publish(event);
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Wait for the first event matching a name and a data subset
pub async fn wait_for_event(
    rx: &mut broadcast::Receiver<Event>,
    name: Option<&str>,
    contains: Option<&Value>,
) -> Result<Event> {
    loop {
        match rx.recv().await {
            Ok(event) if event.matches(name, contains) => return Ok(event),
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event subscriber lagged, events were dropped");
            }
            Err(RecvError::Closed) => {
                return Err(Error::EventStreamClosed(describe(name, contains)));
            }
        }
    }
}

fn describe(name: Option<&str>, contains: Option<&Value>) -> String {
    match (name, contains) {
        (Some(name), Some(data)) => format!("event '{}' containing {}", name, data),
        (Some(name), None) => format!("event '{}'", name),
        (None, Some(data)) => format!("event containing {}", data),
        (None, None) => "any event".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listener() -> EventListener {
        EventListener::new(Url::parse("http://127.0.0.1:5000/events").unwrap())
    }

    #[tokio::test]
    async fn test_wait_skips_non_matching_events() {
        let listener = listener();
        let mut rx = listener.subscribe();

        listener.publish(Event {
            name: Some("create".to_string()),
            data: json!({"id": "1"}),
        });
        listener.publish(Event {
            name: Some("update".to_string()),
            data: json!({"id": "1", "status": "BUILD"}),
        });
        listener.publish(Event {
            name: Some("update".to_string()),
            data: json!({"id": "1", "status": "ACTIVE"}),
        });

        let event = wait_for_event(&mut rx, Some("update"), Some(&json!({"status": "ACTIVE"})))
            .await
            .unwrap();
        assert_eq!(event.data["status"], "ACTIVE");
    }

    #[tokio::test]
    async fn test_wait_fails_when_listener_dropped() {
        let listener = listener();
        let mut rx = listener.subscribe();
        drop(listener);

        let err = wait_for_event(&mut rx, Some("update"), None).await.unwrap_err();
        assert!(matches!(err, Error::EventStreamClosed(_)));
    }

    #[tokio::test]
    async fn test_connect_returns_when_stream_refused() {
        let socket = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        drop(socket);

        let listener =
            EventListener::new(Url::parse(&format!("http://{}/events", addr)).unwrap());
        let start = std::time::Instant::now();
        let task = listener
            .connect(reqwest::Client::new(), Duration::from_secs(30))
            .await;

        assert!(start.elapsed() < Duration::from_secs(10));
        task.await.unwrap();
    }

    #[test]
    fn test_publish_without_subscribers() {
        assert_eq!(
            listener().publish(Event {
                name: None,
                data: Value::Null
            }),
            0
        );
    }
}
