//! HTTP client for the service under test

use reqwest::header::ACCEPT;
use reqwest::Url;
use serde_json::Value;

use crate::common::config::join_url;
use crate::common::Result;

use super::types::{ApiResponse, HttpMethod};

/// Client for the service's REST API
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ApiClient {
    /// Create a client for the given base URL
    pub fn new(endpoint: &Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("functest/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are made against
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Underlying HTTP client, shared with the event listener
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Full URL for a path below the endpoint
    pub fn url(&self, path: &str) -> String {
        join_url(&self.endpoint, path)
    }

    /// Send a request with an optional JSON body
    ///
    /// Non-2xx statuses are returned, not turned into errors; callers
    /// decide which status they expect.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let url = self.url(path);
        tracing::debug!(%method, %url, "API request");

        let mut request = self
            .http
            .request(method.into(), &url)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        tracing::debug!(%method, %url, status, "API response");
        Ok(ApiResponse { status, body })
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request(HttpMethod::Get, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.request(HttpMethod::Post, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(HttpMethod::Delete, path, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_paths() {
        let endpoint = Url::parse("http://127.0.0.1:5000/").unwrap();
        let client = ApiClient::new(&endpoint).unwrap();

        assert_eq!(client.endpoint(), "http://127.0.0.1:5000");
        assert_eq!(client.url("/resources"), "http://127.0.0.1:5000/resources");
        assert_eq!(client.url("resources"), "http://127.0.0.1:5000/resources");
    }
}
