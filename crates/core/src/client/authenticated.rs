//! HTTP client bound to a single platform session.

use std::time::{Duration, Instant};

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER, USER_AGENT,
};
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use tracing::debug;

use crate::config::SessionConfig;
use crate::metrics::{PLATFORM_REQUESTS, PLATFORM_REQUEST_DURATION};

use super::{ApiResponse, ClientError, RawEnvelope};

/// Platform client that sends every request with the same session.
///
/// The header set is fixed at construction: either every request carries the
/// session cookie or the client is never built.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    client: Client,
    login_required_marker: String,
}

impl AuthenticatedClient {
    /// Create a client for one session.
    pub fn new(
        session: &SessionConfig,
        login_required_marker: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let headers = session_headers(session)?;

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(session.timeout_ms))
            .build()
            .map_err(|e| ClientError::Request(e.to_string()))?;

        Ok(Self {
            client,
            login_required_marker: login_required_marker.into(),
        })
    }

    /// GET `url` with the given query parameters.
    pub async fn get<Q>(&self, url: &str, query: &Q) -> Result<ApiResponse, ClientError>
    where
        Q: Serialize + ?Sized,
    {
        self.execute("GET", url, self.client.get(url).query(query))
            .await
    }

    /// POST `body` to `url` as `application/x-www-form-urlencoded`.
    pub async fn post_form<B>(&self, url: &str, body: &B) -> Result<ApiResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.execute("POST", url, self.client.post(url).form(body))
            .await
    }

    /// POST `body` to `url` as JSON.
    pub async fn post_json<B>(&self, url: &str, body: &B) -> Result<ApiResponse, ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.execute("POST", url, self.client.post(url).json(body))
            .await
    }

    async fn execute(
        &self,
        method: &str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<ApiResponse, ClientError> {
        let endpoint = endpoint_label(url);
        let started = Instant::now();

        let result = self.send(method, url, request).await;

        PLATFORM_REQUEST_DURATION
            .with_label_values(&[endpoint.as_str()])
            .observe(started.elapsed().as_secs_f64());
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.metric_label(),
        };
        PLATFORM_REQUESTS
            .with_label_values(&[endpoint.as_str(), outcome])
            .inc();

        result
    }

    async fn send(
        &self,
        method: &str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<ApiResponse, ClientError> {
        let response = request.send().await.map_err(ClientError::from_reqwest)?;

        let status = response.status();
        debug!("{} {} -> {}", method, url, status);

        let body = response.text().await.map_err(ClientError::from_reqwest)?;
        let envelope = serde_json::from_str::<RawEnvelope>(&body);

        // The platform reports an expired session inside the body, usually with HTTP 200.
        if let Ok(raw) = &envelope {
            if self.is_login_required(raw) {
                return Err(ClientError::AuthenticationExpired);
            }
        }

        if status.as_u16() >= 400 {
            return Err(ClientError::Transport {
                status: status.as_u16(),
            });
        }

        let raw = envelope.map_err(|e| {
            ClientError::MalformedResponse(format!(
                "response from {} is not an envelope: {}",
                url, e
            ))
        })?;

        Ok(raw.into())
    }

    fn is_login_required(&self, raw: &RawEnvelope) -> bool {
        !self.login_required_marker.is_empty() && raw.message() == self.login_required_marker
    }
}

/// Build the fixed header set for a session.
fn session_headers(session: &SessionConfig) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    insert_header(&mut headers, ACCEPT_LANGUAGE, &session.accept_language)?;
    insert_header(&mut headers, REFERER, &session.referer)?;
    insert_header(&mut headers, USER_AGENT, &session.user_agent)?;

    let mut cookie = HeaderValue::from_str(session.token.trim()).map_err(|_| {
        ClientError::InvalidSession("session token is not a valid header value".to_string())
    })?;
    cookie.set_sensitive(true);
    headers.insert(COOKIE, cookie);

    Ok(headers)
}

fn insert_header(
    headers: &mut HeaderMap,
    name: HeaderName,
    value: &str,
) -> Result<(), ClientError> {
    let header_value = HeaderValue::from_str(value)
        .map_err(|_| ClientError::InvalidSession(format!("invalid {} header", name)))?;
    headers.insert(name, header_value);
    Ok(())
}

/// Metric label for a request URL (its path).
fn endpoint_label(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
