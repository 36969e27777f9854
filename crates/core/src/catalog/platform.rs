//! Show ticketing platform client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::captcha::CaptchaChallenge;
use crate::client::{ApiResponse, AuthenticatedClient, ClientError};
use crate::config::{PlatformConfig, SessionConfig};
use crate::order::SolvedOrder;

use super::schema::{decode_addresses, decode_buyers, decode_challenge, decode_project};
use super::types::{Address, Buyer, TicketProject};
use super::TicketPlatform;

const NO_QUERY: [(&str, &str); 0] = [];

/// Ticketing platform client for one session.
pub struct ShowPlatform {
    client: AuthenticatedClient,
    /// Session-less client for the passport captcha endpoint.
    passport: Client,
    config: PlatformConfig,
}

impl ShowPlatform {
    /// Create a platform client bound to `session`.
    pub fn new(session: &SessionConfig, config: PlatformConfig) -> Result<Self, ClientError> {
        let client = AuthenticatedClient::new(session, config.login_required_marker.clone())?;

        let passport = Client::builder()
            .timeout(Duration::from_millis(session.timeout_ms))
            .build()
            .map_err(|e| ClientError::Request(e.to_string()))?;

        Ok(Self {
            client,
            passport,
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl TicketPlatform for ShowPlatform {
    async fn get_ticket_info(&self, project_id: u64) -> Result<TicketProject, ClientError> {
        let url = self.url("/api/ticket/project/getV2");
        let id = project_id.to_string();
        let version = self.config.api_version.to_string();

        let response = self
            .client
            .get(
                &url,
                &[
                    ("version", version.as_str()),
                    ("id", id.as_str()),
                    ("project_id", id.as_str()),
                ],
            )
            .await?;

        decode_project(response.data)
    }

    async fn get_buyer_list(&self, project_id: u64) -> Result<Vec<Buyer>, ClientError> {
        // `is_default` is a bare flag parameter without a value.
        let url = format!(
            "{}?is_default&projectId={}",
            self.url("/api/ticket/buyer/list"),
            urlencoding::encode(&project_id.to_string())
        );

        let response = self.client.get(&url, &NO_QUERY).await?;
        decode_buyers(response.data)
    }

    async fn get_address_list(&self) -> Result<Vec<Address>, ClientError> {
        let url = self.url("/api/ticket/addr/list");
        let response = self.client.get(&url, &NO_QUERY).await?;
        decode_addresses(response.data)
    }

    async fn fetch_captcha_challenge(&self) -> Result<CaptchaChallenge, ClientError> {
        let url = format!(
            "{}/x/passport-login/captcha",
            self.config.passport_url.trim_end_matches('/')
        );

        let response = self
            .passport
            .get(&url)
            .query(&[("source", "main_web")])
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let status = response.status();
        debug!("GET {} -> {}", url, status);
        if status.as_u16() >= 400 {
            return Err(ClientError::Transport {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClientError::MalformedResponse(format!("captcha challenge: {}", e)))?;

        decode_challenge(body.get("data").cloned().unwrap_or_default())
    }

    async fn create_order(&self, order: &SolvedOrder) -> Result<ApiResponse, ClientError> {
        let url = self.url(&self.config.order_path);
        self.client.post_json(&url, order).await
    }
}
