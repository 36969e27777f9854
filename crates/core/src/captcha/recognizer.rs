//! Client for the remote captcha recognition service.
//!
//! Solving is human- or model-assisted and routinely takes tens of seconds,
//! so this client runs with its own long timeout.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::CaptchaConfig;
use crate::metrics::{CAPTCHA_SOLVES, CAPTCHA_SOLVE_DURATION};

use super::{CaptchaError, CaptchaRequest, CaptchaSolution, CaptchaSolver};

/// Recognition service client.
pub struct RecognitionClient {
    client: Client,
    endpoint: String,
}

impl RecognitionClient {
    /// Create a new recognition client.
    pub fn new(config: &CaptchaConfig) -> Result<Self, CaptchaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CaptchaError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    async fn request_solution(
        &self,
        request: &CaptchaRequest,
    ) -> Result<CaptchaSolution, CaptchaError> {
        let form = form_fields(request);

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(CaptchaError::from_reqwest)?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(CaptchaError::Transport {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(CaptchaError::from_reqwest)?;
        let parsed: RecognizeResponse = serde_json::from_str(&body)
            .map_err(|e| CaptchaError::MalformedResponse(e.to_string()))?;

        if parsed.status != 0 {
            return Err(CaptchaError::SolveFailure {
                message: parsed.msg,
            });
        }

        info!("Captcha recognized for challenge {}", request.challenge.challenge);
        debug!("Captcha service response: {}", body);

        match parsed.data {
            Value::Object(fields) => Ok(CaptchaSolution(fields)),
            other => Err(CaptchaError::MalformedResponse(format!(
                "solution is not an object: {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl CaptchaSolver for RecognitionClient {
    async fn solve(&self, request: &CaptchaRequest) -> Result<CaptchaSolution, CaptchaError> {
        let started = Instant::now();
        let result = self.request_solution(request).await;

        let label = match &result {
            Ok(_) => "solved",
            Err(CaptchaError::SolveFailure { message }) => {
                warn!("Captcha service rejected the challenge: {}", message);
                "rejected"
            }
            Err(_) => "error",
        };
        CAPTCHA_SOLVES.with_label_values(&[label]).inc();
        CAPTCHA_SOLVE_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        result
    }
}

/// Form body: standard fields first, then extension options.
/// An extension option with a standard name replaces the standard value.
fn form_fields(request: &CaptchaRequest) -> Vec<(String, String)> {
    let mut fields = vec![
        ("appkey".to_string(), request.app_key.clone()),
        ("gt".to_string(), request.challenge.gt.clone()),
        ("challenge".to_string(), request.challenge.challenge.clone()),
        ("referer".to_string(), request.referer.clone()),
    ];

    for (key, value) in &request.extra_options {
        match fields.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.clone(),
            None => fields.push((key.clone(), value.clone())),
        }
    }

    fields
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    status: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captcha::CaptchaChallenge;
    use std::collections::BTreeMap;

    fn request(extra: &[(&str, &str)]) -> CaptchaRequest {
        CaptchaRequest {
            app_key: "key".to_string(),
            challenge: CaptchaChallenge {
                gt: "gt-1".to_string(),
                challenge: "ch-1".to_string(),
            },
            referer: "https://show.bilibili.com/".to_string(),
            extra_options: extra
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_form_fields_standard_order() {
        let fields = form_fields(&request(&[]));
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["appkey", "gt", "challenge", "referer"]);
        assert_eq!(fields[1].1, "gt-1");
    }

    #[test]
    fn test_form_fields_with_extensions() {
        let fields = form_fields(&request(&[("version", "4"), ("referer", "https://m.example/")]));
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[3], ("referer".to_string(), "https://m.example/".to_string()));
        assert_eq!(fields[4], ("version".to_string(), "4".to_string()));
    }

    #[test]
    fn test_recognize_response_defaults() {
        let parsed: RecognizeResponse =
            serde_json::from_str(r#"{"status":-1,"msg":"no balance"}"#).unwrap();
        assert_eq!(parsed.status, -1);
        assert_eq!(parsed.msg, "no balance");
        assert!(parsed.data.is_null());
    }
}
