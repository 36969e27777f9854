//! Captcha solving through a remote recognition service.
//!
//! The platform protects order creation with a challenge issued by its
//! passport endpoint. A [`CaptchaSolver`] turns that challenge into a
//! solution, and a [`SolutionMapping`] decides which solution fields end up in
//! the order payload (the field set differs between challenge generations).

mod recognizer;

pub use recognizer::RecognitionClient;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::order::RESERVED_FIELDS;

/// Errors that can occur while solving a captcha.
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// The recognition service answered with a non-zero status.
    #[error("captcha recognition failed: {message}")]
    SolveFailure { message: String },

    /// The recognition service answered with an HTTP error status.
    #[error("captcha service returned HTTP {status}")]
    Transport { status: u16 },

    #[error("captcha service timed out")]
    Timeout,

    #[error("captcha request failed: {0}")]
    Request(String),

    #[error("malformed captcha response: {0}")]
    MalformedResponse(String),

    /// A configured solution field is absent from the solver's answer.
    #[error("captcha solution has no `{0}` field")]
    MissingSolutionField(String),

    /// The mapping would overwrite a field the order builder already set.
    #[error("captcha solution cannot be written to order field `{0}`")]
    ReservedField(String),
}

impl CaptchaError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CaptchaError::Timeout
        } else {
            CaptchaError::Request(e.to_string())
        }
    }
}

/// Challenge parameters issued by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaChallenge {
    pub gt: String,
    pub challenge: String,
}

/// Everything the recognition service needs for one solve.
#[derive(Debug, Clone)]
pub struct CaptchaRequest {
    pub app_key: String,
    pub challenge: CaptchaChallenge,
    pub referer: String,
    /// Scheme-specific extension fields, sent after the standard ones.
    pub extra_options: BTreeMap<String, String>,
}

/// Opaque solution returned by the recognition service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptchaSolution(pub Map<String, Value>);

impl CaptchaSolution {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

/// Trait for captcha solvers.
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// Solve a challenge. No retry is attempted.
    async fn solve(&self, request: &CaptchaRequest) -> Result<CaptchaSolution, CaptchaError>;
}

/// Which solution fields are copied into the order payload, and under what name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionMapping {
    fields: BTreeMap<String, String>,
}

impl SolutionMapping {
    /// `fields` maps solver field -> payload field.
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    /// Build the payload fields for a solution.
    ///
    /// Fails without reading the solution if any target is an order field.
    pub fn apply(&self, solution: &CaptchaSolution) -> Result<Map<String, Value>, CaptchaError> {
        if let Some(target) = self
            .fields
            .values()
            .find(|target| RESERVED_FIELDS.contains(&target.as_str()))
        {
            return Err(CaptchaError::ReservedField(target.clone()));
        }

        self.fields
            .iter()
            .map(|(source, target)| {
                solution
                    .get(source)
                    .cloned()
                    .map(|value| (target.clone(), value))
                    .ok_or_else(|| CaptchaError::MissingSolutionField(source.clone()))
            })
            .collect()
    }
}

impl Default for SolutionMapping {
    /// Third-generation challenges: only `validate` is forwarded.
    fn default() -> Self {
        Self::new(crate::config::default_solution_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn solution(value: Value) -> CaptchaSolution {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_default_mapping_forwards_validate() {
        let s = solution(json!({ "challenge": "c", "validate": "v123", "seccode": "v123|jordan" }));
        let fields = SolutionMapping::default().apply(&s).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["validate"], "v123");
    }

    #[test]
    fn test_mapping_renames_fields() {
        let mapping = SolutionMapping::new(BTreeMap::from([
            ("lot_number".to_string(), "lot_number".to_string()),
            ("pass_token".to_string(), "token".to_string()),
        ]));
        let s = solution(json!({ "lot_number": "L1", "pass_token": "P1", "gen_time": "1" }));

        let fields = mapping.apply(&s).unwrap();
        assert_eq!(fields["lot_number"], "L1");
        assert_eq!(fields["token"], "P1");
        assert!(!fields.contains_key("gen_time"));
    }

    #[test]
    fn test_mapping_rejects_order_field_target() {
        let s = solution(json!({ "validate": "v123" }));
        let mapping = SolutionMapping::new(BTreeMap::from([(
            "validate".to_string(),
            "pay_money".to_string(),
        )]));
        assert!(matches!(
            mapping.apply(&s),
            Err(CaptchaError::ReservedField(ref f)) if f == "pay_money"
        ));
    }

    #[test]
    fn test_mapping_missing_field_fails() {
        let s = solution(json!({ "lot_number": "L1" }));
        let result = SolutionMapping::default().apply(&s);
        assert!(matches!(
            result,
            Err(CaptchaError::MissingSolutionField(ref f)) if f == "validate"
        ));
    }
}
