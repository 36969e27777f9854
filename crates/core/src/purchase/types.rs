//! Types for the purchase workflow.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::captcha::CaptchaError;
use crate::client::ClientError;
use crate::order::OrderError;

/// Errors that abort a purchase attempt.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// Platform call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Captcha solving failed.
    #[error(transparent)]
    Captcha(#[from] CaptchaError),

    /// Selection could not be turned into an order.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The platform rejected the submitted order.
    #[error("order rejected by platform (code {code}): {message}")]
    OrderCreationFailure { code: i64, message: String },
}

impl PurchaseError {
    /// Coarse classification that tells the operator what to do next.
    pub fn kind(&self) -> FailureKind {
        match self {
            PurchaseError::Client(ClientError::AuthenticationExpired)
            | PurchaseError::Client(ClientError::InvalidSession(_)) => FailureKind::Authentication,
            PurchaseError::Client(ClientError::MalformedResponse(_)) => {
                FailureKind::MalformedResponse
            }
            PurchaseError::Client(_) => FailureKind::Transport,
            PurchaseError::Captcha(_) => FailureKind::Captcha,
            PurchaseError::Order(_) => FailureKind::Selection,
            PurchaseError::OrderCreationFailure { .. } => FailureKind::OrderRejected,
        }
    }
}

/// Failure classes with distinct remedies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Authentication,
    Transport,
    MalformedResponse,
    Captcha,
    Selection,
    OrderRejected,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Authentication => "authentication",
            FailureKind::Transport => "transport",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::Captcha => "captcha",
            FailureKind::Selection => "selection",
            FailureKind::OrderRejected => "order_rejected",
        }
    }

    /// Operator hint for this failure.
    pub fn remedy(&self) -> &'static str {
        match self {
            FailureKind::Authentication => "log in again and replace the session cookie",
            FailureKind::Transport => "the platform is slow or unreachable, wait and run again",
            FailureKind::MalformedResponse => {
                "the platform changed its response format, check the project id"
            }
            FailureKind::Captcha => {
                "check the recognition service key and balance, then run again for a fresh challenge"
            }
            FailureKind::Selection => "fix the screen, ticket, buyer or address selection",
            FailureKind::OrderRejected => {
                "the platform refused the order; tickets may be sold out or the price changed"
            }
        }
    }
}

/// Accepted order as reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub project_id: u64,
    pub sku_id: u64,
    pub count: u32,
    pub pay_money: u64,
    /// Raw `data` of the order creation response.
    pub response: Value,
}

impl OrderConfirmation {
    /// Pull the order id out of the response data, whichever key it uses.
    pub(crate) fn extract_order_id(data: &Value) -> Option<String> {
        ["orderId", "order_id"]
            .iter()
            .filter_map(|key| data.get(*key))
            .find_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

/// Terminal state of one purchase run.
#[derive(Debug)]
pub enum PurchaseOutcome {
    Purchased(OrderConfirmation),
    Aborted(PurchaseError),
}

impl PurchaseOutcome {
    pub fn is_purchased(&self) -> bool {
        matches!(self, PurchaseOutcome::Purchased(_))
    }

    /// Result label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            PurchaseOutcome::Purchased(_) => "purchased",
            PurchaseOutcome::Aborted(e) => e.kind().as_str(),
        }
    }
}

impl From<Result<OrderConfirmation, PurchaseError>> for PurchaseOutcome {
    fn from(result: Result<OrderConfirmation, PurchaseError>) -> Self {
        match result {
            Ok(confirmation) => PurchaseOutcome::Purchased(confirmation),
            Err(e) => PurchaseOutcome::Aborted(e),
        }
    }
}
