//! Testing utilities and mock implementations.
//!
//! This module provides mocks for the platform and captcha seams, so the
//! purchase workflow can be exercised end to end without the network.
//!
//! # Example
//!
//! ```rust,ignore
//! use showgrab_core::testing::{fixtures, MockCaptchaSolver, MockPlatform};
//!
//! let platform = MockPlatform::new();
//! platform.set_project(fixtures::project(7, 100, false)).await;
//! platform.set_buyers(vec![fixtures::buyer(1, "A", "111")]).await;
//! platform.set_addresses(vec![fixtures::address(9)]).await;
//!
//! let solver = MockCaptchaSolver::new();
//! // Hand both to a PurchaseOrchestrator...
//! ```

mod mock_captcha_solver;
mod mock_platform;

pub use mock_captcha_solver::MockCaptchaSolver;
pub use mock_platform::{MockPlatform, PlatformOperation, RecordedPlatformCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::captcha::{CaptchaChallenge, CaptchaSolution};
    use crate::catalog::{Address, Buyer, Screen, Sku, TicketProject};
    use crate::client::ApiResponse;

    /// Create a project with one screen holding one ticket tier at `price`.
    pub fn project(id: u64, price: u64, require_phone_name: bool) -> TicketProject {
        TicketProject {
            id,
            name: format!("Project {}", id),
            start_time: Utc.with_ymd_and_hms(2025, 7, 20, 10, 0, 0).single(),
            end_time: Utc.with_ymd_and_hms(2025, 7, 21, 18, 0, 0).single(),
            venue_name: "Expo Hall 1".to_string(),
            venue_address: "Harbour Road".to_string(),
            require_phone_name,
            screens: vec![screen(11, "Day 1", vec![sku(501, "Standard", price)])],
        }
    }

    /// Create a screen.
    pub fn screen(id: u64, name: &str, skus: Vec<Sku>) -> Screen {
        Screen {
            id,
            name: name.to_string(),
            skus,
        }
    }

    /// Create a ticket tier that is on sale.
    pub fn sku(id: u64, desc: &str, price: u64) -> Sku {
        Sku {
            id,
            desc: desc.to_string(),
            price,
            sale_flag: "On sale".to_string(),
            sale_start: Some("2025-06-01 12:00:00".to_string()),
        }
    }

    /// Create a saved buyer.
    pub fn buyer(id: u64, name: &str, tel: &str) -> Buyer {
        Buyer {
            id,
            name: name.to_string(),
            tel: tel.to_string(),
        }
    }

    /// Create a saved address.
    pub fn address(id: u64) -> Address {
        Address {
            id,
            name: format!("Recipient {}", id),
            phone: format!("1380000{:04}", id % 10_000),
            addr: format!("{} Main St", id),
        }
    }

    /// Create a captcha challenge.
    pub fn challenge() -> CaptchaChallenge {
        CaptchaChallenge {
            gt: "gt-0001".to_string(),
            challenge: "challenge-0001".to_string(),
        }
    }

    /// Create a third-generation captcha solution.
    pub fn solution(validate: &str) -> CaptchaSolution {
        let fields = json!({
            "challenge": "challenge-0001",
            "validate": validate,
            "seccode": format!("{}|jordan", validate),
        });
        match fields {
            serde_json::Value::Object(map) => CaptchaSolution(map),
            _ => CaptchaSolution::default(),
        }
    }

    /// Create an accepted order response.
    pub fn order_accepted(order_id: u64) -> ApiResponse {
        ApiResponse {
            code: 0,
            message: String::new(),
            data: json!({ "orderId": order_id }),
        }
    }

    /// Create a rejected order response.
    pub fn order_rejected(code: i64, message: &str) -> ApiResponse {
        ApiResponse {
            code,
            message: message.to_string(),
            data: serde_json::Value::Null,
        }
    }
}
