//! Domain records read from the ticketing platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event listing with its screens (sessions) and ticket tiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketProject {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub venue_name: String,
    #[serde(default)]
    pub venue_address: String,
    /// Orders must repeat buyer names and phone numbers as top-level fields.
    #[serde(default)]
    pub require_phone_name: bool,
    /// Never empty.
    pub screens: Vec<Screen>,
}

impl TicketProject {
    /// One-line summary of the project for logs.
    pub fn summary(&self) -> String {
        let window = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => format!(
                "{} - {}",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            ),
            (Some(start), None) => start.format("%Y-%m-%d %H:%M").to_string(),
            _ => "unscheduled".to_string(),
        };
        format!(
            "{} ({}) at {} {}",
            self.name, window, self.venue_name, self.venue_address
        )
        .trim_end()
        .to_string()
    }
}

/// A session of the event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Screen {
    pub id: u64,
    pub name: String,
    pub skus: Vec<Sku>,
}

/// A purchasable ticket tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sku {
    pub id: u64,
    pub desc: String,
    /// Unit price in the platform's smallest currency unit.
    pub price: u64,
    /// Sale status as displayed by the platform.
    #[serde(default)]
    pub sale_flag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_start: Option<String>,
}

/// A saved real-name buyer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Buyer {
    pub id: u64,
    pub name: String,
    pub tel: String,
}

/// A saved shipping address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub id: u64,
    /// Recipient name.
    pub name: String,
    pub phone: String,
    pub addr: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn project(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> TicketProject {
        TicketProject {
            id: 1,
            name: "Summer Festival".to_string(),
            start_time: start,
            end_time: end,
            venue_name: "Expo Hall".to_string(),
            venue_address: "1 Harbour Road".to_string(),
            require_phone_name: false,
            screens: vec![],
        }
    }

    #[test]
    fn test_summary_with_window() {
        let start = Utc.with_ymd_and_hms(2025, 7, 20, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 7, 21, 18, 0, 0).unwrap();
        let summary = project(Some(start), Some(end)).summary();
        assert_eq!(
            summary,
            "Summer Festival (2025-07-20 10:00 - 2025-07-21 18:00) at Expo Hall 1 Harbour Road"
        );
    }

    #[test]
    fn test_summary_without_window() {
        let summary = project(None, None).summary();
        assert!(summary.contains("unscheduled"));
    }
}
