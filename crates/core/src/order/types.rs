//! Order payload types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::catalog::Buyer;

/// Top-level payload field names produced by the builder.
///
/// Captcha solution fields must not reuse these names.
pub const RESERVED_FIELDS: &[&str] = &[
    "detail",
    "count",
    "screen_id",
    "project_id",
    "sku_id",
    "order_type",
    "pay_money",
    "buyer_info",
    "buyer",
    "tel",
    "deliver_info",
    "phone",
    "name",
];

/// Errors raised while building an order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    /// At least one buyer must be selected.
    #[error("no buyers selected")]
    NoBuyers,

    /// An index does not point into the fetched lists.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// `price * count` does not fit the payload's integer type.
    #[error("order total overflows")]
    PriceOverflow,
}

/// Indices chosen by the caller from the fetched project, buyers and addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSelection {
    pub screen_index: usize,
    pub sku_index: usize,
    /// Selection order is preserved in the payload.
    pub buyer_indices: Vec<usize>,
    pub address_index: usize,
}

impl Default for OrderSelection {
    fn default() -> Self {
        Self {
            screen_index: 0,
            sku_index: 0,
            buyer_indices: vec![0],
            address_index: 0,
        }
    }
}

/// Shipping block of the order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliverInfo {
    pub name: String,
    pub tel: String,
    pub addr_id: u64,
    pub addr: String,
}

/// Payload for projects that reference buyers only through `buyer_info`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardOrder {
    pub detail: String,
    pub count: u32,
    pub screen_id: u64,
    pub project_id: u64,
    pub sku_id: u64,
    pub order_type: u8,
    pub pay_money: u64,
    pub buyer_info: Vec<Buyer>,
    /// Buyer names joined with ", ".
    pub buyer: String,
    /// Buyer phone numbers joined with ", ".
    pub tel: String,
    pub deliver_info: DeliverInfo,
}

/// Payload for projects flagged `require_phone_name`: the joined names and
/// phone numbers are repeated as top-level `name` and `phone`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhoneNameOrder {
    #[serde(flatten)]
    pub order: StandardOrder,
    pub phone: String,
    pub name: String,
}

/// Order payload before the captcha solution is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OrderPayload {
    Standard(StandardOrder),
    PhoneName(PhoneNameOrder),
}

impl OrderPayload {
    /// Fields shared by both variants.
    pub fn order(&self) -> &StandardOrder {
        match self {
            OrderPayload::Standard(order) => order,
            OrderPayload::PhoneName(p) => &p.order,
        }
    }

    /// Merge the captcha fields, producing the submittable order.
    pub fn attach_captcha(self, captcha: Map<String, Value>) -> SolvedOrder {
        SolvedOrder {
            payload: self,
            captcha,
        }
    }
}

/// Complete order with captcha fields; submitted exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolvedOrder {
    #[serde(flatten)]
    payload: OrderPayload,
    #[serde(flatten)]
    captcha: Map<String, Value>,
}

impl SolvedOrder {
    pub fn payload(&self) -> &OrderPayload {
        &self.payload
    }

    pub fn captcha_fields(&self) -> &Map<String, Value> {
        &self.captcha
    }
}
