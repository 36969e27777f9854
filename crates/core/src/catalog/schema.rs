//! Response schemas for the platform's read endpoints and their decode step.
//!
//! The platform is inconsistent about field names between API versions, so
//! alternates are kept as separate optional fields and resolved during
//! conversion instead of relying on serde aliases (which reject payloads that
//! carry both names).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::captcha::CaptchaChallenge;
use crate::client::ClientError;

use super::types::{Address, Buyer, Screen, Sku, TicketProject};

/// Decode the project lookup payload.
pub(crate) fn decode_project(data: Value) -> Result<TicketProject, ClientError> {
    let schema: ProjectSchema = decode("project", data)?;
    schema.try_into()
}

/// Decode the saved buyer list. Anything but an array is rejected before mapping.
pub(crate) fn decode_buyers(data: Value) -> Result<Vec<Buyer>, ClientError> {
    let items: Vec<BuyerSchema> = decode_list("buyer list", data)?;
    items.into_iter().map(Buyer::try_from).collect()
}

/// Decode the saved address list. Anything but an array is rejected before mapping.
pub(crate) fn decode_addresses(data: Value) -> Result<Vec<Address>, ClientError> {
    let items: Vec<AddressSchema> = decode_list("address list", data)?;
    items.into_iter().map(Address::try_from).collect()
}

/// Decode the captcha endpoint payload (`data.geetest`).
pub(crate) fn decode_challenge(data: Value) -> Result<CaptchaChallenge, ClientError> {
    let schema: ChallengeSchema = decode("captcha challenge", data)?;
    Ok(CaptchaChallenge {
        gt: schema.geetest.gt,
        challenge: schema.geetest.challenge,
    })
}

fn decode<T: DeserializeOwned>(what: &str, data: Value) -> Result<T, ClientError> {
    serde_json::from_value(data)
        .map_err(|e| ClientError::MalformedResponse(format!("{}: {}", what, e)))
}

fn decode_list<T: DeserializeOwned>(what: &str, data: Value) -> Result<Vec<T>, ClientError> {
    if !data.is_array() {
        return Err(ClientError::MalformedResponse(format!(
            "{} is not an array",
            what
        )));
    }
    decode(what, data)
}

/// Lists can arrive under either of two names; an empty one yields to the other.
fn first_non_empty<T>(primary: Option<Vec<T>>, alternate: Option<Vec<T>>) -> Vec<T> {
    primary
        .filter(|items| !items.is_empty())
        .or(alternate)
        .unwrap_or_default()
}

fn missing(field: &str) -> ClientError {
    ClientError::MalformedResponse(format!("missing field `{}`", field))
}

// ============================================================================
// Project
// ============================================================================

#[derive(Debug, Deserialize)]
struct ProjectSchema {
    id: Option<u64>,
    project_id: Option<u64>,
    name: Option<String>,
    project_name: Option<String>,
    start_time: Option<i64>,
    project_start_time: Option<i64>,
    end_time: Option<i64>,
    project_end_time: Option<i64>,
    venue_name: Option<String>,
    venue_address: Option<String>,
    venue_info: Option<VenueSchema>,
    #[serde(default)]
    require_phone_name: Option<FlagSchema>,
    screens: Option<Vec<ScreenSchema>>,
    screen_list: Option<Vec<ScreenSchema>>,
}

#[derive(Debug, Deserialize)]
struct VenueSchema {
    name: Option<String>,
    address_detail: Option<String>,
}

/// Boolean flags arrive either as JSON booleans or as 0/1.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlagSchema {
    Bool(bool),
    Int(i64),
}

impl FlagSchema {
    fn is_set(&self) -> bool {
        match self {
            FlagSchema::Bool(b) => *b,
            FlagSchema::Int(i) => *i != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScreenSchema {
    id: u64,
    #[serde(default)]
    name: String,
    tickets: Option<Vec<SkuSchema>>,
    ticket_list: Option<Vec<SkuSchema>>,
}

#[derive(Debug, Deserialize)]
struct SkuSchema {
    id: u64,
    #[serde(default)]
    desc: String,
    price: u64,
    sale_flag: Option<SaleFlagSchema>,
    sale_start: Option<TimeSchema>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SaleFlagSchema {
    Text(String),
    Detail { display_name: String },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimeSchema {
    Unix(i64),
    Text(String),
}

impl TimeSchema {
    fn display(self) -> String {
        match self {
            TimeSchema::Unix(secs) => unix_to_datetime(secs)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| secs.to_string()),
            TimeSchema::Text(text) => text,
        }
    }
}

fn unix_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}

impl TryFrom<ProjectSchema> for TicketProject {
    type Error = ClientError;

    fn try_from(s: ProjectSchema) -> Result<Self, Self::Error> {
        let id = s.id.or(s.project_id).ok_or_else(|| missing("id"))?;
        let name = s.name.or(s.project_name).ok_or_else(|| missing("name"))?;

        let (venue_name, venue_address) = match s.venue_info {
            Some(venue) => (
                s.venue_name.or(venue.name),
                s.venue_address.or(venue.address_detail),
            ),
            None => (s.venue_name, s.venue_address),
        };

        let screens: Vec<Screen> = first_non_empty(s.screens, s.screen_list)
            .into_iter()
            .map(Screen::from)
            .collect();
        if screens.is_empty() {
            return Err(ClientError::MalformedResponse(format!(
                "project {} has no screens",
                id
            )));
        }

        Ok(Self {
            id,
            name,
            start_time: s.start_time.or(s.project_start_time).and_then(unix_to_datetime),
            end_time: s.end_time.or(s.project_end_time).and_then(unix_to_datetime),
            venue_name: venue_name.unwrap_or_default(),
            venue_address: venue_address.unwrap_or_default(),
            require_phone_name: s.require_phone_name.is_some_and(|f| f.is_set()),
            screens,
        })
    }
}

impl From<ScreenSchema> for Screen {
    fn from(s: ScreenSchema) -> Self {
        Self {
            id: s.id,
            name: s.name,
            skus: first_non_empty(s.tickets, s.ticket_list)
                .into_iter()
                .map(Sku::from)
                .collect(),
        }
    }
}

impl From<SkuSchema> for Sku {
    fn from(s: SkuSchema) -> Self {
        Self {
            id: s.id,
            desc: s.desc,
            price: s.price,
            sale_flag: match s.sale_flag {
                Some(SaleFlagSchema::Text(text)) => text,
                Some(SaleFlagSchema::Detail { display_name }) => display_name,
                None => String::new(),
            },
            sale_start: s.sale_start.map(TimeSchema::display),
        }
    }
}

// ============================================================================
// Buyers and addresses
// ============================================================================

#[derive(Debug, Deserialize)]
struct BuyerSchema {
    id: u64,
    buyer_name: Option<String>,
    name: Option<String>,
    buyer_phone: Option<String>,
    tel: Option<String>,
}

impl TryFrom<BuyerSchema> for Buyer {
    type Error = ClientError;

    fn try_from(s: BuyerSchema) -> Result<Self, Self::Error> {
        Ok(Self {
            id: s.id,
            name: s.buyer_name.or(s.name).ok_or_else(|| missing("buyer_name"))?,
            tel: s.buyer_phone.or(s.tel).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct AddressSchema {
    id: u64,
    #[serde(default)]
    name: String,
    tel: Option<String>,
    phone: Option<String>,
    #[serde(default)]
    addr: String,
}

impl TryFrom<AddressSchema> for Address {
    type Error = ClientError;

    fn try_from(s: AddressSchema) -> Result<Self, Self::Error> {
        Ok(Self {
            id: s.id,
            name: s.name,
            phone: s.tel.or(s.phone).unwrap_or_default(),
            addr: s.addr,
        })
    }
}

// ============================================================================
// Captcha challenge
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChallengeSchema {
    geetest: GeetestSchema,
}

#[derive(Debug, Deserialize)]
struct GeetestSchema {
    gt: String,
    challenge: String,
}
