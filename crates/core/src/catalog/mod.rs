//! Ticketing platform queries.
//!
//! [`TicketPlatform`] is the seam between the purchase workflow and the remote
//! platform: read-only catalog lookups, the unauthenticated captcha challenge,
//! and the final order submission. [`ShowPlatform`] implements it over
//! [`AuthenticatedClient`](crate::client::AuthenticatedClient).

mod platform;
mod schema;
mod types;

pub use platform::ShowPlatform;
pub use types::*;

use async_trait::async_trait;

use crate::captcha::CaptchaChallenge;
use crate::client::{ApiResponse, ClientError};
use crate::order::SolvedOrder;

/// Trait for ticketing platform backends.
///
/// No method caches; every call hits the backend.
#[async_trait]
pub trait TicketPlatform: Send + Sync {
    /// Look up a project with its screens and ticket tiers.
    async fn get_ticket_info(&self, project_id: u64) -> Result<TicketProject, ClientError>;

    /// Saved real-name buyers usable for this project.
    async fn get_buyer_list(&self, project_id: u64) -> Result<Vec<Buyer>, ClientError>;

    /// Saved shipping addresses.
    async fn get_address_list(&self) -> Result<Vec<Address>, ClientError>;

    /// Fetch a fresh captcha challenge. Sent without the session.
    async fn fetch_captcha_challenge(&self) -> Result<CaptchaChallenge, ClientError>;

    /// Submit an order. The returned envelope carries the platform's verdict.
    async fn create_order(&self, order: &SolvedOrder) -> Result<ApiResponse, ClientError>;
}
