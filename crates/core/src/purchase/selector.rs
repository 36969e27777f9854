//! Selection of the ticket tier, buyers and address.
//!
//! Choosing what to buy is the caller's business (a prompt, a config file, a
//! UI). The workflow only asks a [`Selector`] once the lists are fetched.

use async_trait::async_trait;

use crate::catalog::{Address, Buyer, TicketProject};
use crate::config::PurchaseConfig;
use crate::order::{OrderError, OrderSelection};

/// Picks what to buy from the fetched project and saved lists.
#[async_trait]
pub trait Selector: Send + Sync {
    async fn select(
        &self,
        project: &TicketProject,
        buyers: &[Buyer],
        addresses: &[Address],
    ) -> Result<OrderSelection, OrderError>;
}

/// Selector that always returns the same indices.
///
/// The default selection is the first screen, first tier, first buyer and
/// first address. Bounds are checked by the order builder.
#[derive(Debug, Clone, Default)]
pub struct FixedSelector {
    selection: OrderSelection,
}

impl FixedSelector {
    pub fn new(selection: OrderSelection) -> Self {
        Self { selection }
    }
}

impl From<&PurchaseConfig> for FixedSelector {
    fn from(config: &PurchaseConfig) -> Self {
        Self::new(OrderSelection {
            screen_index: config.screen_index,
            sku_index: config.sku_index,
            buyer_indices: config.buyer_indices.clone(),
            address_index: config.address_index,
        })
    }
}

#[async_trait]
impl Selector for FixedSelector {
    async fn select(
        &self,
        _project: &TicketProject,
        _buyers: &[Buyer],
        _addresses: &[Address],
    ) -> Result<OrderSelection, OrderError> {
        Ok(self.selection.clone())
    }
}
