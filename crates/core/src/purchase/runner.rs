//! Purchase workflow.
//!
//! One run walks a fixed sequence:
//! project lookup -> buyers + addresses (concurrently) -> selection ->
//! payload -> captcha -> order submission.
//!
//! Any failure aborts the run; nothing is retried or resumed. Nothing is
//! written to the platform before the final submission, so aborting earlier
//! is always safe.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::captcha::{CaptchaRequest, CaptchaSolver};
use crate::catalog::TicketPlatform;
use crate::metrics::PURCHASE_ATTEMPTS;
use crate::order::build_order;

use super::config::CaptchaSettings;
use super::selector::Selector;
use super::types::{OrderConfirmation, PurchaseError, PurchaseOutcome};

/// Drives one purchase attempt against a platform.
pub struct PurchaseOrchestrator {
    platform: Arc<dyn TicketPlatform>,
    solver: Arc<dyn CaptchaSolver>,
    selector: Arc<dyn Selector>,
    captcha: CaptchaSettings,
}

impl PurchaseOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        platform: Arc<dyn TicketPlatform>,
        solver: Arc<dyn CaptchaSolver>,
        selector: Arc<dyn Selector>,
        captcha: CaptchaSettings,
    ) -> Self {
        Self {
            platform,
            solver,
            selector,
            captcha,
        }
    }

    /// Run the whole workflow once for `project_id`.
    pub async fn run(&self, project_id: u64) -> PurchaseOutcome {
        let attempt_id = Uuid::new_v4();
        let span = info_span!("purchase", %attempt_id, project_id);

        let outcome: PurchaseOutcome = self
            .attempt(project_id)
            .instrument(span.clone())
            .await
            .into();

        span.in_scope(|| match &outcome {
            PurchaseOutcome::Purchased(confirmation) => info!(
                "Order created: {}",
                confirmation.order_id.as_deref().unwrap_or("(no order id)")
            ),
            PurchaseOutcome::Aborted(e) => {
                warn!("Purchase aborted ({}): {}", e.kind().as_str(), e)
            }
        });
        PURCHASE_ATTEMPTS.with_label_values(&[outcome.label()]).inc();

        outcome
    }

    async fn attempt(&self, project_id: u64) -> Result<OrderConfirmation, PurchaseError> {
        let project = self.platform.get_ticket_info(project_id).await?;
        info!("Project {}: {}", project.id, project.summary());

        let (buyers, addresses) = futures::try_join!(
            self.platform.get_buyer_list(project.id),
            self.platform.get_address_list(),
        )?;
        debug!(
            "Fetched {} saved buyers and {} saved addresses",
            buyers.len(),
            addresses.len()
        );
        for (index, buyer) in buyers.iter().enumerate() {
            debug!("Buyer [{}] {} ({})", index, buyer.name, buyer.id);
        }
        for (index, address) in addresses.iter().enumerate() {
            debug!("Address [{}] {} {}", index, address.name, address.addr);
        }

        let selection = self.selector.select(&project, &buyers, &addresses).await?;
        let payload = build_order(&project, &selection, &buyers, &addresses)?;
        debug!(
            "Built order: sku {} x{} = {}",
            payload.order().sku_id,
            payload.order().count,
            payload.order().pay_money
        );

        let challenge = self.platform.fetch_captcha_challenge().await?;
        let solution = self
            .solver
            .solve(&CaptchaRequest {
                app_key: self.captcha.app_key.clone(),
                challenge,
                referer: self.captcha.referer.clone(),
                extra_options: self.captcha.extra_options.clone(),
            })
            .await?;
        let order = payload.attach_captcha(self.captcha.mapping.apply(&solution)?);

        let response = self.platform.create_order(&order).await?;
        if !response.is_success() {
            return Err(PurchaseError::OrderCreationFailure {
                code: response.code,
                message: response.message,
            });
        }

        let submitted = order.payload().order();
        Ok(OrderConfirmation {
            order_id: OrderConfirmation::extract_order_id(&response.data),
            project_id: submitted.project_id,
            sku_id: submitted.sku_id,
            count: submitted.count,
            pay_money: submitted.pay_money,
            response: response.data,
        })
    }
}
