//! Mock ticketing platform for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Barrier, RwLock};

use crate::captcha::CaptchaChallenge;
use crate::catalog::{Address, Buyer, TicketPlatform, TicketProject};
use crate::client::{ApiResponse, ClientError};
use crate::order::SolvedOrder;

use super::fixtures;

/// Platform operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformOperation {
    GetTicketInfo,
    GetBuyerList,
    GetAddressList,
    FetchCaptchaChallenge,
    CreateOrder,
}

/// A recorded platform call for test assertions.
#[derive(Debug, Clone)]
pub enum RecordedPlatformCall {
    GetTicketInfo { project_id: u64 },
    GetBuyerList { project_id: u64 },
    GetAddressList,
    FetchCaptchaChallenge,
    CreateOrder { order: serde_json::Value },
}

/// Mock implementation of the TicketPlatform trait.
///
/// Provides controllable behavior for testing:
/// - Serve a configurable project, buyer list and address list
/// - Track calls (and submitted orders) for assertions
/// - Fail individual operations
/// - Require the buyer and address lookups to be in flight together
#[derive(Debug)]
pub struct MockPlatform {
    project: Arc<RwLock<Option<TicketProject>>>,
    buyers: Arc<RwLock<Vec<Buyer>>>,
    addresses: Arc<RwLock<Vec<Address>>>,
    challenge: Arc<RwLock<CaptchaChallenge>>,
    order_response: Arc<RwLock<ApiResponse>>,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedPlatformCall>>>,
    /// Pending failures, consumed by the next call of that operation.
    failures: Arc<RwLock<HashMap<PlatformOperation, ClientError>>>,
    /// If set, both list lookups wait here until the other one arrives.
    list_rendezvous: Arc<RwLock<Option<Arc<Barrier>>>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// Create a platform with no project, no saved lists and an accepting
    /// order endpoint.
    pub fn new() -> Self {
        Self {
            project: Arc::new(RwLock::new(None)),
            buyers: Arc::new(RwLock::new(Vec::new())),
            addresses: Arc::new(RwLock::new(Vec::new())),
            challenge: Arc::new(RwLock::new(fixtures::challenge())),
            order_response: Arc::new(RwLock::new(fixtures::order_accepted(1001))),
            calls: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            list_rendezvous: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Data Configuration
    // =========================================================================

    pub async fn set_project(&self, project: TicketProject) {
        *self.project.write().await = Some(project);
    }

    pub async fn set_buyers(&self, buyers: Vec<Buyer>) {
        *self.buyers.write().await = buyers;
    }

    pub async fn set_addresses(&self, addresses: Vec<Address>) {
        *self.addresses.write().await = addresses;
    }

    pub async fn set_challenge(&self, challenge: CaptchaChallenge) {
        *self.challenge.write().await = challenge;
    }

    /// Set the envelope returned by `create_order`.
    pub async fn set_order_response(&self, response: ApiResponse) {
        *self.order_response.write().await = response;
    }

    /// Make each list lookup block until the other one has started.
    ///
    /// A workflow that fetches them one after the other never completes.
    pub async fn require_concurrent_lists(&self) {
        *self.list_rendezvous.write().await = Some(Arc::new(Barrier::new(2)));
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedPlatformCall> {
        self.calls.read().await.clone()
    }

    /// Orders submitted through `create_order`, as sent.
    pub async fn submitted_orders(&self) -> Vec<serde_json::Value> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|call| match call {
                RecordedPlatformCall::CreateOrder { order } => Some(order.clone()),
                _ => None,
            })
            .collect()
    }

    /// Get the number of calls performed.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next call of `operation` to fail with the given error.
    pub async fn fail_next(&self, operation: PlatformOperation, error: ClientError) {
        self.failures.write().await.insert(operation, error);
    }

    /// Clear all pending failures.
    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    async fn take_error(&self, operation: PlatformOperation) -> Option<ClientError> {
        self.failures.write().await.remove(&operation)
    }

    async fn record(&self, call: RecordedPlatformCall) {
        self.calls.write().await.push(call);
    }

    async fn rendezvous(&self) {
        let barrier = self.list_rendezvous.read().await.clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
    }
}

#[async_trait]
impl TicketPlatform for MockPlatform {
    async fn get_ticket_info(&self, project_id: u64) -> Result<TicketProject, ClientError> {
        self.record(RecordedPlatformCall::GetTicketInfo { project_id })
            .await;
        if let Some(err) = self.take_error(PlatformOperation::GetTicketInfo).await {
            return Err(err);
        }

        self.project.read().await.clone().ok_or_else(|| {
            ClientError::MalformedResponse(format!("project {} has no data", project_id))
        })
    }

    async fn get_buyer_list(&self, project_id: u64) -> Result<Vec<Buyer>, ClientError> {
        self.record(RecordedPlatformCall::GetBuyerList { project_id })
            .await;
        self.rendezvous().await;
        if let Some(err) = self.take_error(PlatformOperation::GetBuyerList).await {
            return Err(err);
        }

        Ok(self.buyers.read().await.clone())
    }

    async fn get_address_list(&self) -> Result<Vec<Address>, ClientError> {
        self.record(RecordedPlatformCall::GetAddressList).await;
        self.rendezvous().await;
        if let Some(err) = self.take_error(PlatformOperation::GetAddressList).await {
            return Err(err);
        }

        Ok(self.addresses.read().await.clone())
    }

    async fn fetch_captcha_challenge(&self) -> Result<CaptchaChallenge, ClientError> {
        self.record(RecordedPlatformCall::FetchCaptchaChallenge)
            .await;
        if let Some(err) = self
            .take_error(PlatformOperation::FetchCaptchaChallenge)
            .await
        {
            return Err(err);
        }

        Ok(self.challenge.read().await.clone())
    }

    async fn create_order(&self, order: &SolvedOrder) -> Result<ApiResponse, ClientError> {
        let body = serde_json::to_value(order)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        self.record(RecordedPlatformCall::CreateOrder { order: body })
            .await;
        if let Some(err) = self.take_error(PlatformOperation::CreateOrder).await {
            return Err(err);
        }

        Ok(self.order_response.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_platform_serves_configured_data() {
        let platform = MockPlatform::new();
        platform.set_project(fixtures::project(7, 100, false)).await;
        platform
            .set_buyers(vec![fixtures::buyer(1, "A", "111")])
            .await;

        let project = platform.get_ticket_info(7).await.unwrap();
        assert_eq!(project.id, 7);
        assert_eq!(platform.get_buyer_list(7).await.unwrap().len(), 1);
        assert!(platform.get_address_list().await.unwrap().is_empty());
        assert_eq!(platform.call_count().await, 3);
    }

    #[tokio::test]
    async fn test_mock_platform_failure_is_consumed() {
        let platform = MockPlatform::new();
        platform
            .fail_next(PlatformOperation::GetAddressList, ClientError::Timeout)
            .await;

        let err = tokio_test::assert_err!(platform.get_address_list().await);
        assert!(matches!(err, ClientError::Timeout));
        tokio_test::assert_ok!(platform.get_address_list().await);
    }

    #[tokio::test]
    async fn test_mock_platform_missing_project() {
        let platform = MockPlatform::new();
        assert!(matches!(
            platform.get_ticket_info(1).await,
            Err(ClientError::MalformedResponse(_))
        ));
    }
}
