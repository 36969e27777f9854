//! Mock captcha solver for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::captcha::{CaptchaChallenge, CaptchaError, CaptchaRequest, CaptchaSolution, CaptchaSolver};

use super::fixtures;

/// Mock implementation of the CaptchaSolver trait.
///
/// Returns a configurable solution, records the challenges it was asked to
/// solve, and can be told to fail the next solve.
#[derive(Debug)]
pub struct MockCaptchaSolver {
    solution: Arc<RwLock<CaptchaSolution>>,
    /// Challenges seen, in order.
    challenges: Arc<RwLock<Vec<CaptchaChallenge>>>,
    /// If set, the next solve will fail with this error.
    next_error: Arc<RwLock<Option<CaptchaError>>>,
}

impl Default for MockCaptchaSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCaptchaSolver {
    /// Create a solver that answers with `fixtures::solution("mock-validate")`.
    pub fn new() -> Self {
        Self {
            solution: Arc::new(RwLock::new(fixtures::solution("mock-validate"))),
            challenges: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_solution(&self, solution: CaptchaSolution) {
        *self.solution.write().await = solution;
    }

    /// Configure the next solve to fail with the given error.
    pub async fn set_next_error(&self, error: CaptchaError) {
        *self.next_error.write().await = Some(error);
    }

    /// Challenges passed to `solve`.
    pub async fn solved_challenges(&self) -> Vec<CaptchaChallenge> {
        self.challenges.read().await.clone()
    }

    pub async fn solve_count(&self) -> usize {
        self.challenges.read().await.len()
    }
}

#[async_trait]
impl CaptchaSolver for MockCaptchaSolver {
    async fn solve(&self, request: &CaptchaRequest) -> Result<CaptchaSolution, CaptchaError> {
        self.challenges
            .write()
            .await
            .push(request.challenge.clone());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(self.solution.read().await.clone())
    }
}
