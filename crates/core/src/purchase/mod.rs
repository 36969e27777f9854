//! Purchase workflow: the state machine tying the platform, the captcha
//! solver and the order builder together.

mod config;
mod runner;
mod selector;
mod types;

pub use config::CaptchaSettings;
pub use runner::PurchaseOrchestrator;
pub use selector::{FixedSelector, Selector};
pub use types::*;
