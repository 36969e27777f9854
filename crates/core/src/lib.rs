pub mod captcha;
pub mod catalog;
pub mod client;
pub mod config;
pub mod metrics;
pub mod order;
pub mod purchase;
pub mod testing;

pub use captcha::{
    CaptchaChallenge, CaptchaError, CaptchaRequest, CaptchaSolution, CaptchaSolver,
    RecognitionClient, SolutionMapping,
};
pub use catalog::{Address, Buyer, Screen, ShowPlatform, Sku, TicketPlatform, TicketProject};
pub use client::{ApiResponse, AuthenticatedClient, ClientError};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use order::{build_order, OrderError, OrderPayload, OrderSelection, SolvedOrder};
pub use purchase::{
    CaptchaSettings, FailureKind, FixedSelector, OrderConfirmation, PurchaseError,
    PurchaseOrchestrator, PurchaseOutcome, Selector,
};
