use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub session: SessionConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    pub captcha: CaptchaConfig,
    pub purchase: PurchaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Session credential and the fixed header set sent with every platform call
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Raw cookie string copied from a logged-in browser session
    pub token: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    /// Per-request timeout in milliseconds (default: 1000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl SessionConfig {
    /// Session config with default headers around the given token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_agent: default_user_agent(),
            referer: default_referer(),
            accept_language: default_accept_language(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0"
        .to_string()
}

fn default_referer() -> String {
    "https://show.bilibili.com/".to_string()
}

fn default_accept_language() -> String {
    "zh-CN,zh;q=0.9,en;q=0.8,en-GB;q=0.7,en-US;q=0.6".to_string()
}

fn default_timeout_ms() -> u64 {
    1000
}

/// Ticketing platform endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Host serving the unauthenticated captcha challenge
    #[serde(default = "default_passport_url")]
    pub passport_url: String,
    /// `version` query parameter of the project lookup
    #[serde(default = "default_api_version")]
    pub api_version: u32,
    #[serde(default = "default_order_path")]
    pub order_path: String,
    /// Message the platform embeds in a 200 response when the session is gone
    #[serde(default = "default_login_required_marker")]
    pub login_required_marker: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            passport_url: default_passport_url(),
            api_version: default_api_version(),
            order_path: default_order_path(),
            login_required_marker: default_login_required_marker(),
        }
    }
}

fn default_base_url() -> String {
    "https://show.bilibili.com".to_string()
}

fn default_passport_url() -> String {
    "https://passport.bilibili.com".to_string()
}

fn default_api_version() -> u32 {
    134
}

fn default_order_path() -> String {
    "/api/order/create".to_string()
}

fn default_login_required_marker() -> String {
    "请先登录".to_string()
}

/// Captcha recognition service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptchaConfig {
    /// Recognition service API key
    pub app_key: String,
    #[serde(default = "default_captcha_endpoint")]
    pub endpoint: String,
    /// Referer reported to the recognition service
    #[serde(default = "default_referer")]
    pub referer: String,
    /// Request timeout in seconds (default: 60)
    #[serde(default = "default_captcha_timeout")]
    pub timeout_secs: u64,
    /// Scheme-specific fields forwarded verbatim to the solver
    #[serde(default)]
    pub extra_options: BTreeMap<String, String>,
    /// Solver response field -> order payload field
    #[serde(default = "default_solution_fields")]
    pub solution_fields: BTreeMap<String, String>,
}

fn default_captcha_endpoint() -> String {
    "http://api.rrocr.com/api/recognize.html".to_string()
}

fn default_captcha_timeout() -> u64 {
    60
}

pub(crate) fn default_solution_fields() -> BTreeMap<String, String> {
    BTreeMap::from([("validate".to_string(), "validate".to_string())])
}

/// What to buy and for whom
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PurchaseConfig {
    pub project_id: u64,
    #[serde(default)]
    pub screen_index: usize,
    #[serde(default)]
    pub sku_index: usize,
    #[serde(default = "default_buyer_indices")]
    pub buyer_indices: Vec<usize>,
    #[serde(default)]
    pub address_index: usize,
}

fn default_buyer_indices() -> Vec<usize> {
    vec![0]
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Write the Prometheus text exposition to stderr on exit
    #[serde(default)]
    pub print_summary: bool,
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub session: SanitizedSessionConfig,
    pub platform: PlatformConfig,
    pub captcha: SanitizedCaptchaConfig,
    pub purchase: PurchaseConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSessionConfig {
    pub token_configured: bool,
    pub referer: String,
    pub timeout_ms: u64,
}

/// Sanitized captcha config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCaptchaConfig {
    pub endpoint: String,
    pub app_key_configured: bool,
    pub timeout_secs: u64,
    pub extra_options: Vec<String>,
    pub solution_fields: BTreeMap<String, String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            session: SanitizedSessionConfig {
                token_configured: !config.session.token.trim().is_empty(),
                referer: config.session.referer.clone(),
                timeout_ms: config.session.timeout_ms,
            },
            platform: config.platform.clone(),
            captcha: SanitizedCaptchaConfig {
                endpoint: config.captcha.endpoint.clone(),
                app_key_configured: !config.captcha.app_key.is_empty(),
                timeout_secs: config.captcha.timeout_secs,
                extra_options: config.captcha.extra_options.keys().cloned().collect(),
                solution_fields: config.captcha.solution_fields.clone(),
            },
            purchase: config.purchase.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[session]
token = "SESSDATA=abc"

[captcha]
app_key = "key-123"

[purchase]
project_id = 85939
"#;

    #[test]
    fn test_deserialize_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.session.token, "SESSDATA=abc");
        assert_eq!(config.session.timeout_ms, 1000);
        assert_eq!(config.platform.base_url, "https://show.bilibili.com");
        assert_eq!(config.platform.login_required_marker, "请先登录");
        assert_eq!(config.captcha.timeout_secs, 60);
        assert_eq!(
            config.captcha.solution_fields.get("validate").map(String::as_str),
            Some("validate")
        );
        assert_eq!(config.purchase.project_id, 85939);
        assert_eq!(config.purchase.buyer_indices, vec![0]);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(!config.metrics.print_summary);
    }

    #[test]
    fn test_deserialize_missing_session_fails() {
        let toml = r#"
[captcha]
app_key = "key"

[purchase]
project_id = 1
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_fourth_generation_captcha_mapping() {
        let toml = r#"
[session]
token = "SESSDATA=abc"

[captcha]
app_key = "key"
extra_options = { geetest_version = "4" }

[captcha.solution_fields]
lot_number = "lot_number"
pass_token = "pass_token"

[purchase]
project_id = 1
buyer_indices = [1, 0]

[logging]
format = "json"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.captcha.solution_fields.len(), 2);
        assert!(!config.captcha.solution_fields.contains_key("validate"));
        assert_eq!(
            config.captcha.extra_options.get("geetest_version").map(String::as_str),
            Some("4")
        );
        assert_eq!(config.purchase.buyer_indices, vec![1, 0]);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.session.token_configured);
        assert!(sanitized.captcha.app_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("SESSDATA"));
        assert!(!json.contains("key-123"));
    }
}
