//! Purchase workflow settings.

use std::collections::BTreeMap;

use crate::captcha::SolutionMapping;
use crate::config::CaptchaConfig;

/// Captcha-related settings the orchestrator needs for the solve step.
#[derive(Debug, Clone)]
pub struct CaptchaSettings {
    /// Recognition service key.
    pub app_key: String,
    /// Referer reported to the recognition service.
    pub referer: String,
    /// Extension options forwarded verbatim to the solver.
    pub extra_options: BTreeMap<String, String>,
    /// Which solution fields go into the order.
    pub mapping: SolutionMapping,
}

impl CaptchaSettings {
    /// Settings with the default referer and third-generation field mapping.
    pub fn new(app_key: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            referer: "https://show.bilibili.com/".to_string(),
            extra_options: BTreeMap::new(),
            mapping: SolutionMapping::default(),
        }
    }
}

impl From<&CaptchaConfig> for CaptchaSettings {
    fn from(config: &CaptchaConfig) -> Self {
        Self {
            app_key: config.app_key.clone(),
            referer: config.referer.clone(),
            extra_options: config.extra_options.clone(),
            mapping: SolutionMapping::new(config.solution_fields.clone()),
        }
    }
}
