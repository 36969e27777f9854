use super::{types::Config, ConfigError};
use crate::order::RESERVED_FIELDS;

/// Validate configuration
/// Currently validates:
/// - Session token, project id and captcha key are present
/// - Timeouts are not 0
/// - At least one buyer is selected
/// - Captcha solution fields do not overwrite order fields
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.session.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "session.token must not be empty".to_string(),
        ));
    }
    if config.session.timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "session.timeout_ms cannot be 0".to_string(),
        ));
    }

    if config.captcha.app_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "captcha.app_key must not be empty".to_string(),
        ));
    }
    if config.captcha.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "captcha.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.captcha.solution_fields.is_empty() {
        return Err(ConfigError::ValidationError(
            "captcha.solution_fields must map at least one field".to_string(),
        ));
    }
    if let Some(target) = config
        .captcha
        .solution_fields
        .values()
        .find(|target| RESERVED_FIELDS.contains(&target.as_str()))
    {
        return Err(ConfigError::ValidationError(format!(
            "captcha.solution_fields cannot target order field '{}'",
            target
        )));
    }

    if config.purchase.project_id == 0 {
        return Err(ConfigError::ValidationError(
            "purchase.project_id cannot be 0".to_string(),
        ));
    }
    if config.purchase.buyer_indices.is_empty() {
        return Err(ConfigError::ValidationError(
            "purchase.buyer_indices must select at least one buyer".to_string(),
        ));
    }

    Ok(())
}
