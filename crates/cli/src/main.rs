mod metrics;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use showgrab_core::{
    config::{LogFormat, LoggingConfig},
    load_config, validate_config, CaptchaSettings, FixedSelector, PurchaseOrchestrator,
    PurchaseOutcome, RecognitionClient, SanitizedConfig, ShowPlatform,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the order went through.
async fn run() -> Result<bool> {
    // Determine config path
    let config_path = std::env::var("SHOWGRAB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("showgrab.toml"));

    // Load configuration before logging so the format can be honoured
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    init_logging(&config.logging);
    info!("showgrab {} starting", VERSION);
    info!("Loaded configuration from {:?}", config_path);

    validate_config(&config).context("Configuration validation failed")?;
    info!(
        "Configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    let registry = metrics::init_registry().context("Failed to register metrics")?;

    let platform = Arc::new(
        ShowPlatform::new(&config.session, config.platform.clone())
            .context("Failed to create platform client")?,
    );
    let solver = Arc::new(
        RecognitionClient::new(&config.captcha).context("Failed to create captcha client")?,
    );
    let selector = Arc::new(FixedSelector::from(&config.purchase));

    let orchestrator = PurchaseOrchestrator::new(
        platform,
        solver,
        selector,
        CaptchaSettings::from(&config.captcha),
    );

    let outcome = orchestrator.run(config.purchase.project_id).await;
    let purchased = report(&outcome)?;

    if config.metrics.print_summary {
        eprintln!("{}", metrics::encode_metrics(&registry)?);
    }

    Ok(purchased)
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Print the outcome for the operator.
fn report(outcome: &PurchaseOutcome) -> Result<bool> {
    match outcome {
        PurchaseOutcome::Purchased(confirmation) => {
            let json = serde_json::to_string_pretty(confirmation)
                .context("Failed to serialize order confirmation")?;
            println!("{}", json);
            Ok(true)
        }
        PurchaseOutcome::Aborted(e) => {
            let kind = e.kind();
            eprintln!("purchase aborted [{}]: {}", kind.as_str(), e);
            eprintln!("hint: {}", kind.remedy());
            Ok(false)
        }
    }
}
