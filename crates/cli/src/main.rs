use std::process::ExitCode;

use recova_core::config::{EngineConfig, LoadOptions, LogFormat};

fn init_logging(config: &EngineConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

fn main() -> ExitCode {
    // Logging preferences come from the same config the commands load; an
    // invalid config falls back to defaults here and surfaces as a command
    // error with the specific validation failure.
    let logging_config = EngineConfig::load(LoadOptions::default()).unwrap_or_default();
    init_logging(&logging_config);

    tracing::info!(
        event_name = "system.cli.start",
        correlation_id = "cli",
        "recova CLI starting"
    );

    recova_cli::run()
}
