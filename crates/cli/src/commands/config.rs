use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use recova_core::config::{EngineConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match EngineConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |dotted_key: &str, env_var: &str| {
        field_source(dotted_key, env_var, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "negotiation.max_settlement_pct",
        &config.negotiation.max_settlement_pct.to_string(),
        source("negotiation.max_settlement_pct", "RECOVA_MAX_SETTLEMENT_PCT"),
    ));
    lines.push(render_line(
        "negotiation.min_settlement_pct",
        &config.negotiation.min_settlement_pct.to_string(),
        source("negotiation.min_settlement_pct", "RECOVA_MIN_SETTLEMENT_PCT"),
    ));
    lines.push(render_line(
        "negotiation.settlement_step_pct",
        &config.negotiation.settlement_step_pct.to_string(),
        source("negotiation.settlement_step_pct", "RECOVA_SETTLEMENT_STEP_PCT"),
    ));
    lines.push(render_line(
        "negotiation.max_installment_months",
        &config.negotiation.max_installment_months.to_string(),
        source("negotiation.max_installment_months", "RECOVA_MAX_INSTALLMENT_MONTHS"),
    ));
    lines.push(render_line(
        "negotiation.min_payment",
        &config.negotiation.min_payment.to_string(),
        source("negotiation.min_payment", "RECOVA_MIN_PAYMENT"),
    ));

    lines.push(render_line(
        "compliance.contact_hours_start",
        &config.compliance.contact_hours_start.format("%H:%M").to_string(),
        source("compliance.contact_hours_start", "RECOVA_CONTACT_HOURS_START"),
    ));
    lines.push(render_line(
        "compliance.contact_hours_end",
        &config.compliance.contact_hours_end.format("%H:%M").to_string(),
        source("compliance.contact_hours_end", "RECOVA_CONTACT_HOURS_END"),
    ));
    lines.push(render_line(
        "compliance.max_daily_contacts",
        &config.compliance.max_daily_contacts.to_string(),
        source("compliance.max_daily_contacts", "RECOVA_MAX_DAILY_CONTACTS"),
    ));
    lines.push(render_line(
        "compliance.max_weekly_contacts",
        &config.compliance.max_weekly_contacts.to_string(),
        source("compliance.max_weekly_contacts", "RECOVA_MAX_WEEKLY_CONTACTS"),
    ));
    lines.push(render_line(
        "compliance.prohibited_phrases",
        &format!("{} patterns", config.compliance.prohibited_phrases.len()),
        source("compliance.prohibited_phrases", ""),
    ));

    lines.push(render_line(
        "escalation.confidence_threshold",
        &config.escalation.confidence_threshold.to_string(),
        source("escalation.confidence_threshold", "RECOVA_CONFIDENCE_THRESHOLD"),
    ));
    lines.push(render_line(
        "escalation.verification_attempt_limit",
        &config.escalation.verification_attempt_limit.to_string(),
        source("escalation.verification_attempt_limit", "RECOVA_VERIFICATION_ATTEMPT_LIMIT"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "RECOVA_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format).to_lowercase(),
        source("logging.format", "RECOVA_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("  {key} = {value}  [{source}]")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("recova.toml"), PathBuf::from("config/recova.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    dotted_key: &str,
    env_var: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if !env_var.is_empty() && env::var(env_var).map(|v| !v.trim().is_empty()).unwrap_or(false) {
        return format!("env:{env_var}");
    }

    if let (Some(doc), Some(path)) = (config_file_doc, config_file_path) {
        let mut node = Some(doc);
        for part in dotted_key.split('.') {
            node = node.and_then(|value| value.get(part));
        }
        if node.is_some() {
            return format!("file:{}", path.display());
        }
    }

    "default".to_string()
}
