use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Immutable engine configuration. Loaded once by the caller and injected
/// into the guard/policy/arbiter constructors; nothing in the engine reads
/// the environment after load.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub negotiation: NegotiationConfig,
    pub compliance: ComplianceConfig,
    pub escalation: EscalationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NegotiationConfig {
    pub max_settlement_pct: Decimal,
    pub min_settlement_pct: Decimal,
    pub settlement_step_pct: Decimal,
    pub max_installment_months: u32,
    pub min_payment: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComplianceConfig {
    pub contact_hours_start: NaiveTime,
    pub contact_hours_end: NaiveTime,
    pub max_daily_contacts: u32,
    pub max_weekly_contacts: u32,
    pub prohibited_phrases: Vec<ProhibitedPhrase>,
}

/// A disallowed outbound phrase. With a replacement the guard masks the text
/// and lets the contact proceed; without one the contact is blocked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProhibitedPhrase {
    pub pattern: String,
    pub replacement: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EscalationConfig {
    pub confidence_threshold: f32,
    pub verification_attempt_limit: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub max_settlement_pct: Option<Decimal>,
    pub confidence_threshold: Option<f32>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

fn default_prohibited_phrases() -> Vec<ProhibitedPhrase> {
    [
        "threaten", "sue", "arrest", "jail", "garnish", "seize", "ruin credit", "legal action",
        "court", "lawsuit",
    ]
    .into_iter()
    .map(|pattern| ProhibitedPhrase { pattern: pattern.to_string(), replacement: None })
    .collect()
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            max_settlement_pct: Decimal::new(70, 2),
            min_settlement_pct: Decimal::new(40, 2),
            settlement_step_pct: Decimal::new(10, 2),
            max_installment_months: 12,
            min_payment: Decimal::from(25),
        }
    }
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            contact_hours_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            contact_hours_end: NaiveTime::from_hms_opt(21, 0, 0).unwrap_or_default(),
            max_daily_contacts: 3,
            max_weekly_contacts: 7,
            prohibited_phrases: default_prohibited_phrases(),
        }
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self { confidence_threshold: 0.5, verification_attempt_limit: 3 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            negotiation: NegotiationConfig::default(),
            compliance: ComplianceConfig::default(),
            escalation: EscalationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl EngineConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("recova.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(negotiation) = patch.negotiation {
            if let Some(value) = negotiation.max_settlement_pct {
                self.negotiation.max_settlement_pct = decimal_field("negotiation.max_settlement_pct", value)?;
            }
            if let Some(value) = negotiation.min_settlement_pct {
                self.negotiation.min_settlement_pct = decimal_field("negotiation.min_settlement_pct", value)?;
            }
            if let Some(value) = negotiation.settlement_step_pct {
                self.negotiation.settlement_step_pct = decimal_field("negotiation.settlement_step_pct", value)?;
            }
            if let Some(value) = negotiation.max_installment_months {
                self.negotiation.max_installment_months = value;
            }
            if let Some(value) = negotiation.min_payment {
                self.negotiation.min_payment = decimal_field("negotiation.min_payment", value)?;
            }
        }

        if let Some(compliance) = patch.compliance {
            if let Some(value) = compliance.contact_hours_start {
                self.compliance.contact_hours_start =
                    contact_hour("compliance.contact_hours_start", &value)?;
            }
            if let Some(value) = compliance.contact_hours_end {
                self.compliance.contact_hours_end =
                    contact_hour("compliance.contact_hours_end", &value)?;
            }
            if let Some(value) = compliance.max_daily_contacts {
                self.compliance.max_daily_contacts = value;
            }
            if let Some(value) = compliance.max_weekly_contacts {
                self.compliance.max_weekly_contacts = value;
            }
            if let Some(value) = compliance.prohibited_phrases {
                self.compliance.prohibited_phrases = value;
            }
        }

        if let Some(escalation) = patch.escalation {
            if let Some(value) = escalation.confidence_threshold {
                self.escalation.confidence_threshold = value;
            }
            if let Some(value) = escalation.verification_attempt_limit {
                self.escalation.verification_attempt_limit = value;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RECOVA_MAX_SETTLEMENT_PCT") {
            self.negotiation.max_settlement_pct = parse_decimal("RECOVA_MAX_SETTLEMENT_PCT", &value)?;
        }
        if let Some(value) = read_env("RECOVA_MIN_SETTLEMENT_PCT") {
            self.negotiation.min_settlement_pct = parse_decimal("RECOVA_MIN_SETTLEMENT_PCT", &value)?;
        }
        if let Some(value) = read_env("RECOVA_SETTLEMENT_STEP_PCT") {
            self.negotiation.settlement_step_pct =
                parse_decimal("RECOVA_SETTLEMENT_STEP_PCT", &value)?;
        }
        if let Some(value) = read_env("RECOVA_MAX_INSTALLMENT_MONTHS") {
            self.negotiation.max_installment_months =
                parse_u32("RECOVA_MAX_INSTALLMENT_MONTHS", &value)?;
        }
        if let Some(value) = read_env("RECOVA_MIN_PAYMENT") {
            self.negotiation.min_payment = parse_decimal("RECOVA_MIN_PAYMENT", &value)?;
        }

        if let Some(value) = read_env("RECOVA_CONTACT_HOURS_START") {
            self.compliance.contact_hours_start =
                parse_time("RECOVA_CONTACT_HOURS_START", &value)?;
        }
        if let Some(value) = read_env("RECOVA_CONTACT_HOURS_END") {
            self.compliance.contact_hours_end = parse_time("RECOVA_CONTACT_HOURS_END", &value)?;
        }
        if let Some(value) = read_env("RECOVA_MAX_DAILY_CONTACTS") {
            self.compliance.max_daily_contacts = parse_u32("RECOVA_MAX_DAILY_CONTACTS", &value)?;
        }
        if let Some(value) = read_env("RECOVA_MAX_WEEKLY_CONTACTS") {
            self.compliance.max_weekly_contacts = parse_u32("RECOVA_MAX_WEEKLY_CONTACTS", &value)?;
        }

        if let Some(value) = read_env("RECOVA_CONFIDENCE_THRESHOLD") {
            self.escalation.confidence_threshold =
                parse_f32("RECOVA_CONFIDENCE_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("RECOVA_VERIFICATION_ATTEMPT_LIMIT") {
            self.escalation.verification_attempt_limit =
                parse_u32("RECOVA_VERIFICATION_ATTEMPT_LIMIT", &value)?;
        }

        let log_level = read_env("RECOVA_LOGGING_LEVEL").or_else(|| read_env("RECOVA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("RECOVA_LOGGING_FORMAT").or_else(|| read_env("RECOVA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(max_settlement_pct) = overrides.max_settlement_pct {
            self.negotiation.max_settlement_pct = max_settlement_pct;
        }
        if let Some(confidence_threshold) = overrides.confidence_threshold {
            self.escalation.confidence_threshold = confidence_threshold;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_negotiation(&self.negotiation)?;
        validate_compliance(&self.compliance)?;
        validate_escalation(&self.escalation)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("recova.toml"), PathBuf::from("config/recova.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_negotiation(negotiation: &NegotiationConfig) -> Result<(), ConfigError> {
    let in_unit_range = |value: Decimal| value > Decimal::ZERO && value <= Decimal::ONE;

    if !in_unit_range(negotiation.max_settlement_pct) {
        return Err(ConfigError::Validation(
            "negotiation.max_settlement_pct must be in range (0, 1]".to_string(),
        ));
    }
    if !in_unit_range(negotiation.min_settlement_pct) {
        return Err(ConfigError::Validation(
            "negotiation.min_settlement_pct must be in range (0, 1]".to_string(),
        ));
    }
    if negotiation.min_settlement_pct > negotiation.max_settlement_pct {
        return Err(ConfigError::Validation(
            "negotiation.min_settlement_pct must not exceed negotiation.max_settlement_pct"
                .to_string(),
        ));
    }
    if negotiation.settlement_step_pct < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "negotiation.settlement_step_pct must not be negative".to_string(),
        ));
    }
    if negotiation.max_installment_months == 0 || negotiation.max_installment_months > 120 {
        return Err(ConfigError::Validation(
            "negotiation.max_installment_months must be in range 1..=120".to_string(),
        ));
    }
    if negotiation.min_payment <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "negotiation.min_payment must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_compliance(compliance: &ComplianceConfig) -> Result<(), ConfigError> {
    if compliance.contact_hours_start >= compliance.contact_hours_end {
        return Err(ConfigError::Validation(
            "compliance.contact_hours_start must be earlier than compliance.contact_hours_end"
                .to_string(),
        ));
    }
    if compliance.max_daily_contacts == 0 {
        return Err(ConfigError::Validation(
            "compliance.max_daily_contacts must be greater than zero".to_string(),
        ));
    }
    if compliance.max_weekly_contacts < compliance.max_daily_contacts {
        return Err(ConfigError::Validation(
            "compliance.max_weekly_contacts must be at least compliance.max_daily_contacts"
                .to_string(),
        ));
    }
    if compliance.prohibited_phrases.iter().any(|phrase| phrase.pattern.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "compliance.prohibited_phrases entries must have non-empty patterns".to_string(),
        ));
    }

    Ok(())
}

fn validate_escalation(escalation: &EscalationConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&escalation.confidence_threshold) {
        return Err(ConfigError::Validation(
            "escalation.confidence_threshold must be in range 0.0..=1.0".to_string(),
        ));
    }
    if escalation.verification_attempt_limit == 0 {
        return Err(ConfigError::Validation(
            "escalation.verification_attempt_limit must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn decimal_field(key: &str, value: f64) -> Result<Decimal, ConfigError> {
    Decimal::try_from(value).map_err(|_| {
        ConfigError::Validation(format!("`{key}` is not representable as a decimal: `{value}`"))
    })
}

fn contact_hour(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
        ConfigError::Validation(format!("`{key}` must be an HH:MM wall-clock time, got `{value}`"))
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_time(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    negotiation: Option<NegotiationPatch>,
    compliance: Option<CompliancePatch>,
    escalation: Option<EscalationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct NegotiationPatch {
    max_settlement_pct: Option<f64>,
    min_settlement_pct: Option<f64>,
    settlement_step_pct: Option<f64>,
    max_installment_months: Option<u32>,
    min_payment: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct CompliancePatch {
    contact_hours_start: Option<String>,
    contact_hours_end: Option<String>,
    max_daily_contacts: Option<u32>,
    max_weekly_contacts: Option<u32>,
    prohibited_phrases: Option<Vec<ProhibitedPhrase>>,
}

#[derive(Debug, Default, Deserialize)]
struct EscalationPatch {
    confidence_threshold: Option<f32>,
    verification_attempt_limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use chrono::NaiveTime;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{ConfigError, ConfigOverrides, EngineConfig, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_follow_collection_policy() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = EngineConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(
            config.negotiation.max_settlement_pct == Decimal::new(70, 2),
            "default settlement ceiling should be 0.70",
        )?;
        ensure(
            config.negotiation.max_installment_months == 12,
            "default installment cap should be 12 months",
        )?;
        ensure(
            config.compliance.contact_hours_start == NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            "default contact window should open at 08:00",
        )?;
        ensure(
            config.compliance.prohibited_phrases.iter().any(|p| p.pattern == "lawsuit"),
            "default prohibited phrases should include lawsuit",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_RECOVA_CONTACT_END", "20:00");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("recova.toml");
            fs::write(
                &path,
                r#"
[compliance]
contact_hours_end = "${TEST_RECOVA_CONTACT_END}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = EngineConfig::load(LoadOptions {
                config_path: Some(path),
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.compliance.contact_hours_end
                    == NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
                "contact window end should come from the environment",
            )
        })();

        clear_vars(&["TEST_RECOVA_CONTACT_END"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("RECOVA_MAX_DAILY_CONTACTS", "2");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("recova.toml");
            fs::write(
                &path,
                r#"
[negotiation]
max_settlement_pct = 0.65

[compliance]
max_daily_contacts = 5

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = EngineConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    max_settlement_pct: Some(Decimal::new(60, 2)),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.negotiation.max_settlement_pct == Decimal::new(60, 2),
                "programmatic override should win over file",
            )?;
            ensure(
                config.compliance.max_daily_contacts == 2,
                "env override should win over file",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")
        })();

        clear_vars(&["RECOVA_MAX_DAILY_CONTACTS"]);
        result
    }

    #[test]
    fn floor_above_ceiling_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("RECOVA_MIN_SETTLEMENT_PCT", "0.80");
        env::set_var("RECOVA_MAX_SETTLEMENT_PCT", "0.70");

        let result = (|| -> Result<(), String> {
            let error = match EngineConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("min_settlement_pct")
            );
            ensure(has_message, "validation failure should mention the settlement floor")
        })();

        clear_vars(&["RECOVA_MIN_SETTLEMENT_PCT", "RECOVA_MAX_SETTLEMENT_PCT"]);
        result
    }

    #[test]
    fn inverted_contact_window_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("RECOVA_CONTACT_HOURS_START", "21:00");
        env::set_var("RECOVA_CONTACT_HOURS_END", "08:00");

        let result = (|| -> Result<(), String> {
            let error = match EngineConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected inverted window to fail validation".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::Validation(_)),
                "inverted contact window should be a validation error",
            )
        })();

        clear_vars(&["RECOVA_CONTACT_HOURS_START", "RECOVA_CONTACT_HOURS_END"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("RECOVA_LOG_LEVEL", "warn");
        env::set_var("RECOVA_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = EngineConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warn log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )
        })();

        clear_vars(&["RECOVA_LOG_LEVEL", "RECOVA_LOG_FORMAT"]);
        result
    }
}
