use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use recova_cli::commands::{config, simulate, smoke};
use serde_json::Value;

#[test]
fn smoke_passes_every_engine_check() {
    with_env(&[], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 0, "expected smoke checks to pass: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "pass");

        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks.len(), 5);
        let names: Vec<_> =
            checks.iter().map(|check| check["name"].as_str().unwrap_or_default()).collect();
        assert!(names.contains(&"after_hours_block"));
        assert!(names.contains(&"fail_safe_escalation"));
    });
}

#[test]
fn config_renders_sources_for_env_overrides_and_defaults() {
    with_env(&[("RECOVA_MAX_DAILY_CONTACTS", "2")], || {
        let output = config::run();

        assert!(output.contains("effective config"), "unexpected output: {output}");
        assert!(output.contains("compliance.max_daily_contacts = 2"));
        assert!(output.contains("env:RECOVA_MAX_DAILY_CONTACTS"));
        assert!(output.contains("negotiation.max_settlement_pct = 0.70"));
        assert!(output.contains("[default]"));
    });
}

#[test]
fn config_reports_validation_failures() {
    with_env(&[("RECOVA_MIN_SETTLEMENT_PCT", "0.90")], || {
        let output = config::run();
        assert!(output.contains("config validation failed"), "unexpected output: {output}");
    });
}

#[test]
fn simulate_replays_a_full_conversation_to_closed() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let script_path = dir.path().join("turns.json");
    fs::write(&script_path, SCRIPT).expect("write script");

    with_env(&[], || {
        let result = simulate::run(&script_path);
        assert_eq!(result.exit_code, 0, "simulate failed: {}", result.output);

        let turns: Vec<Value> =
            serde_json::from_str(&result.output).expect("turn summaries should be JSON");
        assert_eq!(turns.len(), 4);

        assert_eq!(turns[0]["phase"], "Verification");
        assert_eq!(turns[1]["phase"], "Negotiation");
        assert!(turns[1]["outbound"]
            .as_str()
            .unwrap_or_default()
            .starts_with("propose_offers:"));
        assert_eq!(turns[2]["phase"], "PaymentSetup");
        assert_eq!(turns[3]["phase"], "Closed");

        for turn in &turns {
            assert!(turn["escalation"].is_null(), "unexpected escalation: {turn}");
        }
    });
}

#[test]
fn simulate_reports_missing_script_files() {
    with_env(&[], || {
        let result = simulate::run(std::path::Path::new("definitely-not-here.json"));
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "script_read");
    });
}

const SCRIPT: &str = r#"{
  "balance": "1200",
  "channel": "sms",
  "turns": [
    {
      "borrower": "Hi, I got your message about my loan",
      "reply": "{\"action\": \"verify_identity\", \"message_to_user\": \"Let me verify your identity first.\", \"confidence\": 0.95}",
      "at": "2026-07-06T15:00:00Z"
    },
    {
      "borrower": "Sure. I can pay $200 a month if that helps",
      "verification": "succeeded",
      "reply": "{\"action\": \"propose_plan\", \"message_to_user\": \"Thank you. Here are the plans available to you.\", \"confidence\": 0.92}",
      "at": "2026-07-07T15:00:00Z"
    },
    {
      "borrower": "that works for me",
      "reply": "{\"action\": \"collect_payment\", \"message_to_user\": \"Great, I will set that up now.\", \"confidence\": 0.93}",
      "at": "2026-07-08T15:00:00Z"
    },
    {
      "borrower": "thanks for the help",
      "payment": "succeeded",
      "reply": "{\"action\": \"close\", \"message_to_user\": \"Your plan is confirmed. Thank you.\", \"confidence\": 0.97}",
      "at": "2026-07-09T15:00:00Z"
    }
  ]
}"#;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const MANAGED_VARS: &[&str] = &[
    "RECOVA_MAX_SETTLEMENT_PCT",
    "RECOVA_MIN_SETTLEMENT_PCT",
    "RECOVA_MAX_DAILY_CONTACTS",
    "RECOVA_MAX_WEEKLY_CONTACTS",
    "RECOVA_CONTACT_HOURS_START",
    "RECOVA_CONTACT_HOURS_END",
    "RECOVA_LOG_LEVEL",
    "RECOVA_LOG_FORMAT",
];

fn with_env(vars: &[(&str, &str)], run: impl FnOnce()) {
    let lock = ENV_LOCK.get_or_init(|| Mutex::new(()));
    let _guard = match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    for var in MANAGED_VARS {
        env::remove_var(var);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    run();

    for var in MANAGED_VARS {
        env::remove_var(var);
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|error| {
        panic!("command output should be JSON: {error}; raw output: {output}")
    })
}
