use rust_decimal::Decimal;

use recova_core::BorrowerSignals;

/// Extraction result: the engine-facing signals plus the cue tags that fired,
/// kept for audit/debug output (tags only, never borrower text).
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedSignals {
    pub signals: BorrowerSignals,
    pub cues: Vec<String>,
}

/// Deterministic keyword/token extraction of borrower intent. This runs
/// before the language model and its output is what the engine actually
/// consumes; the model reply only shapes the outbound text.
#[derive(Clone, Debug, Default)]
pub struct SignalExtractor;

impl SignalExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> ExtractedSignals {
        let normalized = normalize_text(text);
        let tokens = tokenize(&normalized);
        let mut cues = Vec::new();

        let opt_out_request = contains_any(&normalized, OPT_OUT_CUES);
        if opt_out_request {
            cues.push("opt_out".to_string());
        }

        let validation_request = contains_any(&normalized, VALIDATION_CUES);
        if validation_request {
            cues.push("debt_validation".to_string());
        }

        let human_request = contains_any(&normalized, HUMAN_CUES);
        if human_request {
            cues.push("human_agent".to_string());
        }

        let distress = contains_any(&normalized, DISTRESS_CUES);
        if distress {
            cues.push("distress".to_string());
        }

        let acceptance = is_acceptance(&normalized, &tokens);
        if acceptance {
            cues.push("acceptance".to_string());
        }

        let rejection = contains_any(&normalized, REJECTION_CUES);
        if rejection {
            cues.push("rejection".to_string());
        }

        let stated_capacity = extract_monthly_capacity(&normalized, &tokens);
        if stated_capacity.is_some() {
            cues.push("stated_capacity".to_string());
        }

        let substantive = is_substantive(&tokens);

        ExtractedSignals {
            signals: BorrowerSignals {
                substantive,
                opt_out_request,
                validation_request,
                human_request,
                acceptance,
                rejection: rejection && !acceptance,
                distress,
                stated_capacity,
            },
            cues,
        }
    }
}

const OPT_OUT_CUES: &[&str] = &[
    "stop contacting",
    "stop calling",
    "stop texting",
    "opt out",
    "unsubscribe",
    "remove me",
    "do not contact",
    "don't contact me",
];

const VALIDATION_CUES: &[&str] = &[
    "not my debt",
    "not mine",
    "don't owe",
    "do not owe",
    "validate this debt",
    "debt validation",
    "prove i owe",
    "proof of this debt",
    "never heard of this",
];

const HUMAN_CUES: &[&str] = &[
    "human",
    "real person",
    "an agent",
    "a representative",
    "speak to someone",
    "a manager",
    "a supervisor",
];

const DISTRESS_CUES: &[&str] =
    &["suicide", "kill myself", "end my life", "hopeless", "harassing me", "harassment"];

const ACCEPTANCE_CUES: &[&str] = &[
    "i accept",
    "i agree",
    "sounds good",
    "works for me",
    "that works",
    "let's do it",
    "sign me up",
    "i'll take",
];

const REJECTION_CUES: &[&str] = &[
    "can't afford",
    "cannot afford",
    "too much",
    "no deal",
    "won't pay",
    "will not pay",
    "not acceptable",
    "doesn't work for me",
];

fn contains_any(normalized_text: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| normalized_text.contains(cue))
}

fn is_acceptance(normalized_text: &str, tokens: &[String]) -> bool {
    if contains_any(normalized_text, ACCEPTANCE_CUES) {
        return true;
    }
    // A bare "yes"/"okay" on a short reply reads as acceptance; inside a
    // longer sentence it is too ambiguous to act on.
    tokens.len() <= 3 && tokens.iter().any(|token| matches!(token.as_str(), "yes" | "okay" | "ok"))
}

fn is_substantive(tokens: &[String]) -> bool {
    !tokens.is_empty()
        && !tokens.iter().all(|token| matches!(token.as_str(), "hi" | "hello" | "hey" | "yo"))
}

/// Monthly capacity: a money amount in a per-month context ("$40 a month",
/// "i can pay 150 monthly"). A bare amount with a payment verb nearby counts
/// too; a bare amount with no context does not.
fn extract_monthly_capacity(normalized_text: &str, tokens: &[String]) -> Option<Decimal> {
    let monthly_context = normalized_text.contains("a month")
        || normalized_text.contains("per month")
        || normalized_text.contains("monthly")
        || normalized_text.contains("/mo")
        || normalized_text.contains("each month");

    let payment_context = ["pay", "afford", "manage", "do"];

    for (index, token) in tokens.iter().enumerate() {
        let after_payment_verb =
            index > 0 && payment_context.contains(&tokens[index - 1].as_str());
        let looks_monetary = token.starts_with('$') || after_payment_verb;

        if !looks_monetary && !monthly_context {
            continue;
        }
        if let Some(cents) = parse_money_token(token) {
            if monthly_context || after_payment_verb {
                return Some(Decimal::new(cents, 2));
            }
        }
    }
    None
}

fn parse_money_token(token: &str) -> Option<i64> {
    let trimmed = token.trim_start_matches('$').trim_end_matches(',');
    if trimmed.is_empty() || !trimmed.chars().next().is_some_and(|ch| ch.is_ascii_digit()) {
        return None;
    }

    let (number_part, multiplier) = if let Some(prefix) = trimmed.strip_suffix('k') {
        (prefix, 1_000.0)
    } else {
        (trimmed, 1.0)
    };

    let amount = number_part.parse::<f64>().ok()?;
    let dollars = amount * multiplier;
    Some((dollars * 100.0).round() as i64)
}

fn normalize_text(text: &str) -> String {
    text.to_ascii_lowercase()
}

fn tokenize(text: &str) -> Vec<String> {
    let mut sanitized = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_ascii_alphanumeric() || matches!(character, '$' | '.' | '\'' | 'k') {
            sanitized.push(character);
        } else {
            sanitized.push(' ');
        }
    }
    sanitized.split_whitespace().map(|token| token.to_string()).collect()
}
