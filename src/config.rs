use std::env;

use chrono_tz::Tz;

use crate::models::Profession;

/// All tunables are read once at startup and treated as immutable for the
/// process lifetime.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    /// IANA timezone the business operates in. Every instant in the system
    /// is wall-clock time in this zone.
    pub timezone: Tz,

    // Input normalization
    pub min_input_length: usize,
    pub max_input_length: usize,

    // Intent classification
    pub candidate_intents: Vec<String>,
    pub intent_confidence_threshold: f64,

    // Defaults applied by the command assembler
    pub default_customer_name: String,
    pub default_technician_name: String,
    pub default_profession: Profession,

    // Business hours & booking defaults
    pub open_hour: u32,
    pub close_hour: u32,
    pub default_booking_hour: u32,
    pub last_booking_hour: u32,

    // Model providers
    pub hf_api_url: String,
    pub hf_api_token: String,
    pub zero_shot_model: String,
    pub ner_model: String,
    pub text2text_model: String,
    pub model_load_retries: u32,
    pub model_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            timezone: env::var("TIMEZONE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(chrono_tz::UTC),
            min_input_length: parse_env("MIN_INPUT_LENGTH", 3),
            max_input_length: parse_env("MAX_INPUT_LENGTH", 512),
            candidate_intents: env::var("CANDIDATE_INTENTS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| default_candidate_intents()),
            intent_confidence_threshold: parse_env("INTENT_CONFIDENCE_THRESHOLD", 0.4),
            default_customer_name: env::var("DEFAULT_CUSTOMER_NAME")
                .unwrap_or_else(|_| "Anonymous Customer".to_string()),
            default_technician_name: env::var("DEFAULT_TECHNICIAN_NAME")
                .unwrap_or_else(|_| "Unknown Technician".to_string()),
            default_profession: env::var("DEFAULT_PROFESSION")
                .ok()
                .and_then(|v| Profession::parse(&v))
                .unwrap_or(Profession::Plumber),
            open_hour: parse_env("OPEN_HOUR", 9),
            close_hour: parse_env("CLOSE_HOUR", 17),
            default_booking_hour: parse_env("DEFAULT_BOOKING_HOUR", 9),
            last_booking_hour: parse_env("LAST_BOOKING_HOUR", 18),
            hf_api_url: env::var("HF_API_URL")
                .unwrap_or_else(|_| "https://api-inference.huggingface.co".to_string()),
            hf_api_token: env::var("HF_API_TOKEN").unwrap_or_default(),
            zero_shot_model: env::var("ZERO_SHOT_MODEL")
                .unwrap_or_else(|_| "facebook/bart-large-mnli".to_string()),
            ner_model: env::var("NER_MODEL").unwrap_or_else(|_| {
                "dbmdz/bert-large-cased-finetuned-conll03-english".to_string()
            }),
            text2text_model: env::var("TEXT2TEXT_MODEL")
                .unwrap_or_else(|_| "google/flan-t5-large".to_string()),
            model_load_retries: parse_env("MODEL_LOAD_RETRIES", 3),
            model_timeout_secs: parse_env("MODEL_TIMEOUT_SECS", 30),
        }
    }
}

pub fn default_candidate_intents() -> Vec<String> {
    vec![
        "Create a booking".to_string(),
        "Cancel a booking".to_string(),
        "Retrieve booking details".to_string(),
        "List all bookings".to_string(),
    ]
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
