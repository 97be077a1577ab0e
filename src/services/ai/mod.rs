pub mod huggingface;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A candidate label with its classification score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Categories a sequence-labeling model can assign to a span of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanCategory {
    Person,
    Date,
    Time,
    Profession,
    Other(String),
}

impl SpanCategory {
    /// Maps model tag sets (CoNLL-style "PER"/"MISC", OntoNotes-style
    /// "PERSON"/"DATE"/"TIME") onto the internal categories.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_uppercase().as_str() {
            "PER" | "PERSON" => SpanCategory::Person,
            "DATE" => SpanCategory::Date,
            "TIME" => SpanCategory::Time,
            "PROFESSION" | "OCCUPATION" => SpanCategory::Profession,
            other => SpanCategory::Other(other.to_string()),
        }
    }
}

/// A labeled span of the input text. `start` is the byte offset of the span
/// in the original text.
#[derive(Debug, Clone)]
pub struct LabeledSpan {
    pub category: SpanCategory,
    pub text: String,
    pub start: usize,
}

/// Zero-shot classification over a fixed candidate-label set, single-label
/// mode. Results are ordered best-first.
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    async fn classify(&self, text: &str, labels: &[String]) -> anyhow::Result<Vec<LabelScore>>;
}

/// Sequence labeling: tag spans of text with categories (person, time, ...).
#[async_trait]
pub trait TokenLabeler: Send + Sync {
    async fn label(&self, text: &str) -> anyhow::Result<Vec<LabeledSpan>>;
}

/// Free-form text generation, used as a last-resort datetime reinterpreter.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
