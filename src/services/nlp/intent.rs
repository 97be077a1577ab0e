use regex::Regex;

use crate::errors::InterpretError;
use crate::models::Intent;
use crate::services::ai::ZeroShotClassifier;

/// Confidence assigned when a deterministic pattern matches. Pattern matches
/// short-circuit the statistical path: explicit phrasing beats the
/// classifier.
pub const PATTERN_CONFIDENCE: f64 = 0.95;

/// Ordered list of deterministic matchers per intent. Iteration order is
/// part of the contract: when an utterance matches patterns of more than one
/// intent, the first intent listed here wins. The order is
/// Cancel → List → Retrieve → Create.
pub struct IntentPatternTable {
    entries: Vec<(Intent, Vec<Regex>)>,
}

impl IntentPatternTable {
    pub fn standard() -> Self {
        let compile = |patterns: &[&str]| -> Vec<Regex> {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("invalid intent pattern"))
                .collect()
        };

        let entries = vec![
            (
                Intent::CancelBooking,
                compile(&[
                    r"(?i)\b(?:cancel|remove|delete|terminate|abort|discard|void)\s+(?:my\s+)?(?:booking|reservation|appointment|schedule|session)\b",
                    r"(?i)\b(?:undo|revoke)\s+(?:my\s+)?(?:booking|reservation|appointment|schedule|session)\b",
                ]),
            ),
            (
                Intent::ListBookings,
                compile(&[
                    r"(?i)\b(?:list|show|display|view|see|get|fetch|present|give\s+me)\s+(?:all\s+)?(?:my\s+)?(?:bookings|reservations|appointments|schedules|sessions)\b",
                ]),
            ),
            (
                Intent::RetrieveBooking,
                compile(&[
                    r"(?i)\b(?:get|find|retrieve|access|look\s+up)\s+(?:the\s+)?(?:details\s+of\s+)?(?:my\s+)?(?:booking|reservation|appointment|schedule|session)\b",
                ]),
            ),
            (
                Intent::CreateBooking,
                compile(&[
                    r"(?i)\b(?:can\s+you\s+|please\s+)?(?:book|schedule|reserve|arrange|set\s+up|make\s+a)\s+(?:an?\s+)?(?:plumber|welder|electrician|carpenter|mechanic|painter|chef|gardener|teacher|developer|nurse|technician)\b",
                    r"(?i)\bi\s+need\s+(?:an?\s+)?(?:plumber|welder|electrician|carpenter|mechanic|painter|chef|gardener|teacher|developer|nurse|technician)\b",
                ]),
            ),
        ];

        Self { entries }
    }

    /// First intent with any matching pattern wins.
    pub fn match_intent(&self, text: &str) -> Option<Intent> {
        for (intent, patterns) in &self.entries {
            if patterns.iter().any(|p| p.is_match(text)) {
                return Some(*intent);
            }
        }
        None
    }
}

/// Maps the classifier's external label text to the internal intent enum.
/// An unmapped label is a hard error, never silently downgraded.
pub fn map_candidate_label(label: &str) -> Option<Intent> {
    match label {
        "Create a booking" => Some(Intent::CreateBooking),
        "Cancel a booking" => Some(Intent::CancelBooking),
        "Retrieve booking details" => Some(Intent::RetrieveBooking),
        "List all bookings" => Some(Intent::ListBookings),
        _ => None,
    }
}

/// Two-tier intent resolution: deterministic patterns first, zero-shot
/// classification as fallback, gated by the confidence threshold.
pub async fn resolve_intent(
    classifier: &dyn ZeroShotClassifier,
    table: &IntentPatternTable,
    candidate_intents: &[String],
    threshold: f64,
    text: &str,
) -> Result<(Intent, f64), InterpretError> {
    if let Some(intent) = table.match_intent(text) {
        tracing::debug!(%intent, "pattern matched intent");
        return Ok((intent, PATTERN_CONFIDENCE));
    }

    let scores = classifier
        .classify(text, candidate_intents)
        .await
        .map_err(|e| InterpretError::ModelUnavailable(e.to_string()))?;

    let top = scores
        .first()
        .ok_or_else(|| InterpretError::ModelUnavailable("empty classification".to_string()))?;

    if top.score < threshold {
        return Err(InterpretError::AmbiguousIntent { score: top.score });
    }

    let intent = map_candidate_label(&top.label)
        .ok_or_else(|| InterpretError::UnknownIntent(top.label.clone()))?;

    tracing::debug!(%intent, score = top.score, "zero-shot predicted intent");
    Ok((intent, top.score))
}
