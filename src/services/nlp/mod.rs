pub mod assemble;
pub mod datetime;
pub mod entities;
pub mod intent;
pub mod normalize;

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::config::AppConfig;
use crate::errors::InterpretError;
use crate::models::{Intent, ParsedCommand};
use crate::services::ai::{TextGenerator, TokenLabeler, ZeroShotClassifier};

use assemble::AssembleDefaults;
use datetime::{BusinessHoursPolicy, DateTimeResolver};
use entities::{EntityExtractor, ProfessionKeywordTable};
use intent::IntentPatternTable;

/// The command-interpretation pipeline: normalizer → intent resolver →
/// entity extractor (with datetime resolution) → command assembler.
///
/// Explicitly constructed with its model capabilities injected; stateless
/// per call apart from the shared read-only models, so it may be invoked
/// concurrently without coordination.
pub struct NlpService {
    classifier: Arc<dyn ZeroShotClassifier>,
    labeler: Arc<dyn TokenLabeler>,
    patterns: IntentPatternTable,
    extractor: EntityExtractor,
    resolver: DateTimeResolver,
    candidate_intents: Vec<String>,
    confidence_threshold: f64,
    min_input_length: usize,
    max_input_length: usize,
    defaults: AssembleDefaults,
}

impl NlpService {
    pub fn new(
        config: &AppConfig,
        classifier: Arc<dyn ZeroShotClassifier>,
        labeler: Arc<dyn TokenLabeler>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let policy = BusinessHoursPolicy::new(config.open_hour, config.close_hour);
        Self {
            classifier,
            labeler,
            patterns: IntentPatternTable::standard(),
            extractor: EntityExtractor::new(ProfessionKeywordTable::standard()),
            resolver: DateTimeResolver::new(
                policy,
                config.default_booking_hour,
                config.last_booking_hour,
                generator,
            ),
            candidate_intents: config.candidate_intents.clone(),
            confidence_threshold: config.intent_confidence_threshold,
            min_input_length: config.min_input_length,
            max_input_length: config.max_input_length,
            defaults: AssembleDefaults {
                customer_name: config.default_customer_name.clone(),
                technician_name: config.default_technician_name.clone(),
                profession: config.default_profession,
            },
        }
    }

    /// Turns one raw utterance into a structured command, anchored at `now`.
    pub async fn parse_user_input(
        &self,
        text: &str,
        now: NaiveDateTime,
    ) -> Result<ParsedCommand, InterpretError> {
        let cleaned = normalize::normalize(text, self.min_input_length, self.max_input_length)?;

        let (intent, confidence) = intent::resolve_intent(
            self.classifier.as_ref(),
            &self.patterns,
            &self.candidate_intents,
            self.confidence_threshold,
            &cleaned,
        )
        .await?;

        // A labeling failure degrades to keyword/regex heuristics only; it
        // never aborts interpretation.
        let spans = match self.labeler.label(&cleaned).await {
            Ok(spans) => spans,
            Err(e) => {
                tracing::warn!(error = %e, "token labeling failed, using heuristics only");
                Vec::new()
            }
        };

        let extracted = self.extractor.extract(&cleaned, &spans);

        // Time resolution only matters for creation. When the extractor
        // isolated no phrase at all, the assembler falls back to the default
        // booking slot instead.
        let start_time = match (&extracted.time_phrase, intent) {
            (Some(phrase), Intent::CreateBooking) => {
                Some(self.resolver.resolve(phrase, now).await)
            }
            _ => None,
        };

        let command = assemble::assemble(
            intent,
            confidence,
            extracted,
            start_time,
            self.resolver.default_booking_time(now),
            &self.defaults,
        )?;

        tracing::info!(intent = %command.intent, confidence = command.confidence, "parsed command");
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommandFields, Profession};
    use crate::services::ai::{LabelScore, LabeledSpan};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct NoMatchClassifier;

    #[async_trait]
    impl ZeroShotClassifier for NoMatchClassifier {
        async fn classify(&self, _: &str, _: &[String]) -> anyhow::Result<Vec<LabelScore>> {
            Ok(vec![LabelScore {
                label: "Create a booking".to_string(),
                score: 0.1,
            }])
        }
    }

    struct EmptyLabeler;

    #[async_trait]
    impl TokenLabeler for EmptyLabeler {
        async fn label(&self, _: &str) -> anyhow::Result<Vec<LabeledSpan>> {
            Ok(Vec::new())
        }
    }

    fn service() -> NlpService {
        let config = AppConfig::from_env();
        NlpService::new(
            &config,
            Arc::new(NoMatchClassifier),
            Arc::new(EmptyLabeler),
            None,
        )
    }

    // 2025-06-16 is a Monday.
    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 16)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_plumber_tomorrow_2pm() {
        let cmd = service()
            .parse_user_input("Book a plumber for tomorrow at 2pm", now())
            .await
            .unwrap();
        assert_eq!(cmd.intent, Intent::CreateBooking);
        match cmd.fields {
            CommandFields::Create {
                profession,
                start_time,
                ..
            } => {
                assert_eq!(profession, Profession::Plumber);
                assert_eq!(
                    start_time,
                    NaiveDate::from_ymd_opt(2025, 6, 17)
                        .unwrap()
                        .and_hms_opt(14, 0, 0)
                        .unwrap()
                );
            }
            other => panic!("unexpected fields: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_booking_with_reference() {
        let cmd = service()
            .parse_user_input("Cancel booking #123", now())
            .await
            .unwrap();
        assert_eq!(cmd.intent, Intent::CancelBooking);
        assert_eq!(
            cmd.fields,
            CommandFields::Cancel {
                booking_id: "123".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_list_all_bookings() {
        let cmd = service()
            .parse_user_input("List all bookings", now())
            .await
            .unwrap();
        assert_eq!(cmd.intent, Intent::ListBookings);
        assert_eq!(cmd.fields, CommandFields::List);
    }

    #[tokio::test]
    async fn test_gibberish_is_ambiguous() {
        let err = service()
            .parse_user_input("asdfqwerty", now())
            .await
            .unwrap_err();
        assert!(matches!(err, InterpretError::AmbiguousIntent { .. }));
    }

    #[tokio::test]
    async fn test_cancel_without_reference_is_missing_field() {
        let err = service()
            .parse_user_input("please cancel my booking right away ok", now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InterpretError::MissingField {
                intent: Intent::CancelBooking,
                field: "booking_id",
            }
        ));
    }

    #[tokio::test]
    async fn test_create_without_time_uses_default_slot() {
        let cmd = service()
            .parse_user_input("I need an electrician", now())
            .await
            .unwrap();
        match cmd.fields {
            CommandFields::Create { start_time, .. } => {
                // Next full hour after 10:00 on the same day.
                assert_eq!(
                    start_time,
                    NaiveDate::from_ymd_opt(2025, 6, 16)
                        .unwrap()
                        .and_hms_opt(11, 0, 0)
                        .unwrap()
                );
            }
            other => panic!("unexpected fields: {other:?}"),
        }
    }
}
