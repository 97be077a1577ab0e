use regex::Regex;

use crate::models::Profession;
use crate::services::ai::{LabeledSpan, SpanCategory};

/// Entities recovered from one utterance. Absence is represented by `None`,
/// never by placeholder values; defaults are applied later by the command
/// assembler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedEntities {
    pub booking_id: Option<String>,
    pub customer_name: Option<String>,
    pub technician_name: Option<String>,
    pub profession: Option<Profession>,
    pub time_phrase: Option<String>,
}

/// Profession → trigger-word table. Declaration order is the documented
/// tie-break: when an utterance hits keywords of several professions, the
/// first profession listed here wins. Matching is substring-based over the
/// lower-cased text.
pub struct ProfessionKeywordTable {
    entries: Vec<(Profession, Vec<&'static str>)>,
}

impl ProfessionKeywordTable {
    pub fn standard() -> Self {
        let entries = vec![
            (
                Profession::Plumber,
                vec![
                    "plumber", "pipe", "leak", "drain", "clog", "sewer", "faucet", "toilet",
                    "sink", "water heater", "plumbing", "shower", "valve", "overflow", "gutter",
                ],
            ),
            (
                Profession::Welder,
                vec![
                    "welder", "welding", "metal work", "fabrication", "steel", "iron",
                    "metalworking", "soldering", "brazing", "metal joining",
                ],
            ),
            (
                Profession::Electrician,
                vec![
                    "electrician", "electric", "wiring", "circuit", "voltage", "breaker",
                    "outlet", "fuse", "electrical panel", "power supply", "lighting", "socket",
                    "grounding",
                ],
            ),
            (
                Profession::Carpenter,
                vec![
                    "carpenter", "woodwork", "furniture", "cabinet", "joinery", "wood",
                    "door", "window", "deck", "sawing", "cabinetry", "shelf", "trim", "molding",
                ],
            ),
            (
                Profession::Mechanic,
                vec![
                    "mechanic", "engine", "transmission", "oil change", "tire", "brakes",
                    "clutch", "automotive", "car maintenance", "battery", "alternator",
                    "radiator", "suspension", "exhaust",
                ],
            ),
            (
                Profession::Painter,
                vec![
                    "painter", "painting", "roller", "primer", "coating", "staining",
                    "spray paint", "varnish", "wallpaper",
                ],
            ),
            (
                Profession::Chef,
                vec![
                    "chef", "cooking", "kitchen", "recipe", "meal", "cuisine", "catering",
                    "baking", "menu", "pastry", "culinary",
                ],
            ),
            (
                Profession::Gardener,
                vec![
                    "gardener", "gardening", "landscaping", "flower", "shrub", "hedge",
                    "lawn", "mowing", "pruning", "fertilizer", "mulch", "weeding",
                    "irrigation", "greenhouse",
                ],
            ),
            (
                Profession::Teacher,
                vec![
                    "teacher", "teaching", "tutoring", "lesson", "classroom", "curriculum",
                    "lecture", "syllabus", "educator",
                ],
            ),
            (
                Profession::Developer,
                vec![
                    "developer", "programming", "coding", "software", "frontend", "backend",
                    "fullstack", "debugging", "devops",
                ],
            ),
            (
                Profession::Nurse,
                vec![
                    "nurse", "nursing", "patient", "healthcare", "medication", "wound care",
                    "caregiver", "vitals",
                ],
            ),
        ];
        Self { entries }
    }

    /// First profession (in table order) with any keyword present in the
    /// lower-cased text, together with the byte position of the matched
    /// keyword.
    pub fn detect(&self, text_lower: &str) -> Option<(Profession, usize)> {
        for (profession, keywords) in &self.entries {
            for keyword in keywords {
                if let Some(pos) = text_lower.find(keyword) {
                    return Some((*profession, pos));
                }
            }
        }
        None
    }
}

impl Default for ProfessionKeywordTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Byte offset below which a PERSON span counts as a self-introduction
/// ("I'm John ...") and is therefore the customer.
const SELF_INTRO_WINDOW: usize = 5;

const REF_TRIGGER_WORDS: [&str; 5] = ["cancel", "booking", "retrieve", "find", "details"];

pub struct EntityExtractor {
    professions: ProfessionKeywordTable,
    uuid_re: Regex,
    labeled_ref_res: Vec<Regex>,
    bare_number_re: Regex,
    time_fallback_res: Vec<Regex>,
}

impl EntityExtractor {
    pub fn new(professions: ProfessionKeywordTable) -> Self {
        let re = |p: &str| Regex::new(p).expect("invalid entity pattern");
        Self {
            professions,
            uuid_re: re(
                r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
            ),
            labeled_ref_res: vec![
                re(r"(?i)booking\s*#?\s*(\d+)"),
                re(r"(?i)\bid\s*#?\s*(\d+)\b"),
                re(r"#\s*(\d+)"),
            ],
            bare_number_re: re(r"\b(\d+)\b"),
            time_fallback_res: vec![
                re(r"(?i)\b(?:day\s+after\s+tomorrow|tomorrow|today|tonight)\b(?:\s+(?:at\s+)?\d{1,2}(?::\d{2})?\s*(?:[ap]\.?m\.?)?)?"),
                re(r"(?i)\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tue|tues|wed|weds|thu|thur|thurs|fri|sat|sun)\b(?:\s+(?:at\s+)?\d{1,2}(?::\d{2})?\s*(?:[ap]\.?m\.?)?)?"),
                re(r"(?i)\b\d{1,2}(?::\d{2})?\s*[ap]\.?m\.?\b"),
                re(r"(?i)\b(?:morning|afternoon|evening|noon|midnight|night)\b"),
            ],
        }
    }

    /// Never fails: every entity is optional, and heuristics degrade
    /// gracefully when the labeling model found nothing.
    pub fn extract(&self, text: &str, spans: &[LabeledSpan]) -> ExtractedEntities {
        let text_lower = text.to_lowercase();
        let mut entities = ExtractedEntities {
            booking_id: self.extract_booking_ref(text, &text_lower),
            ..Default::default()
        };

        let detected = self.professions.detect(&text_lower);
        entities.profession = detected.map(|(p, _)| p).or_else(|| {
            // Keyword scan missed: fall back to a profession-tagged span.
            spans
                .iter()
                .filter(|s| s.category == SpanCategory::Profession)
                .find_map(|s| Profession::parse(&s.text))
        });

        self.split_names(spans, detected.map(|(_, pos)| pos), &text_lower, &mut entities);

        entities.time_phrase = self.extract_time_phrase(text, spans);

        tracing::debug!(?entities, "extracted entities");
        entities
    }

    /// Three-stage fallback, in strict precedence order: a UUID-shaped token,
    /// then an explicitly labeled number ("booking 123", "#123", "id 123"),
    /// then the first standalone integer, accepted only when a reference
    /// trigger word is present. Explicit structured ids must never be
    /// shadowed by a coincidental bare number.
    fn extract_booking_ref(&self, text: &str, text_lower: &str) -> Option<String> {
        if let Some(m) = self.uuid_re.find(text) {
            return Some(m.as_str().to_string());
        }

        for re in &self.labeled_ref_res {
            if let Some(caps) = re.captures(text) {
                return Some(caps[1].to_string());
            }
        }

        if REF_TRIGGER_WORDS.iter().any(|w| text_lower.contains(w)) {
            if let Some(caps) = self.bare_number_re.captures(text) {
                return Some(caps[1].to_string());
            }
        }

        None
    }

    /// Splits PERSON spans into customer vs technician. A span inside the
    /// self-introduction window is the customer; spans after the pivot (the
    /// matched profession keyword, or the literal connector "for") are
    /// technicians; leftovers fill whichever role is still open, customer
    /// first.
    fn split_names(
        &self,
        spans: &[LabeledSpan],
        keyword_pos: Option<usize>,
        text_lower: &str,
        entities: &mut ExtractedEntities,
    ) {
        let mut markers: Vec<&LabeledSpan> = Vec::new();

        for span in spans {
            if span.category != SpanCategory::Person {
                continue;
            }
            if span.start <= SELF_INTRO_WINDOW && entities.customer_name.is_none() {
                entities.customer_name = Some(span.text.clone());
            } else {
                markers.push(span);
            }
        }

        let pivot = keyword_pos.or_else(|| text_lower.find(" for ").map(|p| p + 1));

        if let Some(pivot) = pivot {
            if let Some(tech) = markers.iter().find(|m| m.start > pivot) {
                entities.technician_name = Some(tech.text.clone());
            }
            if entities.customer_name.is_none() {
                if let Some(cust) = markers.iter().find(|m| m.start < pivot) {
                    entities.customer_name = Some(cust.text.clone());
                }
            }
            markers.retain(|m| {
                Some(&m.text) != entities.technician_name.as_ref()
                    && Some(&m.text) != entities.customer_name.as_ref()
            });
        }

        if entities.technician_name.is_none() && !markers.is_empty() {
            if entities.customer_name.is_none() {
                entities.customer_name = Some(markers[0].text.clone());
                if markers.len() > 1 {
                    entities.technician_name = Some(markers[1].text.clone());
                }
            } else {
                entities.technician_name = Some(markers[0].text.clone());
            }
        }
    }

    /// Collects TIME/DATE-tagged spans and merges the first contiguous run
    /// into one phrase ("Friday" + "3 PM" → "Friday 3 PM"); tokens are merged
    /// rather than parsed individually. Falls back to textual patterns when
    /// the model tagged nothing.
    fn extract_time_phrase(&self, text: &str, spans: &[LabeledSpan]) -> Option<String> {
        let mut tagged: Vec<&LabeledSpan> = spans
            .iter()
            .filter(|s| matches!(s.category, SpanCategory::Time | SpanCategory::Date))
            .collect();
        tagged.sort_by_key(|s| s.start);

        if !tagged.is_empty() {
            let mut phrase = tagged[0].text.clone();
            let mut prev_end = tagged[0].start + tagged[0].text.len();
            for span in &tagged[1..] {
                if span.start <= prev_end + 3 {
                    phrase.push(' ');
                    phrase.push_str(&span.text);
                    prev_end = span.start + span.text.len();
                } else {
                    break;
                }
            }
            return Some(phrase);
        }

        self.time_fallback_res
            .iter()
            .find_map(|re| re.find(text))
            .map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EntityExtractor {
        EntityExtractor::new(ProfessionKeywordTable::standard())
    }

    fn person(text: &str, start: usize) -> LabeledSpan {
        LabeledSpan {
            category: SpanCategory::Person,
            text: text.to_string(),
            start,
        }
    }

    #[test]
    fn test_booking_ref_uuid_wins() {
        let e = extractor();
        let got = e.extract("cancel booking b56a726a-4ec2-4681-8fd4-b51ff2c19c19 number 99", &[]);
        assert_eq!(
            got.booking_id.as_deref(),
            Some("b56a726a-4ec2-4681-8fd4-b51ff2c19c19")
        );
    }

    #[test]
    fn test_booking_ref_labeled_number() {
        let e = extractor();
        assert_eq!(
            e.extract("Cancel booking #123", &[]).booking_id.as_deref(),
            Some("123")
        );
        assert_eq!(
            e.extract("details for id 55 please", &[]).booking_id.as_deref(),
            Some("55")
        );
    }

    #[test]
    fn test_booking_ref_bare_number_needs_trigger() {
        let e = extractor();
        // Trigger word present: bare number is accepted.
        assert_eq!(
            e.extract("retrieve 42 now", &[]).booking_id.as_deref(),
            Some("42")
        );
        // No trigger word: a bare number is not a booking reference.
        assert_eq!(e.extract("I have 3 cats", &[]).booking_id, None);
    }

    #[test]
    fn test_profession_keyword_scan() {
        let e = extractor();
        let got = e.extract("my sink is leaking badly", &[]);
        assert_eq!(got.profession, Some(Profession::Plumber));
    }

    #[test]
    fn test_profession_from_tagged_span_when_keywords_miss() {
        let e = extractor();
        let spans = vec![LabeledSpan {
            category: SpanCategory::Profession,
            text: "electrician".to_string(),
            start: 10,
        }];
        let got = e.extract("I need an expert at my house soon", &spans);
        assert_eq!(got.profession, Some(Profession::Electrician));
    }

    #[test]
    fn test_keyword_scan_beats_tagged_span() {
        let e = extractor();
        let spans = vec![LabeledSpan {
            category: SpanCategory::Profession,
            text: "welder".to_string(),
            start: 0,
        }];
        let got = e.extract("my sink is leaking badly", &spans);
        assert_eq!(got.profession, Some(Profession::Plumber));
    }

    #[test]
    fn test_profession_tie_break_table_order() {
        let e = extractor();
        // "pipe" (plumber) and "welding" (welder) both hit; plumber is listed
        // first in the table, so it wins.
        let got = e.extract("pipe welding job", &[]);
        assert_eq!(got.profession, Some(Profession::Plumber));
    }

    #[test]
    fn test_self_intro_is_customer() {
        let e = extractor();
        let text = "I'm John Doe and I need plumber Mike Johnson tomorrow";
        let spans = vec![person("John Doe", 4), person("Mike Johnson", 32)];
        let got = e.extract(text, &spans);
        assert_eq!(got.customer_name.as_deref(), Some("John Doe"));
        assert_eq!(got.technician_name.as_deref(), Some("Mike Johnson"));
        assert_eq!(got.profession, Some(Profession::Plumber));
    }

    #[test]
    fn test_name_after_for_pivot_is_technician() {
        let e = extractor();
        let text = "Make an appointment for Alice Smith";
        let spans = vec![person("Alice Smith", 24)];
        let got = e.extract(text, &spans);
        assert_eq!(got.technician_name.as_deref(), Some("Alice Smith"));
    }

    #[test]
    fn test_single_name_no_pivot_is_customer() {
        let e = extractor();
        let text = "something vague mentioning Bob Jones here";
        let spans = vec![person("Bob Jones", 27)];
        let got = e.extract(text, &spans);
        assert_eq!(got.customer_name.as_deref(), Some("Bob Jones"));
        assert_eq!(got.technician_name, None);
    }

    #[test]
    fn test_no_names_leaves_both_unset() {
        let e = extractor();
        let got = e.extract("book a plumber for tomorrow", &[]);
        assert_eq!(got.customer_name, None);
        assert_eq!(got.technician_name, None);
    }

    #[test]
    fn test_time_phrase_from_tagged_spans() {
        let e = extractor();
        let spans = vec![
            LabeledSpan {
                category: SpanCategory::Date,
                text: "Friday".to_string(),
                start: 10,
            },
            LabeledSpan {
                category: SpanCategory::Time,
                text: "3 PM".to_string(),
                start: 17,
            },
        ];
        let got = e.extract("see me on Friday 3 PM", &spans);
        assert_eq!(got.time_phrase.as_deref(), Some("Friday 3 PM"));
    }

    #[test]
    fn test_time_phrase_textual_fallback() {
        let e = extractor();
        let got = e.extract("Book a plumber for tomorrow at 2pm", &[]);
        assert_eq!(got.time_phrase.as_deref(), Some("tomorrow at 2pm"));
    }

    #[test]
    fn test_time_phrase_weekday_fallback() {
        let e = extractor();
        let got = e.extract("book an electrician friday at 3:30 pm", &[]);
        assert_eq!(got.time_phrase.as_deref(), Some("friday at 3:30 pm"));
    }
}
