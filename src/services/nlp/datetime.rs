use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::Regex;

use crate::errors::InterpretError;
use crate::services::ai::TextGenerator;

/// Daily window during which a booking may start. Half-open:
/// `open_hour <= hour < close_hour`.
#[derive(Debug, Clone, Copy)]
pub struct BusinessHoursPolicy {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl BusinessHoursPolicy {
    pub fn new(open_hour: u32, close_hour: u32) -> Self {
        Self { open_hour, close_hour }
    }

    pub fn contains(&self, dt: &NaiveDateTime) -> bool {
        (self.open_hour..self.close_hour).contains(&dt.hour())
    }

    /// Shifts an out-of-hours instant into the window: before opening moves
    /// to opening time the same day, at/after closing moves to opening time
    /// the next day.
    pub fn clamp(&self, dt: NaiveDateTime) -> NaiveDateTime {
        if self.contains(&dt) {
            return dt;
        }
        let open = NaiveTime::from_hms_opt(self.open_hour, 0, 0).unwrap_or_default();
        if dt.hour() < self.open_hour {
            dt.date().and_time(open)
        } else {
            (dt.date() + Duration::days(1)).and_time(open)
        }
    }
}

const GENERATIVE_RETRIES: u32 = 3;

/// Converts a raw time phrase (or, as last resort, the whole utterance) into
/// a concrete future instant within business hours. Deterministic given
/// `now` except for the optional generative reinterpretation step, which is
/// itself validated against a strict canonical format. Resolution order:
/// weekday name, relative-day word, named period, explicit am/pm clock,
/// explicit textual formats, generative reinterpretation, and finally the
/// next business day at opening hour.
pub struct DateTimeResolver {
    policy: BusinessHoursPolicy,
    default_booking_hour: u32,
    last_booking_hour: u32,
    generator: Option<Arc<dyn TextGenerator>>,
    weekday_re: Regex,
    clock_re: Regex,
    clock24_re: Regex,
    canonical_re: Regex,
}

impl DateTimeResolver {
    pub fn new(
        policy: BusinessHoursPolicy,
        default_booking_hour: u32,
        last_booking_hour: u32,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let re = |p: &str| Regex::new(p).expect("invalid datetime pattern");
        Self {
            policy,
            default_booking_hour,
            last_booking_hour,
            generator,
            weekday_re: re(
                r"\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues|tue|weds|wed|thurs|thur|thu|fri|sat|sun)\b",
            ),
            clock_re: re(r"\b(\d{1,2})(?::(\d{2}))?\s*([ap])\.?m\.?\b"),
            clock24_re: re(r"\b(\d{1,2}):(\d{2})\b"),
            canonical_re: re(r"^DATE:\s*(\d{4})-(\d{2})-(\d{2})\s*\|\s*TIME:\s*(\d{2}):(\d{2})$"),
        }
    }

    /// Never fails: when every strategy is exhausted the resolver falls back
    /// to the next business day at opening hour. Every path, including the
    /// generative one, passes through the business-hours clamp.
    pub async fn resolve(&self, phrase: &str, now: NaiveDateTime) -> NaiveDateTime {
        match self.try_resolve(phrase, now).await {
            Ok(dt) => dt,
            Err(e) => {
                tracing::debug!(error = %e, "using next business day");
                self.next_business_day_open(now)
            }
        }
    }

    /// Like [`resolve`](Self::resolve), but reports exhaustion instead of
    /// applying the fallback, for callers that want to surface it.
    pub async fn try_resolve(
        &self,
        phrase: &str,
        now: NaiveDateTime,
    ) -> Result<NaiveDateTime, InterpretError> {
        if let Some(dt) = self.resolve_deterministic(phrase, now) {
            return Ok(self.policy.clamp(dt));
        }
        if let Some(dt) = self.resolve_generative(phrase, now).await {
            return Ok(self.policy.clamp(dt));
        }
        Err(InterpretError::DateTimeUnresolvable(phrase.to_string()))
    }

    fn resolve_deterministic(&self, phrase: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let lower = phrase.to_lowercase();

        let day: Option<NaiveDate> = match self.weekday_target(&lower) {
            Some(target) => Some(next_weekday(now.date(), target)),
            None => relative_day_offset(&lower).map(|n| now.date() + Duration::days(n)),
        };
        let time = self.clock_time(&lower).or_else(|| named_period(&lower));

        let mut dt = match (day, time) {
            (Some(d), Some(t)) => d.and_time(t),
            // Day only: keep the current hour with minutes zeroed; the
            // business-hours clamp settles the rest.
            (Some(d), None) => d.and_time(NaiveTime::from_hms_opt(now.hour(), 0, 0)?),
            (None, Some(t)) => now.date().and_time(t),
            (None, None) => self.parse_explicit_formats(phrase.trim(), now)?,
        };

        if dt <= now {
            dt += Duration::days(1);
            if dt <= now {
                return None;
            }
        }
        Some(dt)
    }

    fn weekday_target(&self, lower: &str) -> Option<u32> {
        let m = self.weekday_re.find(lower)?;
        let idx = match &m.as_str()[..3] {
            "mon" => 0,
            "tue" => 1,
            "wed" => 2,
            "thu" => 3,
            "fri" => 4,
            "sat" => 5,
            "sun" => 6,
            _ => return None,
        };
        Some(idx)
    }

    /// Explicit `H[:MM] am|pm` clock time. Omitted minutes are forced to 0,
    /// never inherited from anywhere else.
    fn clock_time(&self, lower: &str) -> Option<NaiveTime> {
        let caps = self.clock_re.captures(lower)?;
        let hour12: u32 = caps[1].parse().ok()?;
        if hour12 == 0 || hour12 > 12 {
            return None;
        }
        let minute: u32 = caps
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        let hour = match (&caps[3], hour12) {
            ("a", 12) => 0,
            ("a", h) => h,
            ("p", 12) => 12,
            (_, h) => h + 12,
        };
        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    /// Bounded textual formats tried when no heuristic token was found:
    /// full datetimes, bare dates (at the default booking hour), and bare
    /// 24-hour clock times (today).
    fn parse_explicit_formats(&self, s: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
        for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%d/%m/%Y %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt);
            }
        }
        for fmt in ["%Y-%m-%d", "%d/%m/%Y"] {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return d.and_hms_opt(self.default_booking_hour, 0, 0);
            }
        }
        if let Some(caps) = self.clock24_re.captures(s) {
            let hour: u32 = caps[1].parse().ok()?;
            let minute: u32 = caps[2].parse().ok()?;
            // Interpreted as today; the past-bump in the caller moves it
            // forward if needed.
            if let Some(t) = NaiveTime::from_hms_opt(hour, minute, 0) {
                return Some(now.date().and_time(t));
            }
        }
        None
    }

    async fn resolve_generative(&self, phrase: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let generator = self.generator.as_ref()?;
        let prompt = self.build_prompt(phrase, now);

        for attempt in 1..=GENERATIVE_RETRIES {
            let output = match generator.generate(&prompt).await {
                Ok(o) => o,
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "generative reinterpretation failed");
                    continue;
                }
            };
            match self.parse_canonical(output.trim()) {
                Some(mut dt) => {
                    if dt <= now {
                        // Same calendar day means the model picked today but
                        // too early; push a full week, otherwise one day.
                        let days = if dt.date() == now.date() { 7 } else { 1 };
                        dt += Duration::days(days);
                    }
                    return Some(dt);
                }
                None => {
                    tracing::warn!(attempt, output, "generative output not in canonical form");
                }
            }
        }
        None
    }

    fn build_prompt(&self, text: &str, now: NaiveDateTime) -> String {
        format!(
            "Convert the natural language expression into a future date and time.\n\
             Current time: {} ({}).\n\
             Answer strictly in the format: DATE: YYYY-MM-DD | TIME: HH:MM\n\
             Use 24-hour time with leading zeros. The result must be in the future.\n\
             Expression: {}\n\
             Answer:",
            now.format("%Y-%m-%d %H:%M"),
            now.format("%A"),
            text
        )
    }

    /// Accepts only the strict canonical `DATE: YYYY-MM-DD | TIME: HH:MM`
    /// form; anything else is rejected and retried.
    fn parse_canonical(&self, s: &str) -> Option<NaiveDateTime> {
        let caps = self.canonical_re.captures(s)?;
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        let time = NaiveTime::from_hms_opt(caps[4].parse().ok()?, caps[5].parse().ok()?, 0)?;
        Some(date.and_time(time))
    }

    /// Default slot when the user gave no time at all: the next full hour,
    /// or the next day at the default booking hour when it is already past
    /// the last bookable hour.
    pub fn default_booking_time(&self, now: NaiveDateTime) -> NaiveDateTime {
        let dt = if now.hour() >= self.last_booking_hour || now.hour() >= 23 {
            (now.date() + Duration::days(1))
                .and_hms_opt(self.default_booking_hour, 0, 0)
                .unwrap_or(now)
        } else {
            now.date()
                .and_hms_opt(now.hour() + 1, 0, 0)
                .unwrap_or(now)
        };
        self.policy.clamp(dt)
    }

    pub fn next_business_day_open(&self, now: NaiveDateTime) -> NaiveDateTime {
        (now.date() + Duration::days(1))
            .and_hms_opt(self.policy.open_hour, 0, 0)
            .unwrap_or(now)
    }
}

/// Next future occurrence of the target weekday (Monday=0). If today already
/// is that weekday, skips to next week; it never returns the same day.
fn next_weekday(today: NaiveDate, target: u32) -> NaiveDate {
    let current = today.weekday().num_days_from_monday();
    let mut ahead = (target + 7 - current) % 7;
    if ahead == 0 {
        ahead = 7;
    }
    today + Duration::days(ahead as i64)
}

fn relative_day_offset(lower: &str) -> Option<i64> {
    if lower.contains("day after tomorrow") {
        Some(2)
    } else if lower.contains("tomorrow") {
        Some(1)
    } else if lower.contains("today") || lower.contains("tonight") {
        Some(0)
    } else {
        None
    }
}

// Longer tokens first: "afternoon" contains "noon" and "midnight" contains
// "night", so the check order is load-bearing.
fn named_period(lower: &str) -> Option<NaiveTime> {
    let hour = if lower.contains("morning") {
        9
    } else if lower.contains("afternoon") {
        14
    } else if lower.contains("evening") {
        17
    } else if lower.contains("midnight") {
        0
    } else if lower.contains("night") {
        20
    } else if lower.contains("noon") {
        12
    } else {
        return None;
    };
    NaiveTime::from_hms_opt(hour, 0, 0)
}
