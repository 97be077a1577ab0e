use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use uuid::Uuid;

use crate::errors::BookingError;
use crate::models::{Booking, Profession};

/// A candidate booking as submitted by a caller. The profession arrives as
/// raw text so the engine owns its (case-insensitive) validation regardless
/// of which boundary produced the request.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub customer_name: String,
    pub technician_name: String,
    pub profession: String,
    pub start_time: NaiveDateTime,
}

/// The single source of truth for bookings. All mutation goes through one
/// mutex so the conflict check and the insert of `create` form one atomic
/// unit under concurrent load.
pub struct BookingStore {
    bookings: Mutex<HashMap<String, Booking>>,
}

impl BookingStore {
    pub fn new() -> Self {
        Self {
            bookings: Mutex::new(HashMap::new()),
        }
    }

    pub fn list(&self) -> Vec<Booking> {
        let guard = self.bookings.lock().expect("booking store poisoned");
        let mut all: Vec<Booking> = guard.values().cloned().collect();
        all.sort_by_key(|b| b.start_time);
        all
    }

    pub fn get(&self, id: &str) -> Option<Booking> {
        let guard = self.bookings.lock().expect("booking store poisoned");
        guard.get(id).cloned()
    }

    /// Removes a booking entirely; no soft-delete. Returns false when the id
    /// is unknown, never an error, so cancellation is idempotent-safe.
    pub fn cancel(&self, id: &str) -> bool {
        let mut guard = self.bookings.lock().expect("booking store poisoned");
        guard.remove(id).is_some()
    }

    /// Validates and commits a one-hour booking. `bypass_time_check` skips
    /// only the past-start rejection and exists for seeding initial data.
    pub fn create(
        &self,
        request: BookingRequest,
        now: NaiveDateTime,
        bypass_time_check: bool,
    ) -> Result<Booking, BookingError> {
        let profession = Profession::parse(&request.profession).ok_or_else(|| {
            BookingError::UnsupportedProfession {
                given: request.profession.clone(),
                valid: Profession::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })?;

        let start_time = request.start_time;
        let end_time = start_time + Duration::hours(1);

        if !bypass_time_check && start_time < now {
            return Err(BookingError::PastBooking { start: start_time });
        }

        let mut guard = self.bookings.lock().expect("booking store poisoned");

        // Half-open interval intersection; touching boundaries do not
        // conflict.
        for existing in guard.values() {
            if !existing
                .technician_name
                .eq_ignore_ascii_case(&request.technician_name)
            {
                continue;
            }
            let overlap_start = start_time.max(existing.start_time);
            let overlap_end = end_time.min(existing.end_time);
            if overlap_start < overlap_end {
                return Err(BookingError::SchedulingConflict {
                    technician: existing.technician_name.clone(),
                    existing_start: existing.start_time,
                    existing_end: existing.end_time,
                });
            }
        }

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            customer_name: request.customer_name,
            technician_name: request.technician_name,
            profession,
            start_time,
            end_time,
        };
        guard.insert(booking.id.clone(), booking.clone());
        tracing::info!(
            id = %booking.id,
            technician = %booking.technician_name,
            start = %booking.start_time,
            "booking created"
        );
        Ok(booking)
    }

    /// Seeds the store with the stock historical bookings, bypassing the
    /// past-start check. A partial failure clears the store again.
    pub fn seed_initial_data(&self, now: NaiveDateTime) -> Result<(), BookingError> {
        if !self.list().is_empty() {
            return Ok(());
        }

        let seeds = [
            ("Nicolas Woollett", "Nicolas Woollett", "plumber", (2022, 10, 15, 10)),
            ("Franky Flay", "Franky Flay", "electrician", (2022, 10, 16, 18)),
            ("Griselda Dickson", "Griselda Dickson", "welder", (2022, 10, 18, 11)),
        ];

        for (customer, technician, profession, (y, m, d, h)) in seeds {
            let start_time = NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(h, 0, 0))
                .unwrap_or(now);
            let result = self.create(
                BookingRequest {
                    customer_name: customer.to_string(),
                    technician_name: technician.to_string(),
                    profession: profession.to_string(),
                    start_time,
                },
                now,
                true,
            );
            if let Err(e) = result {
                self.bookings
                    .lock()
                    .expect("booking store poisoned")
                    .clear();
                return Err(e);
            }
        }
        Ok(())
    }
}

impl Default for BookingStore {
    fn default() -> Self {
        Self::new()
    }
}

/// "Now" as wall-clock time in the configured business timezone. Seconds are
/// kept; only bookings care about whole hours.
pub fn local_now(tz: chrono_tz::Tz) -> NaiveDateTime {
    chrono::Utc::now()
        .with_timezone(&tz)
        .naive_local()
        .with_nanosecond(0)
        .unwrap_or_else(|| chrono::Utc::now().with_timezone(&tz).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn request(technician: &str, start: &str) -> BookingRequest {
        BookingRequest {
            customer_name: "Alice".to_string(),
            technician_name: technician.to_string(),
            profession: "plumber".to_string(),
            start_time: dt(start),
        }
    }

    fn now() -> NaiveDateTime {
        dt("2025-06-16 08:00")
    }

    #[test]
    fn test_create_sets_one_hour_duration() {
        let store = BookingStore::new();
        let booking = store.create(request("Bob", "2025-06-16 10:00"), now(), false).unwrap();
        assert_eq!(booking.end_time - booking.start_time, Duration::hours(1));
    }

    #[test]
    fn test_profession_case_insensitive() {
        let store = BookingStore::new();
        let mut req = request("Bob", "2025-06-16 10:00");
        req.profession = "PLUMBER".to_string();
        assert!(store.create(req, now(), false).is_ok());
    }

    #[test]
    fn test_unsupported_profession() {
        let store = BookingStore::new();
        let mut req = request("Bob", "2025-06-16 10:00");
        req.profession = "astronaut".to_string();
        let err = store.create(req, now(), false).unwrap_err();
        assert!(matches!(err, BookingError::UnsupportedProfession { .. }));
    }

    #[test]
    fn test_past_booking_rejected() {
        let store = BookingStore::new();
        let err = store
            .create(request("Bob", "2025-06-15 10:00"), now(), false)
            .unwrap_err();
        assert!(matches!(err, BookingError::PastBooking { .. }));
    }

    #[test]
    fn test_past_booking_allowed_with_bypass() {
        let store = BookingStore::new();
        assert!(store
            .create(request("Bob", "2022-01-01 10:00"), now(), true)
            .is_ok());
    }

    #[test]
    fn test_overlap_conflict() {
        let store = BookingStore::new();
        store.create(request("Bob", "2025-06-16 10:00"), now(), false).unwrap();
        let err = store
            .create(request("Bob", "2025-06-16 10:30"), now(), false)
            .unwrap_err();
        assert!(matches!(err, BookingError::SchedulingConflict { .. }));
    }

    #[test]
    fn test_conflict_is_case_insensitive_on_technician() {
        let store = BookingStore::new();
        store.create(request("Bob", "2025-06-16 10:00"), now(), false).unwrap();
        let err = store
            .create(request("BOB", "2025-06-16 10:30"), now(), false)
            .unwrap_err();
        assert!(matches!(err, BookingError::SchedulingConflict { .. }));
    }

    #[test]
    fn test_touching_boundaries_do_not_conflict() {
        let store = BookingStore::new();
        store.create(request("Bob", "2025-06-16 10:00"), now(), false).unwrap();
        assert!(store
            .create(request("Bob", "2025-06-16 11:00"), now(), false)
            .is_ok());
    }

    #[test]
    fn test_other_technician_may_overlap() {
        let store = BookingStore::new();
        store.create(request("Bob", "2025-06-16 10:00"), now(), false).unwrap();
        assert!(store
            .create(request("Carol", "2025-06-16 10:30"), now(), false)
            .is_ok());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let store = BookingStore::new();
        let booking = store.create(request("Bob", "2025-06-16 10:00"), now(), false).unwrap();
        assert!(store.cancel(&booking.id));
        assert!(!store.cancel(&booking.id));
        assert!(!store.cancel("no-such-id"));
    }

    #[test]
    fn test_get_and_list() {
        let store = BookingStore::new();
        let b1 = store.create(request("Bob", "2025-06-16 12:00"), now(), false).unwrap();
        let b2 = store.create(request("Carol", "2025-06-16 10:00"), now(), false).unwrap();

        assert_eq!(store.get(&b1.id).unwrap().id, b1.id);
        assert!(store.get("missing").is_none());

        // Listing is ordered by start time.
        let all = store.list();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b2.id);
        assert_eq!(all[1].id, b1.id);
    }

    #[test]
    fn test_seed_initial_data_is_idempotent() {
        let store = BookingStore::new();
        store.seed_initial_data(now()).unwrap();
        assert_eq!(store.list().len(), 3);
        store.seed_initial_data(now()).unwrap();
        assert_eq!(store.list().len(), 3);
    }
}
