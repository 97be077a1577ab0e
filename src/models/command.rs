use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Profession;

/// The category of operation a user utterance requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreateBooking,
    CancelBooking,
    RetrieveBooking,
    ListBookings,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CreateBooking => "create_booking",
            Intent::CancelBooking => "cancel_booking",
            Intent::RetrieveBooking => "retrieve_booking",
            Intent::ListBookings => "list_bookings",
            Intent::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields carried by a parsed command, one variant per intent. This replaces
/// a stringly-keyed map: a `Cancel` command cannot be missing its booking id
/// by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandFields {
    Create {
        customer_name: String,
        technician_name: String,
        profession: Profession,
        start_time: NaiveDateTime,
    },
    Cancel {
        booking_id: String,
    },
    Retrieve {
        booking_id: String,
    },
    List,
}

/// The interpreter's final output: intent, classification confidence, and
/// the intent-specific fields. Immutable once built by the command assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub intent: Intent,
    pub confidence: f64,
    pub fields: CommandFields,
}
