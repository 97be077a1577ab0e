use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A confirmed one-hour service slot. `end_time` is always
/// `start_time + 1h` and is computed by the scheduling engine; it is never
/// accepted from a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub technician_name: String,
    pub profession: Profession,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

/// The closed set of technician professions the system books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profession {
    Plumber,
    Welder,
    Electrician,
    Carpenter,
    Mechanic,
    Painter,
    Chef,
    Gardener,
    Teacher,
    Developer,
    Nurse,
}

impl Profession {
    pub const ALL: [Profession; 11] = [
        Profession::Plumber,
        Profession::Welder,
        Profession::Electrician,
        Profession::Carpenter,
        Profession::Mechanic,
        Profession::Painter,
        Profession::Chef,
        Profession::Gardener,
        Profession::Teacher,
        Profession::Developer,
        Profession::Nurse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profession::Plumber => "plumber",
            Profession::Welder => "welder",
            Profession::Electrician => "electrician",
            Profession::Carpenter => "carpenter",
            Profession::Mechanic => "mechanic",
            Profession::Painter => "painter",
            Profession::Chef => "chef",
            Profession::Gardener => "gardener",
            Profession::Teacher => "teacher",
            Profession::Developer => "developer",
            Profession::Nurse => "nurse",
        }
    }

    /// Case-insensitive lookup: "Plumber", "plumber" and " PLUMBER " all resolve.
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        Profession::ALL.iter().copied().find(|p| p.as_str() == lower)
    }
}

impl std::fmt::Display for Profession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Profession {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profession::parse(s).ok_or(())
    }
}
