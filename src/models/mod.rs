pub mod booking;
pub mod command;

pub use booking::{Booking, Profession};
pub use command::{CommandFields, Intent, ParsedCommand};
