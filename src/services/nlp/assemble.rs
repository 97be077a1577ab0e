use chrono::NaiveDateTime;

use super::entities::ExtractedEntities;
use crate::errors::InterpretError;
use crate::models::{CommandFields, Intent, ParsedCommand, Profession};

/// Defaults the assembler applies to a create command when extraction left a
/// field unset.
#[derive(Debug, Clone)]
pub struct AssembleDefaults {
    pub customer_name: String,
    pub technician_name: String,
    pub profession: Profession,
}

/// Merges intent and extracted entities into an immutable structured
/// command. Applies per-intent defaults, then enforces per-intent required
/// fields; a missing required field surfaces as a named error rather than a
/// silently dropped value.
pub fn assemble(
    intent: Intent,
    confidence: f64,
    entities: ExtractedEntities,
    start_time: Option<NaiveDateTime>,
    default_start: NaiveDateTime,
    defaults: &AssembleDefaults,
) -> Result<ParsedCommand, InterpretError> {
    let fields = match intent {
        Intent::CreateBooking => CommandFields::Create {
            customer_name: entities
                .customer_name
                .unwrap_or_else(|| defaults.customer_name.clone()),
            technician_name: entities
                .technician_name
                .unwrap_or_else(|| defaults.technician_name.clone()),
            profession: entities.profession.unwrap_or(defaults.profession),
            start_time: start_time.unwrap_or(default_start),
        },
        Intent::CancelBooking => CommandFields::Cancel {
            booking_id: entities.booking_id.ok_or(InterpretError::MissingField {
                intent,
                field: "booking_id",
            })?,
        },
        Intent::RetrieveBooking => CommandFields::Retrieve {
            booking_id: entities.booking_id.ok_or(InterpretError::MissingField {
                intent,
                field: "booking_id",
            })?,
        },
        Intent::ListBookings => CommandFields::List,
        Intent::Unknown => {
            return Err(InterpretError::UnknownIntent(intent.as_str().to_string()))
        }
    };

    Ok(ParsedCommand {
        intent,
        confidence,
        fields,
    })
}
