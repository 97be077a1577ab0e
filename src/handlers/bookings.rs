use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Booking, CommandFields, Intent};
use crate::services::booking::BookingRequest;
use crate::services::local_now;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateBookingBody {
    pub customer_name: String,
    pub technician_name: String,
    pub profession: String,
    pub start_time: NaiveDateTime,
}

#[derive(Deserialize)]
pub struct CommandBody {
    pub message: String,
}

/// Result of one interpreted command. `booking`/`bookings` are populated
/// depending on which operation ran.
#[derive(Serialize)]
pub struct CommandResponse {
    pub intent: Intent,
    pub confidence: f64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<Booking>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookings: Option<Vec<Booking>>,
}

// GET /bookings
pub async fn list_bookings(State(state): State<Arc<AppState>>) -> Json<Vec<Booking>> {
    Json(state.store.list())
}

// GET /bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    state
        .store
        .get(&id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let now = local_now(state.config.timezone);
    let booking = state.store.create(
        BookingRequest {
            customer_name: body.customer_name,
            technician_name: body.technician_name,
            profession: body.profession,
            start_time: body.start_time,
        },
        now,
        false,
    )?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// DELETE /bookings/:id
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.store.cancel(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("booking {id}")))
    }
}

// POST /bookings/commands
//
// Interprets a free-text instruction and executes the resulting operation in
// one round trip.
pub async fn run_command(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CommandBody>,
) -> Result<Json<CommandResponse>, AppError> {
    let now = local_now(state.config.timezone);
    let command = state.nlp.parse_user_input(&body.message, now).await?;

    let response = match command.fields {
        CommandFields::Create {
            customer_name,
            technician_name,
            profession,
            start_time,
        } => {
            let booking = state.store.create(
                BookingRequest {
                    customer_name,
                    technician_name,
                    profession: profession.as_str().to_string(),
                    start_time,
                },
                now,
                false,
            )?;
            CommandResponse {
                intent: command.intent,
                confidence: command.confidence,
                message: format!(
                    "Booked {} ({}) for {} at {}",
                    booking.technician_name,
                    booking.profession,
                    booking.customer_name,
                    booking.start_time.format("%Y-%m-%d %H:%M"),
                ),
                booking: Some(booking),
                bookings: None,
            }
        }
        CommandFields::Cancel { booking_id } => {
            if !state.store.cancel(&booking_id) {
                return Err(AppError::NotFound(format!("booking {booking_id}")));
            }
            CommandResponse {
                intent: command.intent,
                confidence: command.confidence,
                message: format!("Booking {booking_id} cancelled"),
                booking: None,
                bookings: None,
            }
        }
        CommandFields::Retrieve { booking_id } => {
            let booking = state
                .store
                .get(&booking_id)
                .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;
            CommandResponse {
                intent: command.intent,
                confidence: command.confidence,
                message: format!(
                    "Booking {} is {} ({}) at {}",
                    booking.id,
                    booking.technician_name,
                    booking.profession,
                    booking.start_time.format("%Y-%m-%d %H:%M"),
                ),
                booking: Some(booking),
                bookings: None,
            }
        }
        CommandFields::List => {
            let all = state.store.list();
            CommandResponse {
                intent: command.intent,
                confidence: command.confidence,
                message: format!("{} booking(s) on record", all.len()),
                booking: None,
                bookings: Some(all),
            }
        }
    };

    Ok(Json(response))
}
