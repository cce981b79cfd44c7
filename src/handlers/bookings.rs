use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::{auth, booking};
use crate::state::AppState;

/// Dates arrive either as plain days or full timestamps; a plain day means
/// midnight at the start of it.
fn parse_date(value: &str, field: &str) -> Result<NaiveDateTime, AppError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(AppError::Validation(format!("Invalid {field}: {value}")))
}

// POST /api/bookings
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub vehicle_id: String,
    pub start_date: String,
    pub end_date: String,
    pub notes: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let identity = auth::authenticate(&state, &headers).await?;

    let start_date = parse_date(&body.start_date, "start date")?;
    let end_date = parse_date(&body.end_date, "end date")?;

    let created = {
        let mut db = state.db.lock().unwrap();
        booking::create_booking(
            &mut db,
            &body.vehicle_id,
            &identity.email,
            start_date,
            end_date,
            body.notes,
        )?
    };

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "message": "Booking created successfully",
            "data": created,
        })),
    ))
}

// GET /api/bookings
pub async fn all_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    auth::authenticate(&state, &headers).await?;

    let bookings = {
        let db = state.db.lock().unwrap();
        booking::all_bookings(&db)?
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "data": bookings,
    })))
}

// GET /api/bookings/user/:user_email
pub async fn bookings_for_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_email): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let identity = auth::authenticate(&state, &headers).await?;

    let bookings = {
        let db = state.db.lock().unwrap();
        booking::bookings_for_user(&db, &user_email, &identity.email)?
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "data": bookings,
    })))
}

// DELETE /api/bookings/:id
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let identity = auth::authenticate(&state, &headers).await?;

    {
        let mut db = state.db.lock().unwrap();
        booking::cancel_booking(&mut db, &id, &identity.email)?;
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Booking cancelled successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_plain_day() {
        let dt = parse_date("2025-01-01", "start date").unwrap();
        assert_eq!(dt.to_string(), "2025-01-01 00:00:00");
    }

    #[test]
    fn test_parse_date_accepts_timestamps() {
        assert!(parse_date("2025-01-01T10:30:00", "start date").is_ok());
        assert!(parse_date("2025-01-01 10:30:00", "start date").is_ok());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        let err = parse_date("next tuesday", "start date").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
