use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::Vehicle;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub vehicle_id: String,
    pub user_email: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub total_price: f64,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Booking joined with its vehicle, the shape every listing endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct BookingWithVehicle {
    #[serde(flatten)]
    pub booking: Booking,
    pub vehicle: Vehicle,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}
