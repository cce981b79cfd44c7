use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub vehicle_name: String,
    pub owner_name: String,
    pub category: VehicleCategory,
    pub price_per_day: f64,
    pub location: String,
    pub availability: Availability,
    pub description: String,
    pub cover_image: String,
    pub user_email: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum VehicleCategory {
    Sedan,
    #[serde(rename = "SUV")]
    Suv,
    Electric,
    Van,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Sedan => "Sedan",
            VehicleCategory::Suv => "SUV",
            VehicleCategory::Electric => "Electric",
            VehicleCategory::Van => "Van",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Sedan" => Some(VehicleCategory::Sedan),
            "SUV" => Some(VehicleCategory::Suv),
            "Electric" => Some(VehicleCategory::Electric),
            "Van" => Some(VehicleCategory::Van),
            _ => None,
        }
    }
}

/// Gate for new bookings. Flipped Available -> Booked by a conditional
/// update so only one concurrent booking can win.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Availability {
    Available,
    Booked,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::Booked => "Booked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Available" => Some(Availability::Available),
            "Booked" => Some(Availability::Booked),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip() {
        for s in ["Sedan", "SUV", "Electric", "Van"] {
            assert_eq!(VehicleCategory::parse(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn test_category_rejects_unknown() {
        assert!(VehicleCategory::parse("Truck").is_none());
        assert!(VehicleCategory::parse("suv").is_none());
    }

    #[test]
    fn test_availability_parse() {
        assert_eq!(
            Availability::parse("Available"),
            Some(Availability::Available)
        );
        assert_eq!(Availability::parse("Booked"), Some(Availability::Booked));
        assert!(Availability::parse("available").is_none());
    }

    #[test]
    fn test_category_serde_matches_wire_names() {
        let json = serde_json::to_string(&VehicleCategory::Suv).unwrap();
        assert_eq!(json, "\"SUV\"");
        let parsed: VehicleCategory = serde_json::from_str("\"Sedan\"").unwrap();
        assert_eq!(parsed, VehicleCategory::Sedan);
    }
}
