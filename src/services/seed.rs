use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::models::{Availability, Vehicle, VehicleCategory};

/// Insert the sample fleet when the directory is empty. Returns how many
/// vehicles were written (zero when data already exists).
pub fn seed_vehicles(conn: &Connection) -> anyhow::Result<usize> {
    if queries::count_vehicles(conn)? > 0 {
        tracing::info!("vehicles table is not empty, skipping seed");
        return Ok(0);
    }

    let samples = sample_vehicles();
    for vehicle in &samples {
        queries::create_vehicle(conn, vehicle)?;
    }
    Ok(samples.len())
}

fn sample_vehicles() -> Vec<Vehicle> {
    let fleet = [
        (
            "BMW X5",
            "Mark Henry",
            VehicleCategory::Suv,
            180.0,
            "Dhaka, Banani",
            "Luxury SUV with powerful performance and elegant design.",
            "https://images.unsplash.com/photo-1614607242093-98b9e5b11b5e",
            "mark@example.com",
            "2025-11-02 10:00:00",
        ),
        (
            "Audi A6",
            "Olivia Parker",
            VehicleCategory::Sedan,
            140.0,
            "Chittagong, Nasirabad",
            "Business-class luxury sedan for executive comfort.",
            "https://images.unsplash.com/photo-1605559424843-9e4b78d7e5e4",
            "olivia@example.com",
            "2025-11-02 12:30:00",
        ),
        (
            "Jeep Wrangler",
            "Ethan Walker",
            VehicleCategory::Suv,
            110.0,
            "Sylhet, Zindabazar",
            "Adventure-ready off-roader for all terrains.",
            "https://images.unsplash.com/photo-1605559424210-9e8b78d7e5d9",
            "ethan@example.com",
            "2025-11-02 14:10:00",
        ),
        (
            "Hyundai Sonata",
            "Nora Davis",
            VehicleCategory::Sedan,
            70.0,
            "Rajshahi, City Point",
            "Smooth, quiet ride ideal for urban travel.",
            "https://images.unsplash.com/photo-1598133894008-4cf8e6d4c53f",
            "nora@example.com",
            "2025-11-02 16:20:00",
        ),
        (
            "Kia Sportage",
            "Liam Brown",
            VehicleCategory::Suv,
            95.0,
            "Khulna, Sonadanga",
            "Compact SUV balancing comfort and economy.",
            "https://images.unsplash.com/photo-1606813902779-8e0c6de62d5a",
            "liam@example.com",
            "2025-11-02 18:40:00",
        ),
        (
            "Tesla Model 3",
            "Sophia Turner",
            VehicleCategory::Electric,
            200.0,
            "Dhaka, Gulshan",
            "All-electric sedan with autopilot and instant torque.",
            "https://images.unsplash.com/photo-1560958089-b8a1929cea89",
            "sophia@example.com",
            "2025-11-03 09:15:00",
        ),
        (
            "Toyota HiAce",
            "Daniel Reed",
            VehicleCategory::Van,
            130.0,
            "Dhaka, Uttara",
            "Spacious van for group trips and family tours.",
            "https://images.unsplash.com/photo-1617469767053-8f35aaa39fce",
            "daniel@example.com",
            "2025-11-03 11:45:00",
        ),
    ];

    fleet
        .into_iter()
        .map(
            |(name, owner, category, price, location, description, image, email, created)| {
                let created_at =
                    NaiveDateTime::parse_from_str(created, "%Y-%m-%d %H:%M:%S").unwrap_or_else(
                        |_| chrono::Utc::now().naive_utc(),
                    );
                Vehicle {
                    id: Uuid::new_v4().to_string(),
                    vehicle_name: name.to_string(),
                    owner_name: owner.to_string(),
                    category,
                    price_per_day: price,
                    location: location.to_string(),
                    availability: Availability::Available,
                    description: description.to_string(),
                    cover_image: image.to_string(),
                    user_email: email.to_string(),
                    created_at,
                    updated_at: created_at,
                }
            },
        )
        .collect()
}
