use chrono::NaiveDateTime;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{normalize_email, Availability, Booking, BookingStatus, BookingWithVehicle};

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole rental days between two instants, partial days rounded up.
pub fn duration_days(start: &NaiveDateTime, end: &NaiveDateTime) -> i64 {
    let seconds = (*end - *start).num_seconds();
    (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
}

/// Reserve a vehicle for a date range.
///
/// The availability flip and the booking insert happen in one transaction,
/// and the flip is conditional on the vehicle still being Available, so two
/// concurrent calls on the same vehicle resolve to one success and one
/// Conflict. The price is snapshotted from the vehicle's current rate.
pub fn create_booking(
    conn: &mut Connection,
    vehicle_id: &str,
    user_email: &str,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
    notes: Option<String>,
) -> Result<BookingWithVehicle, AppError> {
    if start_date >= end_date {
        return Err(AppError::Validation(
            "End date must be after start date".to_string(),
        ));
    }

    let vehicle = queries::get_vehicle(conn, vehicle_id)?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let days = duration_days(&start_date, &end_date);
    let total_price = days as f64 * vehicle.price_per_day;

    let now = chrono::Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        vehicle_id: vehicle.id.clone(),
        user_email: normalize_email(user_email),
        start_date,
        end_date,
        total_price,
        status: BookingStatus::Confirmed,
        notes,
        created_at: now,
        updated_at: now,
    };

    let tx = conn.transaction()?;

    let won = queries::transition_availability(
        &tx,
        &booking.vehicle_id,
        Availability::Available,
        Availability::Booked,
    )?;
    if !won {
        // Rolls back on drop; nothing has been written.
        return Err(AppError::Conflict("Vehicle is not available".to_string()));
    }

    queries::create_booking(&tx, &booking)?;
    tx.commit()?;

    queries::booking_with_vehicle(conn, &booking.id)?
        .ok_or_else(|| anyhow::anyhow!("booking vanished after insert: {}", booking.id).into())
}

/// Soft-cancel: the row is kept for history, only its status changes, and
/// the vehicle is released in the same transaction.
pub fn cancel_booking(
    conn: &mut Connection,
    booking_id: &str,
    requester_email: &str,
) -> Result<(), AppError> {
    let booking = queries::get_booking(conn, booking_id)?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.user_email != normalize_email(requester_email) {
        return Err(AppError::Forbidden(
            "Not authorized to cancel this booking".to_string(),
        ));
    }

    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::Conflict(
            "Booking is already cancelled".to_string(),
        ));
    }

    let tx = conn.transaction()?;
    queries::set_availability(&tx, &booking.vehicle_id, Availability::Available)?;
    queries::update_booking_status(&tx, booking_id, BookingStatus::Cancelled)?;
    tx.commit()?;

    Ok(())
}

/// A caller may only list their own bookings, newest first.
pub fn bookings_for_user(
    conn: &Connection,
    user_email: &str,
    requester_email: &str,
) -> Result<Vec<BookingWithVehicle>, AppError> {
    let target = normalize_email(user_email);
    if target != normalize_email(requester_email) {
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    Ok(queries::bookings_for_user(conn, &target)?)
}

/// Unfiltered listing for any authenticated caller, newest first.
pub fn all_bookings(conn: &Connection) -> Result<Vec<BookingWithVehicle>, AppError> {
    Ok(queries::all_bookings(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Vehicle, VehicleCategory};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn insert_vehicle(conn: &Connection, id: &str, price_per_day: f64) -> Vehicle {
        let now = chrono::Utc::now().naive_utc();
        let vehicle = Vehicle {
            id: id.to_string(),
            vehicle_name: "BMW X5".to_string(),
            owner_name: "Mark Henry".to_string(),
            category: VehicleCategory::Suv,
            price_per_day,
            location: "Dhaka, Banani".to_string(),
            availability: Availability::Available,
            description: "Luxury SUV with powerful performance.".to_string(),
            cover_image: "https://images.example.com/x5.jpg".to_string(),
            user_email: "mark@example.com".to_string(),
            created_at: now,
            updated_at: now,
        };
        queries::create_vehicle(conn, &vehicle).unwrap();
        vehicle
    }

    #[test]
    fn test_duration_rounds_partial_days_up() {
        assert_eq!(duration_days(&dt("2025-01-01 00:00"), &dt("2025-01-04 00:00")), 3);
        assert_eq!(duration_days(&dt("2025-01-01 10:00"), &dt("2025-01-02 11:00")), 2);
        assert_eq!(duration_days(&dt("2025-01-01 10:00"), &dt("2025-01-01 11:00")), 1);
    }

    #[test]
    fn test_create_booking_flips_availability_and_prices() {
        let mut conn = setup_db();
        insert_vehicle(&conn, "v1", 100.0);

        let created = create_booking(
            &mut conn,
            "v1",
            "renter@example.com",
            dt("2025-01-01 00:00"),
            dt("2025-01-04 00:00"),
            None,
        )
        .unwrap();

        assert_eq!(created.booking.total_price, 300.0);
        assert_eq!(created.booking.status, BookingStatus::Confirmed);
        assert_eq!(created.vehicle.availability, Availability::Booked);

        let stored = queries::get_vehicle(&conn, "v1").unwrap().unwrap();
        assert_eq!(stored.availability, Availability::Booked);
    }

    #[test]
    fn test_create_booking_on_booked_vehicle_conflicts_without_writes() {
        let mut conn = setup_db();
        insert_vehicle(&conn, "v1", 100.0);

        create_booking(
            &mut conn,
            "v1",
            "first@example.com",
            dt("2025-01-01 00:00"),
            dt("2025-01-02 00:00"),
            None,
        )
        .unwrap();

        let err = create_booking(
            &mut conn,
            "v1",
            "second@example.com",
            dt("2025-02-01 00:00"),
            dt("2025-02-02 00:00"),
            None,
        )
        .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(queries::count_bookings_for_vehicle(&conn, "v1").unwrap(), 1);
    }

    #[test]
    fn test_create_booking_rejects_inverted_dates() {
        let mut conn = setup_db();
        insert_vehicle(&conn, "v1", 100.0);

        let err = create_booking(
            &mut conn,
            "v1",
            "renter@example.com",
            dt("2025-01-04 00:00"),
            dt("2025-01-01 00:00"),
            None,
        )
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(queries::count_bookings_for_vehicle(&conn, "v1").unwrap(), 0);
    }

    #[test]
    fn test_create_booking_unknown_vehicle() {
        let mut conn = setup_db();

        let err = create_booking(
            &mut conn,
            "missing",
            "renter@example.com",
            dt("2025-01-01 00:00"),
            dt("2025-01-02 00:00"),
            None,
        )
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_price_is_snapshotted_at_creation() {
        let mut conn = setup_db();
        let mut vehicle = insert_vehicle(&conn, "v1", 100.0);

        let created = create_booking(
            &mut conn,
            "v1",
            "renter@example.com",
            dt("2025-01-01 00:00"),
            dt("2025-01-04 00:00"),
            None,
        )
        .unwrap();
        assert_eq!(created.booking.total_price, 300.0);

        // Raising the rate afterwards must not change the stored total.
        vehicle.price_per_day = 500.0;
        queries::update_vehicle(&conn, &vehicle).unwrap();

        let stored = queries::get_booking(&conn, &created.booking.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_price, 300.0);
    }

    #[test]
    fn test_cancel_by_owner_releases_vehicle() {
        let mut conn = setup_db();
        insert_vehicle(&conn, "v1", 100.0);

        let created = create_booking(
            &mut conn,
            "v1",
            "renter@example.com",
            dt("2025-01-01 00:00"),
            dt("2025-01-04 00:00"),
            None,
        )
        .unwrap();

        cancel_booking(&mut conn, &created.booking.id, "renter@example.com").unwrap();

        let booking = queries::get_booking(&conn, &created.booking.id)
            .unwrap()
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);

        let vehicle = queries::get_vehicle(&conn, "v1").unwrap().unwrap();
        assert_eq!(vehicle.availability, Availability::Available);
    }

    #[test]
    fn test_cancel_by_non_owner_forbidden_and_unchanged() {
        let mut conn = setup_db();
        insert_vehicle(&conn, "v1", 100.0);

        let created = create_booking(
            &mut conn,
            "v1",
            "renter@example.com",
            dt("2025-01-01 00:00"),
            dt("2025-01-04 00:00"),
            None,
        )
        .unwrap();

        let err = cancel_booking(&mut conn, &created.booking.id, "other@example.com").unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let booking = queries::get_booking(&conn, &created.booking.id)
            .unwrap()
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);

        let vehicle = queries::get_vehicle(&conn, "v1").unwrap().unwrap();
        assert_eq!(vehicle.availability, Availability::Booked);
    }

    #[test]
    fn test_cancel_twice_conflicts() {
        let mut conn = setup_db();
        insert_vehicle(&conn, "v1", 100.0);

        let created = create_booking(
            &mut conn,
            "v1",
            "renter@example.com",
            dt("2025-01-01 00:00"),
            dt("2025-01-04 00:00"),
            None,
        )
        .unwrap();

        cancel_booking(&mut conn, &created.booking.id, "renter@example.com").unwrap();
        let err = cancel_booking(&mut conn, &created.booking.id, "renter@example.com").unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_cancel_unknown_booking() {
        let mut conn = setup_db();
        let err = cancel_booking(&mut conn, "missing", "renter@example.com").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_ownership_check_ignores_email_case() {
        let mut conn = setup_db();
        insert_vehicle(&conn, "v1", 100.0);

        let created = create_booking(
            &mut conn,
            "v1",
            "Renter@Example.COM",
            dt("2025-01-01 00:00"),
            dt("2025-01-04 00:00"),
            None,
        )
        .unwrap();

        // Stored normalized, cancellable under any casing.
        assert_eq!(created.booking.user_email, "renter@example.com");
        cancel_booking(&mut conn, &created.booking.id, "RENTER@example.com").unwrap();
    }

    #[test]
    fn test_bookings_for_user_requires_self() {
        let mut conn = setup_db();
        insert_vehicle(&conn, "v1", 100.0);

        create_booking(
            &mut conn,
            "v1",
            "renter@example.com",
            dt("2025-01-01 00:00"),
            dt("2025-01-04 00:00"),
            None,
        )
        .unwrap();

        let err =
            bookings_for_user(&conn, "renter@example.com", "snoop@example.com").unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let own = bookings_for_user(&conn, "renter@example.com", "renter@example.com").unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].vehicle.id, "v1");
    }

    #[test]
    fn test_all_bookings_newest_first() {
        let mut conn = setup_db();
        insert_vehicle(&conn, "v1", 100.0);
        insert_vehicle(&conn, "v2", 50.0);

        let first = create_booking(
            &mut conn,
            "v1",
            "a@example.com",
            dt("2025-01-01 00:00"),
            dt("2025-01-02 00:00"),
            None,
        )
        .unwrap();
        let second = create_booking(
            &mut conn,
            "v2",
            "b@example.com",
            dt("2025-01-01 00:00"),
            dt("2025-01-02 00:00"),
            None,
        )
        .unwrap();

        let all = all_bookings(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].booking.id, second.booking.id);
        assert_eq!(all[1].booking.id, first.booking.id);
    }
}
