use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use crate::models::{
    Availability, Booking, BookingStatus, BookingWithVehicle, User, Vehicle, VehicleCategory,
};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn parse_dt(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .map_err(|e| anyhow::anyhow!("invalid stored datetime {s:?}: {e}"))
}

// ── Vehicles ──

#[derive(Debug, Default, Clone)]
pub struct VehicleFilter {
    pub category: Option<VehicleCategory>,
    pub location: Option<String>,
    pub availability: Option<Availability>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

const VEHICLE_COLUMNS: &str = "id, vehicle_name, owner_name, category, price_per_day, location, \
     availability, description, cover_image, user_email, created_at, updated_at";

pub fn create_vehicle(conn: &Connection, vehicle: &Vehicle) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO vehicles (id, vehicle_name, owner_name, category, price_per_day, location, availability, description, cover_image, user_email, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            vehicle.id,
            vehicle.vehicle_name,
            vehicle.owner_name,
            vehicle.category.as_str(),
            vehicle.price_per_day,
            vehicle.location,
            vehicle.availability.as_str(),
            vehicle.description,
            vehicle.cover_image,
            vehicle.user_email,
            fmt_dt(&vehicle.created_at),
            fmt_dt(&vehicle.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_vehicle(conn: &Connection, id: &str) -> anyhow::Result<Option<Vehicle>> {
    let result = conn.query_row(
        &format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = ?1"),
        params![id],
        |row| Ok(parse_vehicle_row(row)),
    );

    match result {
        Ok(vehicle) => Ok(Some(vehicle?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_vehicles(conn: &Connection, filter: &VehicleFilter) -> anyhow::Result<Vec<Vehicle>> {
    let mut clauses: Vec<String> = vec![];
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(category) = filter.category {
        values.push(Box::new(category.as_str().to_string()));
        clauses.push(format!("category = ?{}", values.len()));
    }
    if let Some(location) = &filter.location {
        values.push(Box::new(format!("%{}%", location.to_lowercase())));
        clauses.push(format!("LOWER(location) LIKE ?{}", values.len()));
    }
    if let Some(availability) = filter.availability {
        values.push(Box::new(availability.as_str().to_string()));
        clauses.push(format!("availability = ?{}", values.len()));
    }
    if let Some(min_price) = filter.min_price {
        values.push(Box::new(min_price));
        clauses.push(format!("price_per_day >= ?{}", values.len()));
    }
    if let Some(max_price) = filter.max_price {
        values.push(Box::new(max_price));
        clauses.push(format!("price_per_day <= ?{}", values.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT {VEHICLE_COLUMNS} FROM vehicles{where_sql} ORDER BY created_at DESC, rowid DESC"
    );

    let mut stmt = conn.prepare(&sql)?;
    let value_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(value_refs.as_slice(), |row| Ok(parse_vehicle_row(row)))?;

    let mut vehicles = vec![];
    for row in rows {
        vehicles.push(row??);
    }
    Ok(vehicles)
}

pub fn latest_vehicles(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Vehicle>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY created_at DESC, rowid DESC LIMIT ?1"
    ))?;
    let rows = stmt.query_map(params![limit], |row| Ok(parse_vehicle_row(row)))?;

    let mut vehicles = vec![];
    for row in rows {
        vehicles.push(row??);
    }
    Ok(vehicles)
}

pub fn vehicles_by_owner(conn: &Connection, user_email: &str) -> anyhow::Result<Vec<Vehicle>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE user_email = ?1 ORDER BY created_at DESC, rowid DESC"
    ))?;
    let rows = stmt.query_map(params![user_email], |row| Ok(parse_vehicle_row(row)))?;

    let mut vehicles = vec![];
    for row in rows {
        vehicles.push(row??);
    }
    Ok(vehicles)
}

pub fn update_vehicle(conn: &Connection, vehicle: &Vehicle) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE vehicles SET vehicle_name = ?1, owner_name = ?2, category = ?3, price_per_day = ?4,
             location = ?5, availability = ?6, description = ?7, cover_image = ?8, updated_at = ?9
         WHERE id = ?10",
        params![
            vehicle.vehicle_name,
            vehicle.owner_name,
            vehicle.category.as_str(),
            vehicle.price_per_day,
            vehicle.location,
            vehicle.availability.as_str(),
            vehicle.description,
            vehicle.cover_image,
            fmt_dt(&vehicle.updated_at),
            vehicle.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_vehicle(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM vehicles WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

/// Conditional availability transition. Returns false when the vehicle was
/// not in `from` state, so only one of two concurrent writers can succeed.
pub fn transition_availability(
    conn: &Connection,
    id: &str,
    from: Availability,
    to: Availability,
) -> anyhow::Result<bool> {
    let now = fmt_dt(&chrono::Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE vehicles SET availability = ?1, updated_at = ?2 WHERE id = ?3 AND availability = ?4",
        params![to.as_str(), now, id, from.as_str()],
    )?;
    Ok(count > 0)
}

pub fn set_availability(conn: &Connection, id: &str, to: Availability) -> anyhow::Result<bool> {
    let now = fmt_dt(&chrono::Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE vehicles SET availability = ?1, updated_at = ?2 WHERE id = ?3",
        params![to.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn count_vehicles(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM vehicles", [], |row| row.get(0))?;
    Ok(count)
}

fn parse_vehicle_row(row: &rusqlite::Row) -> anyhow::Result<Vehicle> {
    let id: String = row.get(0)?;
    let vehicle_name: String = row.get(1)?;
    let owner_name: String = row.get(2)?;
    let category_str: String = row.get(3)?;
    let price_per_day: f64 = row.get(4)?;
    let location: String = row.get(5)?;
    let availability_str: String = row.get(6)?;
    let description: String = row.get(7)?;
    let cover_image: String = row.get(8)?;
    let user_email: String = row.get(9)?;
    let created_at_str: String = row.get(10)?;
    let updated_at_str: String = row.get(11)?;

    let category = VehicleCategory::parse(&category_str)
        .ok_or_else(|| anyhow::anyhow!("unknown vehicle category: {category_str}"))?;
    let availability = Availability::parse(&availability_str)
        .ok_or_else(|| anyhow::anyhow!("unknown availability state: {availability_str}"))?;

    Ok(Vehicle {
        id,
        vehicle_name,
        owner_name,
        category,
        price_per_day,
        location,
        availability,
        description,
        cover_image,
        user_email,
        created_at: parse_dt(&created_at_str)?,
        updated_at: parse_dt(&updated_at_str)?,
    })
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, vehicle_id, user_email, start_date, end_date, total_price, status, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.vehicle_id,
            booking.user_email,
            fmt_dt(&booking.start_date),
            fmt_dt(&booking.end_date),
            booking.total_price,
            booking.status.as_str(),
            booking.notes,
            fmt_dt(&booking.created_at),
            fmt_dt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, vehicle_id, user_email, start_date, end_date, total_price, status, notes, created_at, updated_at
         FROM bookings WHERE id = ?1",
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

const BOOKING_JOIN_SQL: &str = "SELECT b.id, b.vehicle_id, b.user_email, b.start_date, b.end_date, b.total_price, b.status, b.notes, b.created_at, b.updated_at,
        v.id, v.vehicle_name, v.owner_name, v.category, v.price_per_day, v.location, v.availability, v.description, v.cover_image, v.user_email, v.created_at, v.updated_at
     FROM bookings b INNER JOIN vehicles v ON v.id = b.vehicle_id";

pub fn bookings_for_user(
    conn: &Connection,
    user_email: &str,
) -> anyhow::Result<Vec<BookingWithVehicle>> {
    let sql = format!("{BOOKING_JOIN_SQL} WHERE b.user_email = ?1 ORDER BY b.created_at DESC, b.rowid DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_email], |row| Ok(parse_booking_join_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn all_bookings(conn: &Connection) -> anyhow::Result<Vec<BookingWithVehicle>> {
    let sql = format!("{BOOKING_JOIN_SQL} ORDER BY b.created_at DESC, b.rowid DESC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok(parse_booking_join_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn booking_with_vehicle(
    conn: &Connection,
    id: &str,
) -> anyhow::Result<Option<BookingWithVehicle>> {
    let sql = format!("{BOOKING_JOIN_SQL} WHERE b.id = ?1");
    let result = conn.query_row(&sql, params![id], |row| Ok(parse_booking_join_row(row)));

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = fmt_dt(&chrono::Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn count_bookings_for_vehicle(conn: &Connection, vehicle_id: &str) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE vehicle_id = ?1",
        params![vehicle_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let vehicle_id: String = row.get(1)?;
    let user_email: String = row.get(2)?;
    let start_date_str: String = row.get(3)?;
    let end_date_str: String = row.get(4)?;
    let total_price: f64 = row.get(5)?;
    let status_str: String = row.get(6)?;
    let notes: Option<String> = row.get(7)?;
    let created_at_str: String = row.get(8)?;
    let updated_at_str: String = row.get(9)?;

    Ok(Booking {
        id,
        vehicle_id,
        user_email,
        start_date: parse_dt(&start_date_str)?,
        end_date: parse_dt(&end_date_str)?,
        total_price,
        status: BookingStatus::parse(&status_str),
        notes,
        created_at: parse_dt(&created_at_str)?,
        updated_at: parse_dt(&updated_at_str)?,
    })
}

fn parse_booking_join_row(row: &rusqlite::Row) -> anyhow::Result<BookingWithVehicle> {
    let booking = parse_booking_row(row)?;

    let category_str: String = row.get(13)?;
    let availability_str: String = row.get(16)?;
    let created_at_str: String = row.get(20)?;
    let updated_at_str: String = row.get(21)?;

    let vehicle = Vehicle {
        id: row.get(10)?,
        vehicle_name: row.get(11)?,
        owner_name: row.get(12)?,
        category: VehicleCategory::parse(&category_str)
            .ok_or_else(|| anyhow::anyhow!("unknown vehicle category: {category_str}"))?,
        price_per_day: row.get(14)?,
        location: row.get(15)?,
        availability: Availability::parse(&availability_str)
            .ok_or_else(|| anyhow::anyhow!("unknown availability state: {availability_str}"))?,
        description: row.get(17)?,
        cover_image: row.get(18)?,
        user_email: row.get(19)?,
        created_at: parse_dt(&created_at_str)?,
        updated_at: parse_dt(&updated_at_str)?,
    };

    Ok(BookingWithVehicle { booking, vehicle })
}

// ── Users ──

pub fn upsert_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (uid, email, display_name, photo_url, role)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(uid) DO UPDATE SET
           email = excluded.email,
           display_name = excluded.display_name,
           photo_url = excluded.photo_url,
           updated_at = datetime('now')",
        params![
            user.uid,
            user.email,
            user.display_name,
            user.photo_url,
            user.role
        ],
    )?;
    Ok(())
}

pub fn get_user_by_uid(conn: &Connection, uid: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT uid, email, display_name, photo_url, role FROM users WHERE uid = ?1",
        params![uid],
        |row| {
            Ok(User {
                uid: row.get(0)?,
                email: row.get(1)?,
                display_name: row.get(2)?,
                photo_url: row.get(3)?,
                role: row.get(4)?,
            })
        },
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> anyhow::Result<Option<User>> {
    let result = conn.query_row(
        "SELECT uid, email, display_name, photo_url, role FROM users WHERE email = ?1",
        params![email],
        |row| {
            Ok(User {
                uid: row.get(0)?,
                email: row.get(1)?,
                display_name: row.get(2)?,
                photo_url: row.get(3)?,
                role: row.get(4)?,
            })
        },
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
