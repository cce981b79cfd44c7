pub mod booking;
pub mod user;
pub mod vehicle;

pub use booking::{Booking, BookingStatus, BookingWithVehicle};
pub use user::{normalize_email, Identity, User};
pub use vehicle::{Availability, Vehicle, VehicleCategory};
