use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries::{self, VehicleFilter};
use crate::errors::AppError;
use crate::models::{normalize_email, Availability, Vehicle, VehicleCategory};
use crate::services::auth;
use crate::state::AppState;

// GET /api/vehicles
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleListQuery {
    pub category: Option<String>,
    pub location: Option<String>,
    pub availability: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl VehicleListQuery {
    fn into_filter(self) -> Result<VehicleFilter, AppError> {
        let category = match self.category.as_deref() {
            Some(s) => Some(
                VehicleCategory::parse(s)
                    .ok_or_else(|| AppError::Validation(format!("Unknown category: {s}")))?,
            ),
            None => None,
        };
        let availability = match self.availability.as_deref() {
            Some(s) => Some(
                Availability::parse(s)
                    .ok_or_else(|| AppError::Validation(format!("Unknown availability: {s}")))?,
            ),
            None => None,
        };

        Ok(VehicleFilter {
            category,
            location: self.location,
            availability,
            min_price: self.min_price,
            max_price: self.max_price,
        })
    }
}

pub async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VehicleListQuery>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let filter = query.into_filter()?;
    let db = state.db.lock().unwrap();
    Ok(Json(queries::list_vehicles(&db, &filter)?))
}

// GET /api/vehicles/latest
pub async fn latest_vehicles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let db = state.db.lock().unwrap();
    Ok(Json(queries::latest_vehicles(&db, 6)?))
}

// GET /api/vehicles/my-vehicles
pub async fn my_vehicles(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let identity = auth::authenticate(&state, &headers).await?;

    let vehicles = {
        let db = state.db.lock().unwrap();
        queries::vehicles_by_owner(&db, &identity.email)?
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "count": vehicles.len(),
        "data": vehicles,
    })))
}

// GET /api/vehicles/user/:user_email
pub async fn vehicles_by_owner(
    State(state): State<Arc<AppState>>,
    Path(user_email): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let vehicles = {
        let db = state.db.lock().unwrap();
        queries::vehicles_by_owner(&db, &normalize_email(&user_email))?
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "count": vehicles.len(),
        "data": vehicles,
    })))
}

// GET /api/vehicles/:id
pub async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vehicle>, AppError> {
    let db = state.db.lock().unwrap();
    let vehicle = queries::get_vehicle(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;
    Ok(Json(vehicle))
}

// POST /api/vehicles
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub vehicle_name: String,
    pub owner_name: String,
    pub category: String,
    pub price_per_day: f64,
    pub location: String,
    pub description: String,
    pub cover_image: String,
}

impl CreateVehicleRequest {
    fn validate(&self) -> Result<VehicleCategory, AppError> {
        let category = VehicleCategory::parse(&self.category)
            .ok_or_else(|| AppError::Validation(format!("Unknown category: {}", self.category)))?;

        if self.vehicle_name.trim().len() < 2 {
            return Err(AppError::Validation("Vehicle name is too short".to_string()));
        }
        if self.owner_name.trim().is_empty() {
            return Err(AppError::Validation("Owner name is required".to_string()));
        }
        if self.price_per_day <= 0.0 {
            return Err(AppError::Validation(
                "Price per day must be positive".to_string(),
            ));
        }
        if self.location.trim().is_empty() {
            return Err(AppError::Validation("Location is required".to_string()));
        }
        if self.description.trim().len() < 10 {
            return Err(AppError::Validation(
                "Description must be at least 10 characters".to_string(),
            ));
        }
        if !self.cover_image.starts_with("http://") && !self.cover_image.starts_with("https://") {
            return Err(AppError::Validation(
                "Cover image must be an http(s) URI".to_string(),
            ));
        }

        Ok(category)
    }
}

pub async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<Vehicle>), AppError> {
    let identity = auth::authenticate(&state, &headers).await?;
    let category = body.validate()?;

    let now = chrono::Utc::now().naive_utc();
    let vehicle = Vehicle {
        id: Uuid::new_v4().to_string(),
        vehicle_name: body.vehicle_name.trim().to_string(),
        owner_name: body.owner_name.trim().to_string(),
        category,
        price_per_day: body.price_per_day,
        location: body.location.trim().to_string(),
        availability: Availability::Available,
        description: body.description.trim().to_string(),
        cover_image: body.cover_image,
        // Owner is always the authenticated caller, never client input.
        user_email: identity.email,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_vehicle(&db, &vehicle)?;
    }

    Ok((StatusCode::CREATED, Json(vehicle)))
}

// PUT /api/vehicles/:id
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    pub vehicle_name: Option<String>,
    pub owner_name: Option<String>,
    pub category: Option<String>,
    pub price_per_day: Option<f64>,
    pub location: Option<String>,
    pub availability: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub user_email: Option<String>,
}

pub async fn update_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateVehicleRequest>,
) -> Result<Json<Vehicle>, AppError> {
    let identity = auth::authenticate(&state, &headers).await?;

    if body.user_email.is_some() {
        return Err(AppError::Validation(
            "Vehicle owner cannot be changed".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();

    let mut vehicle = queries::get_vehicle(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if vehicle.user_email != identity.email {
        return Err(AppError::Forbidden(
            "Not authorized to update this vehicle".to_string(),
        ));
    }

    if let Some(name) = body.vehicle_name {
        if name.trim().len() < 2 {
            return Err(AppError::Validation("Vehicle name is too short".to_string()));
        }
        vehicle.vehicle_name = name.trim().to_string();
    }
    if let Some(owner) = body.owner_name {
        vehicle.owner_name = owner.trim().to_string();
    }
    if let Some(category) = body.category {
        vehicle.category = VehicleCategory::parse(&category)
            .ok_or_else(|| AppError::Validation(format!("Unknown category: {category}")))?;
    }
    if let Some(price) = body.price_per_day {
        if price <= 0.0 {
            return Err(AppError::Validation(
                "Price per day must be positive".to_string(),
            ));
        }
        vehicle.price_per_day = price;
    }
    if let Some(location) = body.location {
        vehicle.location = location.trim().to_string();
    }
    if let Some(availability) = body.availability {
        vehicle.availability = Availability::parse(&availability)
            .ok_or_else(|| AppError::Validation(format!("Unknown availability: {availability}")))?;
    }
    if let Some(description) = body.description {
        vehicle.description = description.trim().to_string();
    }
    if let Some(cover_image) = body.cover_image {
        vehicle.cover_image = cover_image;
    }
    vehicle.updated_at = chrono::Utc::now().naive_utc();

    queries::update_vehicle(&db, &vehicle)?;

    Ok(Json(vehicle))
}

// DELETE /api/vehicles/:id
pub async fn delete_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let identity = auth::authenticate(&state, &headers).await?;

    let db = state.db.lock().unwrap();

    let vehicle = queries::get_vehicle(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    if vehicle.user_email != identity.email {
        return Err(AppError::Forbidden(
            "Not authorized to delete this vehicle".to_string(),
        ));
    }

    queries::delete_vehicle(&db, &id)?;

    Ok(Json(serde_json::json!({
        "message": "Vehicle deleted successfully"
    })))
}
