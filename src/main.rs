use std::sync::{Arc, Mutex};

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use goride::config::AppConfig;
use goride::db;
use goride::handlers;
use goride::services::auth::google::GoogleIdentityVerifier;
use goride::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    anyhow::ensure!(
        !config.firebase_api_key.is_empty(),
        "FIREBASE_API_KEY must be set"
    );

    let conn = db::init_db(&config.database_url)?;
    tracing::info!("database ready at {}", config.database_url);

    let verifier = GoogleIdentityVerifier::new(config.firebase_api_key.clone());

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        verifier: Box::new(verifier),
    });

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/verify", post(handlers::auth::verify))
        .route(
            "/api/vehicles",
            get(handlers::vehicles::list_vehicles).post(handlers::vehicles::create_vehicle),
        )
        .route(
            "/api/vehicles/latest",
            get(handlers::vehicles::latest_vehicles),
        )
        .route(
            "/api/vehicles/my-vehicles",
            get(handlers::vehicles::my_vehicles),
        )
        .route(
            "/api/vehicles/user/:user_email",
            get(handlers::vehicles::vehicles_by_owner),
        )
        .route(
            "/api/vehicles/:id",
            get(handlers::vehicles::get_vehicle)
                .put(handlers::vehicles::update_vehicle)
                .delete(handlers::vehicles::delete_vehicle),
        )
        .route(
            "/api/bookings",
            get(handlers::bookings::all_bookings).post(handlers::bookings::create_booking),
        )
        .route(
            "/api/bookings/user/:user_email",
            get(handlers::bookings::bookings_for_user),
        )
        .route("/api/bookings/:id", delete(handlers::bookings::cancel_booking))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
