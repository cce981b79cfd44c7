use tracing_subscriber::EnvFilter;

use goride::config::AppConfig;
use goride::db;
use goride::services::seed;

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    let conn = db::init_db(&config.database_url)?;

    let inserted = seed::seed_vehicles(&conn)?;
    tracing::info!("seeded {inserted} vehicles into {}", config.database_url);

    Ok(())
}
