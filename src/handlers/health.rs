use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let database_ok = {
        let db = state.db.lock().unwrap();
        db.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok()
    };

    Json(serde_json::json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "services": {
            "database": if database_ok { "connected" } else { "disconnected" },
        },
    }))
}
