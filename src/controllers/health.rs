use axum::Json;
use loco_rs::prelude::*;
use serde_json::json;

pub fn routes() -> Routes {
    Routes::new().prefix("health").add("/", get(liveness))
}

async fn liveness() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
