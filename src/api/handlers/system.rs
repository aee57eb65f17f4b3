use rocket::serde::json::Json;
use rocket::{Route, State, get, routes};
use serde_json::{Value, json};

use crate::api::ServiceState;

pub fn generate_system_routes() -> Vec<Route> {
    routes![health]
}

#[get("/health")]
pub fn health(state: &State<ServiceState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "configured": state.is_configured(),
    }))
}
