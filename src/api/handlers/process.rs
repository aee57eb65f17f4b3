use log::{error, info, warn};
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{Route, delete, get, patch, post, put, routes};
use serde::Deserialize;

use crate::api::fairings::guards::configured::GuardConfigured;
use crate::api::{AppError, AppResult, GuardResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessItemRequest {
    #[serde(default)]
    pub item_id: Option<String>,
}

pub fn generate_process_routes() -> Vec<Route> {
    routes![
        process_item_image,
        method_not_allowed_get,
        method_not_allowed_put,
        method_not_allowed_patch,
        method_not_allowed_delete
    ]
}

#[post("/", data = "<payload>")]
pub async fn process_item_image(
    configured: GuardResult<GuardConfigured<'_>>,
    payload: Result<Json<ProcessItemRequest>, json::Error<'_>>,
) -> AppResult<&'static str> {
    let GuardConfigured(orchestrator) = configured?;

    let item_id = match payload {
        Ok(Json(request)) => request.item_id,
        Err(err) => {
            warn!("Unreadable request body: {}", err);
            None
        }
    };

    match orchestrator.process(item_id.as_deref()).await {
        Ok(outcome) => Ok(outcome.response_body()),
        Err(error) => {
            if error.is_request_error() {
                info!("Rejected request: {}", error.report());
            } else {
                error!("Pipeline failed before recovery: {}", error.report());
            }
            Err(AppError {
                status: error.status(),
                error: error.into(),
            })
        }
    }
}

#[get("/")]
pub fn method_not_allowed_get() -> (Status, &'static str) {
    (Status::MethodNotAllowed, "Method not allowed")
}

#[put("/")]
pub fn method_not_allowed_put() -> (Status, &'static str) {
    (Status::MethodNotAllowed, "Method not allowed")
}

#[patch("/")]
pub fn method_not_allowed_patch() -> (Status, &'static str) {
    (Status::MethodNotAllowed, "Method not allowed")
}

#[delete("/")]
pub fn method_not_allowed_delete() -> (Status, &'static str) {
    (Status::MethodNotAllowed, "Method not allowed")
}
