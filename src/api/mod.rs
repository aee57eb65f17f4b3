pub mod fairings;
pub mod handlers;

use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use rocket::{Build, Rocket};
use serde_json::json;
use std::io::Cursor;

use crate::workflow::Orchestrator;
use fairings::cors::cors_fairing;
use fairings::generate_fairing_routes;
use handlers::process::generate_process_routes;
use handlers::system::generate_system_routes;

/// What the routes serve from, decided once at startup.
pub enum ServiceState {
    Ready(Orchestrator),
    /// Required configuration is missing; the reason is reported in `500` bodies.
    Misconfigured(String),
}

impl ServiceState {
    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

pub fn build_rocket(state: ServiceState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .attach(cors_fairing())
        .mount("/", generate_fairing_routes())
        .mount("/", generate_system_routes())
        .mount("/process-item-image", generate_process_routes())
}

#[derive(Debug)]
pub struct AppError {
    pub status: Status,
    pub error: anyhow::Error,
}

#[rocket::async_trait]
impl<'r, 'o: 'r> Responder<'r, 'o> for AppError {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'o> {
        let outer_msg = self.error.to_string();

        let chain: Vec<String> = self.error.chain().map(|e| e.to_string()).collect();

        let body = json!({
            "error": outer_msg,
            "chain": chain,
        })
        .to_string();

        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

impl<E> From<E> for AppError
where
    anyhow::Error: From<E>,
{
    fn from(err: E) -> Self {
        AppError {
            status: Status::InternalServerError,
            error: anyhow::Error::from(err),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct GuardError {
    pub status: Status,
    pub error: anyhow::Error,
}

impl From<GuardError> for AppError {
    fn from(err: GuardError) -> Self {
        AppError {
            status: err.status,
            error: err.error,
        }
    }
}

pub type GuardResult<T> = Result<T, GuardError>;
