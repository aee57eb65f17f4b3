use anyhow::anyhow;
use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};

use crate::api::{GuardError, ServiceState};
use crate::workflow::Orchestrator;

/// Resolves to the orchestrator when startup configuration was complete.
pub struct GuardConfigured<'r>(pub &'r Orchestrator);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for GuardConfigured<'r> {
    type Error = GuardError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let error = match req.rocket().state::<ServiceState>() {
            Some(ServiceState::Ready(orchestrator)) => {
                return Outcome::Success(GuardConfigured(orchestrator));
            }
            Some(ServiceState::Misconfigured(reason)) => anyhow!(reason.clone()),
            None => anyhow!("Service state is not managed"),
        };

        Outcome::Error((
            Status::InternalServerError,
            GuardError {
                status: Status::InternalServerError,
                error: error.context("Server misconfigured (missing env)"),
            },
        ))
    }
}
