pub mod cors;
pub mod guards;

use rocket::{Route, options, routes};

pub fn generate_fairing_routes() -> Vec<Route> {
    routes![preflight]
}

/// Answer any CORS pre-flight; the headers come from [`cors::cors_fairing`].
#[options("/<_..>")]
pub fn preflight() -> &'static str {
    "ok"
}
