use rocket::fairing::AdHoc;
use rocket::http::Header;

use crate::common::{CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS, CORS_ALLOW_ORIGIN};

/// Attach permissive cross-origin headers to every response, errors included.
pub fn cors_fairing() -> AdHoc {
    AdHoc::on_response("CORS Headers", |_req, res| {
        Box::pin(async move {
            res.set_header(Header::new("Access-Control-Allow-Origin", CORS_ALLOW_ORIGIN));
            res.set_header(Header::new(
                "Access-Control-Allow-Headers",
                CORS_ALLOW_HEADERS,
            ));
            res.set_header(Header::new(
                "Access-Control-Allow-Methods",
                CORS_ALLOW_METHODS,
            ));
        })
    })
}
