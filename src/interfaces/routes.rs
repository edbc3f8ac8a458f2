use actix_web::web;

use crate::handlers::{contact, json_error::handle_json_error, system};

/// Contact submissions are small; anything larger is rejected before parsing.
const JSON_BODY_LIMIT: usize = 64 * 1024;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_BODY_LIMIT)
            .error_handler(handle_json_error),
    );

    cfg.service(
        web::scope("/api")
            .service(system::health_check)
            .service(contact::submit_contact)
    );
}
