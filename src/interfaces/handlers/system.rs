use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use humantime::format_duration;
use serde::Serialize;
use std::time::Duration;

use crate::constants::START_TIME;

#[derive(Serialize)]
struct HealthCheckResponse {
    status: &'static str,
    time: String,
    uptime: String,
    version: &'static str,
}

#[get("/health")]
pub async fn health_check() -> impl Responder {
    let now_utc = Utc::now();
    let uptime = now_utc.signed_duration_since(*START_TIME);
    let uptime = Duration::from_secs(uptime.num_seconds().max(0) as u64);

    HttpResponse::Ok().json(HealthCheckResponse {
        status: "ok",
        time: now_utc.to_rfc3339(),
        uptime: format_duration(uptime).to_string(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
