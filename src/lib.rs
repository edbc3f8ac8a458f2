mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{admission, entities, sanitize, use_cases, validation};
pub use interfaces::{handlers, middlewares, routes};
pub use infrastructure::{clock, limiter, mail, utils};

use std::time::Duration;

use clock::{Clock, SystemClock};
use entities::contact::MailEnvelope;
use limiter::rate_limiter::FixedWindowLimiter;
use mail::SharedDispatcher;
use use_cases::contact::ContactHandler;

pub struct AppState {
    pub contact_handler: ContactHandler,
    pub limiter: FixedWindowLimiter,
    pub allowed_origins: Vec<String>,
    pub trust_proxy_headers: bool,
    pub skip_failed_requests: bool,
}

impl AppState {
    pub fn new(config: &settings::AppConfig, dispatcher: SharedDispatcher) -> Self {
        Self::with_clock(config, dispatcher, SystemClock::new())
    }

    /// Builds the state with an explicit time source for the rate limiter.
    pub fn with_clock<C>(config: &settings::AppConfig, dispatcher: SharedDispatcher, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        let limiter = FixedWindowLimiter::with_clock(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
            Duration::from_secs(config.rate_limit_idle_ttl_secs),
            clock,
        );

        let contact_handler = ContactHandler::new(
            dispatcher,
            MailEnvelope::from(config),
            Duration::from_secs(config.mail_timeout_secs),
        );

        AppState {
            contact_handler,
            limiter,
            allowed_origins: config.cors_origins(),
            trust_proxy_headers: config.trust_proxy_headers,
            skip_failed_requests: config.rate_limit_skip_failed_requests,
        }
    }
}
