use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use contact_relay::{
    background_task::start_purge_task,
    constants::START_TIME,
    graceful_shutdown::shutdown_signal,
    mail::build_dispatcher,
    middlewares::origin::{build_cors, OriginGuard},
    routes::configure_routes,
    settings::{AppConfig, LogFormat},
    AppState,
};
use once_cell::sync::Lazy;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    Lazy::force(&START_TIME);

    // Configuration decides the log format, so its error is reported once tracing is up.
    let loaded = AppConfig::new();
    init_tracing(loaded.as_ref().map(|cfg| cfg.log_format).unwrap_or(LogFormat::Pretty));

    let config = match loaded {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        },
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let dispatcher = match build_dispatcher(&config) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            tracing::error!("Mail provider setup failed: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = web::Data::new(AppState::new(&config, dispatcher));
    let allowed_origins = app_state.allowed_origins.clone();

    let server_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        "🚀 Starting {} v{} on {} (provider: {}, origins: {:?})",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr,
        config.mail_provider,
        allowed_origins
    );

    let purge_task = tokio::spawn(start_purge_task(app_state.limiter.clone()));

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(build_cors(&allowed_origins))
            .wrap(OriginGuard)
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .disable_signals()
    .bind(server_addr)?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.stop(true).await;
    });

    let result = server.await;

    purge_task.abort();
    tracing::info!("Server stopped");
    result
}
