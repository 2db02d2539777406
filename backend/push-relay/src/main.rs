use actix_web::{
    middleware::{self, from_fn},
    web, App, HttpServer,
};
use anyhow::Context;
use fcm_shared::{FCMClient, ServiceAccountKey};
use push_relay::{
    config::LogFormat, metrics, register_routes, Config, NotificationRelay, TriggerConfig,
};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn load_credentials(path: &Path) -> push_relay::Result<ServiceAccountKey> {
    Ok(ServiceAccountKey::from_file(path)?)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("failed to load configuration")?;
    init_tracing(config.app.log_format);

    tracing::info!(env = %config.app.env, "Starting push relay");

    // One messaging client for the whole process, injected into the relay
    let credentials = load_credentials(Path::new(&config.fcm.credentials_path))
        .context("failed to load service account credentials")?;
    let project_id = config
        .fcm
        .project_id
        .clone()
        .unwrap_or_else(|| credentials.project_id.clone());

    tracing::info!(
        project_id = %project_id,
        endpoint = %config.fcm.endpoint,
        collection = %config.relay.collection,
        "FCM client initialized"
    );

    let fcm_client = FCMClient::new(project_id, credentials).with_endpoint(&config.fcm.endpoint);
    let relay = Arc::new(NotificationRelay::new(Arc::new(fcm_client)));
    let trigger = TriggerConfig::new(config.relay.collection.clone());

    let addr = config.bind_addr();
    tracing::info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(relay.clone()))
            .app_data(web::Data::new(trigger.clone()))
            .wrap(middleware::Logger::default())
            .wrap(from_fn(metrics::track_http))
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route("/", web::get().to(|| async { "Push Relay v1.0" }))
            .configure(register_routes)
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {}", addr))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
