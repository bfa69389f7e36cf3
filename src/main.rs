use actix_web::{web, App, HttpServer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use marketplace_orders::app::App as Service;
use marketplace_orders::config::Config;
use marketplace_orders::{api, metrics};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO, overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,marketplace_orders=debug")),
        )
        .init();

    let config = Config::load().unwrap_or_else(|e| e.exit());
    tracing::info!(
        addr = %config.socket_addr(),
        store = ?config.store_backend,
        "🚀 Starting marketplace order service"
    );

    let service = Service::from_config(&config).await?;
    let scheduler = service.context.scheduler.clone().start();

    let context = web::Data::new(service.context.clone());
    let metrics_data = web::Data::new(service.context.metrics.clone());

    let server = HttpServer::new(move || {
        App::new()
            .app_data(context.clone())
            .app_data(metrics_data.clone())
            .configure(metrics::configure)
            .configure(api::configure)
    })
    .bind(config.socket_addr())?
    .run();

    tracing::info!("✅ HTTP server listening");
    let served = server.await;

    tracing::info!("🛑 Shutting down");
    scheduler.stop().await;
    service.dispatcher.shutdown();
    if let Err(e) = service.dispatcher_task.await {
        tracing::error!(error = %e, "Notification dispatcher ended abnormally");
    }
    let stats = service.dispatcher.stats();
    tracing::info!(
        delivered = stats.delivered,
        dead_lettered = stats.dead_lettered,
        dropped = stats.dropped,
        "Notification dispatcher drained"
    );

    served?;
    Ok(())
}
