use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use intake_core::{config::analysis_delay_from_env_value, CoreConfig, IntakeService};

/// Main entry point for the clinic intake service
///
/// Serves the REST API (with OpenAPI/Swagger UI) until interrupted. Open sessions live in memory
/// only and are dropped on shutdown.
///
/// # Environment Variables
/// - `INTAKE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `INTAKE_ANALYSIS_DELAY_MS`: delay before analysis results appear (default: 3000, max 60000)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the analysis delay is not a valid number of milliseconds or exceeds the maximum,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intake_run=info".parse()?)
                .add_directive("intake_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("INTAKE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let analysis_delay =
        analysis_delay_from_env_value(std::env::var("INTAKE_ANALYSIS_DELAY_MS").ok())?;
    let cfg = Arc::new(CoreConfig::new(analysis_delay)?);

    tracing::info!("++ Starting intake REST on {}", rest_addr);
    tracing::info!("++ Analysis delay {:?}", cfg.analysis_delay());

    let app = api_rest::router(IntakeService::new(cfg));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    tracing::info!("-- Intake REST stopped");
    Ok(())
}
