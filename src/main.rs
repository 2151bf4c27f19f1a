use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use servicebay::config::AppConfig;
use servicebay::db;
use servicebay::routes::build_router;
use servicebay::services::payment::sandbox::SandboxGateway;
use servicebay::services::reservations;
use servicebay::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    tracing::info!(
        buffer_minutes = config.booking.buffer_minutes,
        slot_step_minutes = config.booking.slot_step_minutes,
        hold_minutes = config.booking.hold_minutes,
        booking_fee = config.booking.booking_fee,
        "booking policy loaded"
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        payments: Box::new(SandboxGateway::new(config.sandbox.clone())),
    });

    if config.sweep_interval_secs > 0 {
        spawn_reservation_sweeper(Arc::clone(&state), config.sweep_interval_secs);
    }

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_reservation_sweeper(state: Arc<AppState>, every_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(every_secs));
        loop {
            ticker.tick().await;
            let result = state.conn().and_then(|db| {
                reservations::sweep_expired_reservations(&db, chrono::Utc::now().naive_utc())
            });
            if let Err(e) = result {
                tracing::error!(error = %e, "reservation sweep failed");
            }
        }
    });
}
