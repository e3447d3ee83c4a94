mod aggregate;
mod config;
mod database;
mod models;
mod utils;

use log::{error, info, warn};
use time::OffsetDateTime;
use tokio::time::{sleep, Duration};

use aggregate::aggregate_hourly_correlations;
use config::TelemetryConfig;
use database::operations::{fetch_recent_readings, store_correlation_points};
use utils::{duration_to_seconds, format_datetime};

// The trailing window is caller policy: the dashboard charts the last day
const WINDOW_HOURS: i64 = 24;
const REFRESH_INTERVAL_SECS: u64 = 300; // 5 minutes

/// Format an averaged value for the cycle summary, "-" when absent
fn describe(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.2}", value),
        None => "-".to_string(),
    }
}

async fn main_loop(config: TelemetryConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting irrigation telemetry correlation service");

    loop {
        let cycle_start = OffsetDateTime::now_utc();
        info!(
            "Starting refresh cycle at: {}",
            format_datetime(&cycle_start)
        );

        // Fetch the trailing window of raw readings
        let readings = match fetch_recent_readings(WINDOW_HOURS, &config.database_url).await {
            Ok(readings) => readings,
            Err(e) => {
                // Never aggregate a partial result set; skip this cycle
                error!("Failed to fetch readings: {}", e);
                sleep(Duration::from_secs(REFRESH_INTERVAL_SECS)).await;
                continue;
            }
        };

        let points = aggregate_hourly_correlations(&readings, config.utc_offset);

        // Warning if no data collected
        if points.is_empty() {
            warn!("No readings in the last {} hours!", WINDOW_HOURS);
        } else {
            match store_correlation_points(&points, &config.database_url).await {
                Ok(()) => info!("Stored {} correlation points", points.len()),
                Err(e) => error!("Failed to store correlation points: {}", e),
            }

            // Print summary
            let mut sensor_ids: Vec<i32> = readings.iter().map(|r| r.sensor_id).collect();
            sensor_ids.sort_unstable();
            sensor_ids.dedup();
            info!(
                "Hourly correlations from {} readings across {} sensors:",
                readings.len(),
                sensor_ids.len()
            );
            for point in &points {
                info!(
                    "  hour {:02}: temperature {}, soil moisture {}, sun intensity {}, pH {}",
                    point.hour,
                    describe(point.temperature),
                    describe(point.soil_moisture),
                    describe(point.sun_intensity),
                    describe(point.ph),
                );
            }
        }

        // Wait until next refresh should start
        let elapsed = duration_to_seconds(OffsetDateTime::now_utc() - cycle_start);
        if elapsed < REFRESH_INTERVAL_SECS {
            let wait_time = REFRESH_INTERVAL_SECS - elapsed;
            info!("Waiting {} seconds until next refresh cycle", wait_time);
            sleep(Duration::from_secs(wait_time)).await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match TelemetryConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        let _ = tx.send(());
    });

    // Run main loop or wait for shutdown signal
    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(_) => info!("Program completed successfully"),
                Err(e) => error!("Fatal error: {}", e),
            }
        }
        _ = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
