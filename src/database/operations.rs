/// Database operations for reading raw telemetry and storing correlations
use log::warn;
use time::{Duration, OffsetDateTime};

use crate::database::connection::run_with_retry;
use crate::models::{CorrelationPoint, Reading, ReadingType};

/// Fetch all raw readings inside the trailing window
///
/// Queries the raw_readings table for every row whose timestamp falls
/// within the last `window_hours` hours, ordered ascending. Rows whose
/// reading_type column is outside the known category set are logged and
/// skipped so downstream aggregation only ever sees well-typed readings.
/// It uses the retry mechanism to handle transient database connection issues.
///
/// # Arguments
/// * `window_hours` - Length of the trailing window in hours
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// Result containing the readings in ascending timestamp order
pub async fn fetch_recent_readings(
    window_hours: i64,
    database_url: &str,
) -> Result<Vec<Reading>, String> {
    let window_start = OffsetDateTime::now_utc() - Duration::hours(window_hours);

    run_with_retry(database_url, move |client| async move {
        let rows = client
            .query(
                "SELECT sensor_id, reading_type, value, time
                 FROM raw_readings
                 WHERE time >= $1
                 ORDER BY time ASC",
                &[&window_start],
            )
            .await?;

        let mut readings = Vec::with_capacity(rows.len());
        for row in rows {
            let type_value: String = row.get("reading_type");
            let reading_type = match ReadingType::from_db_value(&type_value) {
                Some(reading_type) => reading_type,
                None => {
                    warn!("Skipping reading with unknown type '{}'", type_value);
                    continue;
                }
            };

            readings.push(Reading {
                sensor_id: row.get("sensor_id"),
                reading_type,
                value: row.get("value"),
                timestamp: row.get("time"),
            });
        }

        Ok(readings)
    })
    .await
}

/// Replace the correlation table with a freshly aggregated set of points
///
/// Deletes the previous contents and inserts the new points inside one
/// transaction so the dashboard never reads a half-refreshed table.
/// Absent per-type averages are stored as SQL NULL, keeping "no data"
/// distinguishable from a measured zero.
/// It uses the retry mechanism to handle transient database connection issues.
///
/// # Arguments
/// * `points` - Aggregated points, one per observed hour
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// Result indicating success or failure
pub async fn store_correlation_points(
    points: &[CorrelationPoint],
    database_url: &str,
) -> Result<(), String> {
    // Clone data for move into async closure
    let points = points.to_vec();
    let refreshed_at = OffsetDateTime::now_utc();

    run_with_retry(database_url, move |mut client| {
        let points = points.clone();
        async move {
            let transaction = client.transaction().await?;

            transaction
                .execute("DELETE FROM correlation_points", &[])
                .await?;

            for point in &points {
                transaction
                    .execute(
                        "INSERT INTO correlation_points(hour, temperature, soil_moisture, sun_intensity, ph, refreshed_at)
                         VALUES ($1, $2, $3, $4, $5, $6)",
                        &[
                            &(point.hour as i32),
                            &point.temperature,
                            &point.soil_moisture,
                            &point.sun_intensity,
                            &point.ph,
                            &refreshed_at,
                        ],
                    )
                    .await?;
            }

            transaction.commit().await?;
            Ok(())
        }
    })
    .await
}
