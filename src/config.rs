use std::env;

use time::UtcOffset;

/// Runtime configuration loaded from the environment
///
/// `DATABASE_URL` is required. `UTC_OFFSET_HOURS` selects the offset
/// used when extracting the hour of day from reading timestamps; it
/// defaults to UTC so deployments are deterministic unless they opt in
/// to a farm-local clock.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub database_url: String,
    pub utc_offset: UtcOffset,
}

impl TelemetryConfig {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Load environment variables
        dotenv::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL environment variable not set")?;

        let utc_offset = match env::var("UTC_OFFSET_HOURS") {
            Ok(raw) => parse_utc_offset(&raw)?,
            Err(_) => UtcOffset::UTC,
        };

        Ok(TelemetryConfig {
            database_url,
            utc_offset,
        })
    }
}

/// Parse a whole-hour UTC offset such as "-3" or "+2"
fn parse_utc_offset(raw: &str) -> Result<UtcOffset, String> {
    let hours: i8 = raw
        .trim()
        .parse()
        .map_err(|_| format!("UTC_OFFSET_HOURS is not a whole number of hours: '{}'", raw))?;

    UtcOffset::from_hms(hours, 0, 0)
        .map_err(|_| format!("UTC_OFFSET_HOURS out of range: '{}'", raw))
}
