use serde::Serialize;
use time::OffsetDateTime;

/// Category of a raw sensor observation.
///
/// The set is closed: every row in the raw reading stream carries exactly
/// one of these four types, and the aggregation tables are sized from it
/// at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingType {
    Temperature,
    SoilMoisture,
    SunIntensity,
    Ph,
}

impl ReadingType {
    pub const ALL: [ReadingType; 4] = [
        ReadingType::Temperature,
        ReadingType::SoilMoisture,
        ReadingType::SunIntensity,
        ReadingType::Ph,
    ];

    /// Dense index used for fixed-size per-type tables.
    pub fn index(self) -> usize {
        match self {
            ReadingType::Temperature => 0,
            ReadingType::SoilMoisture => 1,
            ReadingType::SunIntensity => 2,
            ReadingType::Ph => 3,
        }
    }

    /// Map the `reading_type` column value to a category.
    ///
    /// Returns None for strings outside the known set so the storage
    /// layer can skip and log the offending row.
    pub fn from_db_value(value: &str) -> Option<ReadingType> {
        match value {
            "Temperature" => Some(ReadingType::Temperature),
            "SoilMoisture" => Some(ReadingType::SoilMoisture),
            "SunIntensity" => Some(ReadingType::SunIntensity),
            "PH" => Some(ReadingType::Ph),
            _ => None,
        }
    }
}

/// One raw sensor observation as read from storage.
#[derive(Debug, Clone)]
pub struct Reading {
    pub sensor_id: i32,
    pub reading_type: ReadingType,
    pub value: f64,
    pub timestamp: OffsetDateTime,
}

/// One row of the hourly correlation table.
///
/// A `None` field means no reading of that type fell in the hour; it
/// serializes as JSON `null` and is stored as SQL `NULL`, distinct from
/// a measured average of zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPoint {
    pub hour: u8,
    pub temperature: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub sun_intensity: Option<f64>,
    pub ph: Option<f64>,
}
