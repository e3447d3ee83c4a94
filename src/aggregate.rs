/// Hourly aggregation of raw sensor readings for the correlation chart
use time::UtcOffset;

use crate::models::{CorrelationPoint, Reading, ReadingType};

const HOURS_PER_DAY: usize = 24;
const TYPE_COUNT: usize = ReadingType::ALL.len();

// Sun intensity is stored on a 0-1000 scale; the chart plots 0-100.
const SUN_INTENSITY_DIVISOR: f64 = 10.0;
// pH is stored normalized (7.0 arrives as 0.7); the chart plots 0-14.
const PH_MULTIPLIER: f64 = 10.0;

/// Samples collected for each reading type within one hour of day.
///
/// Exists only for the duration of a single aggregation pass.
#[derive(Debug, Default)]
struct HourBucket {
    samples: [Vec<f64>; TYPE_COUNT],
}

impl HourBucket {
    fn push(&mut self, reading_type: ReadingType, value: f64) {
        self.samples[reading_type.index()].push(value);
    }

    fn is_empty(&self) -> bool {
        self.samples.iter().all(|values| values.is_empty())
    }

    /// Arithmetic mean of the samples for one type.
    ///
    /// None means the hour saw no reading of that type at all; a
    /// measured mean of 0.0 is Some(0.0), never collapsed into absence.
    fn mean(&self, reading_type: ReadingType) -> Option<f64> {
        let values = &self.samples[reading_type.index()];
        if values.is_empty() {
            return None;
        }

        let sum: f64 = values.iter().sum();
        Some(sum / values.len() as f64)
    }
}

/// Aggregate raw readings into per-hour, per-type averages
///
/// Buckets every reading by the hour-of-day component of its timestamp
/// (interpreted at the given offset), averages each (hour, type) group,
/// applies per-type chart scaling to the finished mean, and emits one
/// point per hour that saw at least one reading, ascending by hour.
///
/// Readings from different calendar days that share an hour of day land
/// in the same bucket: the chart draws a single 0-23 axis, so a window
/// spanning midnight folds onto it.
///
/// The caller is responsible for windowing; this function aggregates
/// whatever it is handed and performs no I/O.
///
/// # Arguments
/// * `readings` - Raw readings for the window, in any order
/// * `offset` - UTC offset used to extract the hour of day
///
/// # Returns
/// One CorrelationPoint per observed hour, sorted ascending by hour
pub fn aggregate_hourly_correlations(
    readings: &[Reading],
    offset: UtcOffset,
) -> Vec<CorrelationPoint> {
    let mut buckets: [HourBucket; HOURS_PER_DAY] =
        std::array::from_fn(|_| HourBucket::default());

    for reading in readings {
        let hour = reading.timestamp.to_offset(offset).hour() as usize;
        buckets[hour].push(reading.reading_type, reading.value);
    }

    // Walking the buckets in index order keeps the output sorted
    buckets
        .iter()
        .enumerate()
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(hour, bucket)| CorrelationPoint {
            hour: hour as u8,
            temperature: bucket.mean(ReadingType::Temperature),
            soil_moisture: bucket.mean(ReadingType::SoilMoisture),
            // Scaling applies after averaging, never to raw samples
            sun_intensity: bucket
                .mean(ReadingType::SunIntensity)
                .map(|mean| mean / SUN_INTENSITY_DIVISOR),
            ph: bucket.mean(ReadingType::Ph).map(|mean| mean * PH_MULTIPLIER),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    /// Build a reading at the given day and hour (UTC, on the hour).
    fn reading(reading_type: ReadingType, value: f64, day: i64, hour: i64) -> Reading {
        Reading {
            sensor_id: 1,
            reading_type,
            value,
            timestamp: OffsetDateTime::from_unix_timestamp(day * 86_400 + hour * 3_600)
                .unwrap(),
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let points = aggregate_hourly_correlations(&[], UtcOffset::UTC);
        assert!(points.is_empty());
    }

    #[test]
    fn test_averages_within_one_hour() {
        let readings = vec![
            reading(ReadingType::Temperature, 20.0, 0, 6),
            reading(ReadingType::Temperature, 24.0, 0, 6),
            reading(ReadingType::SoilMoisture, 65.0, 0, 6),
        ];

        let points = aggregate_hourly_correlations(&readings, UtcOffset::UTC);
        assert_eq!(
            points,
            vec![CorrelationPoint {
                hour: 6,
                temperature: Some(22.0),
                soil_moisture: Some(65.0),
                sun_intensity: None,
                ph: None,
            }]
        );
    }

    #[test]
    fn test_ph_scaled_after_averaging() {
        let readings = vec![reading(ReadingType::Ph, 0.62, 0, 10)];

        let points = aggregate_hourly_correlations(&readings, UtcOffset::UTC);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].hour, 10);
        assert_eq!(points[0].temperature, None);
        assert_eq!(points[0].soil_moisture, None);
        assert_eq!(points[0].sun_intensity, None);
        let ph = points[0].ph.unwrap();
        assert!((ph - 6.2).abs() < 1e-9);
    }

    #[test]
    fn test_sun_intensity_scaled_after_averaging() {
        let readings = vec![
            reading(ReadingType::SunIntensity, 100.0, 0, 14),
            reading(ReadingType::SunIntensity, 200.0, 0, 14),
        ];

        let points = aggregate_hourly_correlations(&readings, UtcOffset::UTC);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].sun_intensity, Some(15.0));
    }

    #[test]
    fn test_same_hour_on_different_days_shares_a_bucket() {
        let readings = vec![
            reading(ReadingType::SunIntensity, 100.0, 0, 14),
            reading(ReadingType::SunIntensity, 200.0, 1, 14),
        ];

        let points = aggregate_hourly_correlations(&readings, UtcOffset::UTC);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].hour, 14);
        assert_eq!(points[0].sun_intensity, Some(15.0));
    }

    #[test]
    fn test_output_sorted_ascending_by_hour() {
        let readings = vec![
            reading(ReadingType::Temperature, 18.0, 0, 22),
            reading(ReadingType::Temperature, 15.0, 0, 3),
            reading(ReadingType::Temperature, 27.0, 0, 14),
        ];

        let points = aggregate_hourly_correlations(&readings, UtcOffset::UTC);
        let hours: Vec<u8> = points.iter().map(|p| p.hour).collect();
        assert_eq!(hours, vec![3, 14, 22]);
    }

    #[test]
    fn test_hours_without_readings_are_not_emitted() {
        let readings = vec![
            reading(ReadingType::Temperature, 21.0, 0, 1),
            reading(ReadingType::Ph, 0.7, 0, 5),
        ];

        let points = aggregate_hourly_correlations(&readings, UtcOffset::UTC);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].hour, 1);
        assert_eq!(points[1].hour, 5);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut readings = vec![
            reading(ReadingType::Temperature, 20.0, 0, 6),
            reading(ReadingType::Temperature, 24.0, 0, 6),
            reading(ReadingType::SoilMoisture, 65.0, 0, 6),
            reading(ReadingType::SunIntensity, 300.0, 0, 12),
            reading(ReadingType::Ph, 0.58, 1, 12),
        ];

        let forward = aggregate_hourly_correlations(&readings, UtcOffset::UTC);
        readings.reverse();
        let reversed = aggregate_hourly_correlations(&readings, UtcOffset::UTC);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_zero_average_is_reported_not_absent() {
        // A genuine 0.0 average must stay distinguishable from "no data"
        let readings = vec![
            reading(ReadingType::Temperature, -5.0, 0, 4),
            reading(ReadingType::Temperature, 5.0, 0, 4),
            reading(ReadingType::SoilMoisture, 0.0, 0, 4),
        ];

        let points = aggregate_hourly_correlations(&readings, UtcOffset::UTC);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].temperature, Some(0.0));
        assert_eq!(points[0].soil_moisture, Some(0.0));
        assert_eq!(points[0].sun_intensity, None);
    }

    #[test]
    fn test_offset_shifts_hour_extraction() {
        // 23:00 UTC reads as 01:00 at +02:00
        let readings = vec![reading(ReadingType::Temperature, 19.0, 0, 23)];

        let offset = UtcOffset::from_hms(2, 0, 0).unwrap();
        let points = aggregate_hourly_correlations(&readings, offset);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].hour, 1);
    }
}
