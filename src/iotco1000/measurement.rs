use std::time::Duration;

use chrono::DateTime;
use chrono_tz::Tz;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirQualityMeasurement {
    pub sensor_serial_number: String,

    /// Raw reading; the device reports small negative values near zero.
    pub co_concentration_ppb: i32,

    pub temperature_c: i8,

    pub relative_humidity: i8,

    pub uptime: Duration,

    /// Taken right after the stimulus was written, not when the reply finished.
    pub measurement_time: DateTime<Tz>,
}
