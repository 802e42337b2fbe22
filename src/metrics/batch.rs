use chrono::Utc;

use crate::metrics::{
    Classified, Dimension, HIGH_RESOLUTION, MetricDataPoint, MetricName, Unit, WarmUp,
};

/// Maps a classified measurement to the data points worth publishing.
///
/// Before warm-up only uptime is sent, which keeps the sensor visible as alive
/// without publishing CO readings that cannot be trusted yet.
pub fn build_batch(classified: &Classified) -> Vec<MetricDataPoint> {
    let m = &classified.measurement;
    let dimensions = vec![Dimension::sensor_serial_number(&m.sensor_serial_number)];
    let timestamp = m.measurement_time.with_timezone(&Utc);

    let point = |name: MetricName, value: f64, unit: Unit| MetricDataPoint {
        name,
        value,
        dimensions: dimensions.clone(),
        unit,
        storage_resolution: HIGH_RESOLUTION,
        timestamp,
    };

    let uptime = point(MetricName::Uptime, m.uptime.as_secs_f64(), Unit::Seconds);

    match classified.warm_up {
        WarmUp::NotWarmedUp => vec![uptime],
        WarmUp::WarmedUp => vec![
            point(
                MetricName::CoConcentrationPpb,
                f64::from(m.co_concentration_ppb.max(0)),
                Unit::None,
            ),
            point(MetricName::TemperatureC, f64::from(m.temperature_c), Unit::None),
            point(
                MetricName::RelativeHumidity,
                f64::from(m.relative_humidity),
                Unit::None,
            ),
            uptime,
        ],
    }
}
