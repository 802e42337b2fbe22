use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metrics::MetricName;

pub const SENSOR_SERIAL_NUMBER_DIMENSION: &str = "SensorSerialNumber";

/// Storage resolution in seconds; 1 means high resolution.
pub const HIGH_RESOLUTION: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    None,
    Seconds,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::None => "None",
            Unit::Seconds => "Seconds",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: String,

    pub value: String,
}

impl Dimension {
    pub fn sensor_serial_number(serial_number: &str) -> Self {
        Self {
            name: SENSOR_SERIAL_NUMBER_DIMENSION.to_owned(),
            value: serial_number.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDataPoint {
    pub name: MetricName,

    pub value: f64,

    pub dimensions: Vec<Dimension>,

    pub unit: Unit,

    pub storage_resolution: i32,

    pub timestamp: DateTime<Utc>,
}
