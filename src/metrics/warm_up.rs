use std::time::Duration;

use crate::iotco1000::AirQualityMeasurement;

/// CO readings taken within this long after power-on are not reliable.
pub const WARM_UP_DURATION: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmUp {
    NotWarmedUp,
    WarmedUp,
}

impl WarmUp {
    pub fn is_warmed_up(&self) -> bool {
        matches!(self, WarmUp::WarmedUp)
    }
}

#[derive(Debug, Clone)]
pub struct Classified {
    pub warm_up: WarmUp,

    pub measurement: AirQualityMeasurement,
}

pub fn classify(measurement: &AirQualityMeasurement, warm_up_duration: Duration) -> WarmUp {
    if measurement.uptime < warm_up_duration {
        WarmUp::NotWarmedUp
    } else {
        WarmUp::WarmedUp
    }
}

impl Classified {
    pub fn new(measurement: AirQualityMeasurement, warm_up_duration: Duration) -> Self {
        Self {
            warm_up: classify(&measurement, warm_up_duration),
            measurement,
        }
    }
}
