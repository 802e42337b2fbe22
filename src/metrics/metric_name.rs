use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    CoConcentrationPpb,
    TemperatureC,
    RelativeHumidity,
    Uptime,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::CoConcentrationPpb => "COConcentrationPPB",
            MetricName::TemperatureC => "TemperatureC",
            MetricName::RelativeHumidity => "RelativeHumidity",
            MetricName::Uptime => "Uptime",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
