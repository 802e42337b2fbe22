use aq_monitor::{
    iotco1000::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT},
    pipeline::DEFAULT_POLL_INTERVAL,
};
use chrono_tz::Tz;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(about = "Polls an IOT-CO-1000 sensor and submits its readings as metrics")]
pub struct Args {
    /// How frequently to poll for and submit readings, in milliseconds
    #[arg(long, env = "POLL_INTERVAL", default_value_t = DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    pub poll_interval: u64,

    /// The location of the serial device to poll for readings
    #[arg(long, env = "SERIAL_DEVICE_PATH")]
    pub serial_device_path: String,

    /// The metric namespace under which readings are submitted
    #[arg(long, env = "METRIC_NAMESPACE")]
    pub metric_namespace: String,

    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, env = "TZ", default_value = "UTC")]
    pub timezone: Tz,

    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud_rate: u32,

    /// Per-read serial timeout, in milliseconds
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT.as_millis() as u64)]
    pub read_timeout_ms: u64,
}
