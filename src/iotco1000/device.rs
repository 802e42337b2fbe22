use std::time::Duration;

use anyhow::{Context as _, Result};
use chrono_tz::Tz;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use thiserror::Error;

use crate::iotco1000::{
    AirQualityMeasurement, FrameConfig, FrameError, FrameReader, ParseError, SerialChannel,
    parse_measurement,
};

pub const DEFAULT_BAUD_RATE: u32 = 9600;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("failed to read from IOTCO1000")]
    Frame(#[from] FrameError),

    #[error("failed to parse IOTCO1000 reading")]
    Parse(#[from] ParseError),
}

impl AcquireError {
    pub fn is_fatal(&self) -> bool {
        match self {
            AcquireError::Frame(e) => e.is_fatal(),
            AcquireError::Parse(_) => false,
        }
    }
}

pub struct Iotco1000<C> {
    reader: FrameReader<C>,
    timezone: Tz,
}

impl Iotco1000<Box<dyn SerialPort>> {
    /// Opens the module's serial device at 8N1.
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration, timezone: Tz) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(read_timeout)
            .open()
            .with_context(|| format!("failed to open serial device: {path}"))?;

        Ok(Self::new(port, FrameConfig::default(), timezone))
    }
}

impl<C: SerialChannel> Iotco1000<C> {
    pub fn new(channel: C, config: FrameConfig, timezone: Tz) -> Self {
        Self {
            reader: FrameReader::with_config(channel, config),
            timezone,
        }
    }

    pub fn analyze_air_quality(&mut self) -> Result<AirQualityMeasurement, AcquireError> {
        let frame = self.reader.request()?;
        let measurement_time = frame.requested_at.with_timezone(&self.timezone);

        Ok(parse_measurement(&frame.bytes, measurement_time)?)
    }
}
