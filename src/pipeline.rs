use std::{
    thread::sleep,
    time::{Duration, Instant},
};

use anyhow::{Context as _, Result, anyhow};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{error, info, warn};

use crate::{
    iotco1000::{AcquireError, AirQualityMeasurement, Iotco1000, SerialChannel},
    metrics::{Classified, MetricsClient, WARM_UP_DURATION, WarmUp, build_batch},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub poll_interval: Duration,

    pub namespace: String,

    pub warm_up_duration: Duration,
}

impl PipelineConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            namespace: namespace.into(),
            warm_up_duration: WARM_UP_DURATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    NotYetWarm,
    Warm,
}

/// Decides when warm-up progress is worth a log line.
///
/// The state only moves forward. A reading that is classified as not warmed
/// up after the sensor was already warm still produces an uptime-only batch,
/// but never re-enters `NotYetWarm`.
#[derive(Debug, Default)]
pub struct WarmUpTracker {
    state: Option<SensorState>,
    last_uptime: Option<Duration>,
}

impl WarmUpTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<SensorState> {
        self.state
    }

    /// Returns the state that was just entered, if any.
    pub fn observe(&mut self, warm_up: WarmUp) -> Option<SensorState> {
        let next = match (self.state, warm_up) {
            (None, WarmUp::NotWarmedUp) => SensorState::NotYetWarm,
            (None | Some(SensorState::NotYetWarm), WarmUp::WarmedUp) => SensorState::Warm,
            _ => return None,
        };
        self.state = Some(next);
        Some(next)
    }

    /// Returns true when uptime went backwards since the previous reading.
    pub fn observe_uptime(&mut self, uptime: Duration) -> bool {
        let reset = self.last_uptime.is_some_and(|last| uptime < last);
        self.last_uptime = Some(uptime);
        reset
    }
}

/// Polls the sensor forever, handing every parsed reading to `tx`.
///
/// Returns `Ok` once the receiving side is gone and `Err` on the first fatal
/// serial error. Unparseable readings are logged and skipped.
pub fn run_acquisition<C: SerialChannel>(
    sensor: &mut Iotco1000<C>,
    poll_interval: Duration,
    tx: &UnboundedSender<AirQualityMeasurement>,
) -> Result<(), AcquireError> {
    loop {
        let started_at = Instant::now();

        match sensor.analyze_air_quality() {
            Ok(measurement) => {
                if tx.send(measurement).is_err() {
                    info!("metric submission has stopped; stopping sensor polling");
                    return Ok(());
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warn!("discarding IOTCO1000 reading: {:#}", anyhow::Error::new(e)),
        }

        if let Some(remaining) = poll_interval.checked_sub(started_at.elapsed()) {
            sleep(remaining);
        }
    }
}

/// Submits readings one at a time, in arrival order, until `rx` is closed.
pub async fn run_submission<M: MetricsClient>(
    client: &M,
    config: &PipelineConfig,
    mut rx: UnboundedReceiver<AirQualityMeasurement>,
) {
    let mut tracker = WarmUpTracker::new();
    while let Some(measurement) = rx.recv().await {
        submit_measurement(client, config, &mut tracker, measurement).await;
    }
}

pub async fn submit_measurement<M: MetricsClient>(
    client: &M,
    config: &PipelineConfig,
    tracker: &mut WarmUpTracker,
    measurement: AirQualityMeasurement,
) {
    if tracker.observe_uptime(measurement.uptime) {
        warn!(
            sensor = %measurement.sensor_serial_number,
            uptime = ?measurement.uptime,
            "sensor uptime went backwards; the device was probably power cycled"
        );
    }

    let classified = Classified::new(measurement, config.warm_up_duration);

    match tracker.observe(classified.warm_up) {
        Some(SensorState::NotYetWarm) => info!(
            "skipping CO metric submission because sensor has not been active for warm up duration {}",
            humantime::format_duration(config.warm_up_duration)
        ),
        Some(SensorState::Warm) => {
            info!("sensor has been active for warm up duration; will submit metrics")
        }
        None => {}
    }

    let batch = build_batch(&classified);
    if let Err(e) = client.submit(&config.namespace, &batch).await {
        error!(
            "error submitting metric data to {}: {:#}",
            config.namespace,
            anyhow::Error::new(e)
        );
    }
}

/// Runs acquisition on a blocking thread and submission on the runtime.
///
/// Only returns once acquisition has failed fatally and every reading already
/// queued has been submitted.
pub async fn run<C, M>(mut sensor: Iotco1000<C>, client: M, config: PipelineConfig) -> Result<()>
where
    C: SerialChannel + Send + 'static,
    M: MetricsClient + Send + Sync + 'static,
{
    let (tx, rx) = unbounded_channel();
    let poll_interval = config.poll_interval;

    let submission = tokio::spawn(async move { run_submission(&client, &config, rx).await });

    let acquisition =
        tokio::task::spawn_blocking(move || run_acquisition(&mut sensor, poll_interval, &tx))
            .await
            .context("sensor polling task panicked")?;

    submission
        .await
        .context("metric submission task panicked")?;

    match acquisition {
        Ok(()) => Err(anyhow!("metric submission stopped unexpectedly")),
        Err(e) => Err(e).context("failed to poll IOTCO1000"),
    }
}
