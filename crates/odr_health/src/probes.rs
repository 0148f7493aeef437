//! Health probe definitions
//!
//! A probe reads one or more parameters through the Parameter Client and turns the values
//! into a verdict. The verdicts themselves are plain functions so the thresholds can be
//! tested without any I/O.

use async_trait::async_trait;
use odr_shared::{DpdResults, HealthError, ParamRef, ParamValue, ProbeId};
use std::time::Duration;
use tracing::debug;

use crate::client::ParameterClient;
use crate::timer::Sleeper;
use crate::tracker::RunTracker;

/// `Ok(comment)` or the reason the probe failed.
pub type ProbeResult = Result<Option<String>, HealthError>;

/// What a probe may touch while it runs.
pub struct ProbeContext<'a> {
    id: ProbeId,
    client: &'a dyn ParameterClient,
    sleeper: &'a dyn Sleeper,
    tracker: &'a RunTracker,
}

impl<'a> ProbeContext<'a> {
    pub fn new(
        id: ProbeId,
        client: &'a dyn ParameterClient,
        sleeper: &'a dyn Sleeper,
        tracker: &'a RunTracker,
    ) -> Self {
        Self {
            id,
            client,
            sleeper,
            tracker,
        }
    }

    pub fn id(&self) -> ProbeId {
        self.id
    }

    pub fn client(&self) -> &dyn ParameterClient {
        self.client
    }

    pub async fn read(&self, param: &ParamRef) -> Result<ParamValue, HealthError> {
        let value = self.client.read(param).await?;
        debug!(probe = %self.id, %param, %value, "sampled");
        Ok(value)
    }

    pub async fn sleep(&self, delay: Duration) {
        self.sleeper.sleep(delay).await;
    }

    /// Progress comment while the probe stays pending.
    pub fn progress(&self, comment: impl Into<String>) {
        self.tracker.progress(self.id, comment);
    }
}

/// Health probe interface
#[async_trait]
pub trait Probe: Send + Sync {
    fn id(&self) -> ProbeId;

    async fn check(&self, ctx: &ProbeContext<'_>) -> ProbeResult;
}

/// Interpret a value as an integer, or fail naming what was expected.
pub fn numeric(value: &ParamValue, what: &str) -> Result<i64, HealthError> {
    value
        .as_i64()
        .ok_or_else(|| HealthError::threshold(value, format!("{} is not a number: {}", what, value)))
}

// ============================================================================
// Remote control reachability
// ============================================================================

pub struct RcReachableProbe {
    param: ParamRef,
}

impl RcReachableProbe {
    pub fn new() -> Self {
        Self {
            param: ParamRef::fixed("sdr", "freq"),
        }
    }
}

impl Default for RcReachableProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for RcReachableProbe {
    fn id(&self) -> ProbeId {
        ProbeId::RcReachable
    }

    async fn check(&self, ctx: &ProbeContext<'_>) -> ProbeResult {
        ctx.read(&self.param).await?;
        Ok(None)
    }
}

// ============================================================================
// GPSDO satellites
// ============================================================================

pub struct GpsdoProbe {
    param: ParamRef,
    min_satellites: i64,
}

impl GpsdoProbe {
    /// `min_satellites` is exclusive: the GPSDO must use more than this.
    pub fn new(min_satellites: i64) -> Self {
        Self {
            param: ParamRef::fixed("sdr", "gpsdo_num_sv"),
            min_satellites,
        }
    }
}

pub fn gpsdo_verdict(value: &ParamValue, min_satellites: i64) -> ProbeResult {
    let num_sv = numeric(value, "Number of SVs")?;
    if num_sv > min_satellites {
        Ok(Some(format!("Number of SVs used: {}", num_sv)))
    } else {
        Err(HealthError::threshold(num_sv, format!("Number of SVs ({}) is too low", num_sv)))
    }
}

#[async_trait]
impl Probe for GpsdoProbe {
    fn id(&self) -> ProbeId {
        ProbeId::GpsdoQuality
    }

    async fn check(&self, ctx: &ProbeContext<'_>) -> ProbeResult {
        let value = ctx.read(&self.param).await?;
        gpsdo_verdict(&value, self.min_satellites)
    }
}

// ============================================================================
// Sample rate
// ============================================================================

pub struct SampleRateProbe {
    param: ParamRef,
    expected: i64,
}

impl SampleRateProbe {
    pub fn new(expected: i64) -> Self {
        Self {
            param: ParamRef::fixed("modulator", "rate"),
            expected,
        }
    }
}

pub fn sample_rate_verdict(value: &ParamValue, expected: i64) -> ProbeResult {
    let rate = numeric(value, "Samplerate")?;
    if rate == expected {
        Ok(Some(format!("Samplerate: {}", rate)))
    } else {
        Err(HealthError::threshold(
            rate,
            format!("Samplerate is not {}ksps: {}", expected / 1000, rate),
        ))
    }
}

#[async_trait]
impl Probe for SampleRateProbe {
    fn id(&self) -> ProbeId {
        ProbeId::SampleRate
    }

    async fn check(&self, ctx: &ProbeContext<'_>) -> ProbeResult {
        let value = ctx.read(&self.param).await?;
        sample_rate_verdict(&value, self.expected)
    }
}

// ============================================================================
// Predistortion engine
// ============================================================================

pub struct DpdEngineProbe;

pub fn dpd_verdict(results: &DpdResults) -> ProbeResult {
    match results.state.as_deref() {
        Some(state) => Ok(Some(format!("State: {}", state))),
        None => Err(HealthError::threshold("none", "Predistortion engine reported no state")),
    }
}

#[async_trait]
impl Probe for DpdEngineProbe {
    fn id(&self) -> ProbeId {
        ProbeId::DpdEngine
    }

    async fn check(&self, ctx: &ProbeContext<'_>) -> ProbeResult {
        let results = ctx.client().dpd_results().await?;
        debug!(probe = %ctx.id(), state = ?results.state, "dpd results");
        dpd_verdict(&results)
    }
}
