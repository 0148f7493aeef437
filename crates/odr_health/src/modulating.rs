//! Modulating-activity probe.
//!
//! Two samples of the frame counter, a fixed delay apart. Zero frames fails at once; a counter
//! that does not move between the samples fails too. Lack of change is the failure signal
//! here, the opposite of the underrun and late packet counters.

use async_trait::async_trait;
use odr_shared::{HealthError, ParamRef, ParamValue, ProbeId};
use std::time::Duration;

use crate::probes::{numeric, Probe, ProbeContext, ProbeResult};

pub struct ModulatingProbe {
    param: ParamRef,
    recheck_delay: Duration,
}

impl ModulatingProbe {
    pub fn new(recheck_delay: Duration) -> Self {
        Self {
            param: ParamRef::fixed("sdr", "frames"),
            recheck_delay,
        }
    }
}

/// First sample: the modulator must have produced at least one frame.
pub fn first_frames_verdict(value: &ParamValue) -> Result<i64, HealthError> {
    let frames = numeric(value, "Number of frames")?;
    if frames > 0 {
        Ok(frames)
    } else {
        Err(HealthError::threshold(frames, "number of frames is 0"))
    }
}

/// Second sample: the counter must have moved.
pub fn frames_verdict(first: i64, second: i64) -> ProbeResult {
    if second == first {
        Err(HealthError::threshold(
            second,
            format!("Frame counter not incrementing: {}", second),
        ))
    } else {
        Ok(Some(format!("Number of frames modulated: {}", second)))
    }
}

#[async_trait]
impl Probe for ModulatingProbe {
    fn id(&self) -> ProbeId {
        ProbeId::Modulating
    }

    async fn check(&self, ctx: &ProbeContext<'_>) -> ProbeResult {
        let first = first_frames_verdict(&ctx.read(&self.param).await?)?;
        ctx.sleep(self.recheck_delay).await;
        let second = numeric(&ctx.read(&self.param).await?, "Number of frames")?;
        frames_verdict(first, second)
    }
}
