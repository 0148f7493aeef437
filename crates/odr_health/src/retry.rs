//! Retry-until-stable primitive.
//!
//! Samples a monotonic counter once as baseline, then once per round for `rounds` rounds with
//! a fixed interval in between. The counter is healthy when the final sample equals the
//! baseline. Any failed read ends the probe at once.

use async_trait::async_trait;
use odr_shared::{HealthError, ParamRef, ProbeId};
use std::time::Duration;
use tracing::debug;

use crate::config::CheckConfig;
use crate::probes::{numeric, Probe, ProbeContext, ProbeResult};

pub const DEFAULT_ROUNDS: u32 = 3;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2_000);

/// How a counter is named in progress and verdict messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterLabel {
    /// Lower case plural, e.g. "underruns".
    pub noun: &'static str,
    /// Sentence start, e.g. "Underruns".
    pub title: &'static str,
}

pub const UNDERRUNS: CounterLabel = CounterLabel {
    noun: "underruns",
    title: "Underruns",
};

pub const LATE_PACKETS: CounterLabel = CounterLabel {
    noun: "late packets",
    title: "Late packets",
};

/// Samples seen by one probe within one Run, baseline first. Holds at most `rounds + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleHistory {
    samples: Vec<i64>,
    capacity: usize,
}

impl SampleHistory {
    pub fn new(rounds: u32) -> Self {
        let capacity = rounds as usize + 1;
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns false once the history is full; the sample is dropped.
    pub fn record(&mut self, sample: i64) -> bool {
        if self.is_full() {
            return false;
        }
        self.samples.push(sample);
        true
    }

    pub fn baseline(&self) -> Option<i64> {
        self.samples.first().copied()
    }

    pub fn last(&self) -> Option<i64> {
        self.samples.last().copied()
    }

    pub fn samples(&self) -> &[i64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }
}

/// Compare the final sample against the baseline.
///
/// Any change fails, a decrease included: a counter reset during the check is reported
/// rather than hidden.
pub fn stable_verdict(label: CounterLabel, rounds: u32, history: &SampleHistory) -> ProbeResult {
    let (baseline, last) = match (history.baseline(), history.last()) {
        (Some(b), Some(l)) if history.is_full() => (b, l),
        _ => {
            return Err(HealthError::threshold(
                history.len(),
                format!("Incomplete {} history: {} of {} samples", label.noun, history.len(), rounds + 1),
            ))
        }
    };

    if last == baseline {
        Ok(Some(format!("Number of {} is not increasing: {}", label.noun, last)))
    } else {
        Err(HealthError::threshold(
            last,
            format!(
                "{} observed during last {} checks: {} -> {}",
                label.title, rounds, baseline, last
            ),
        ))
    }
}

pub struct RetryUntilStable {
    id: ProbeId,
    param: ParamRef,
    label: CounterLabel,
    rounds: u32,
    interval: Duration,
}

impl RetryUntilStable {
    pub fn new(id: ProbeId, param: ParamRef, label: CounterLabel) -> Self {
        Self {
            id,
            param,
            label,
            rounds: DEFAULT_ROUNDS,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Rounds after the baseline. Clamped to at least one.
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn underruns(config: &CheckConfig) -> Self {
        Self::new(ProbeId::Underruns, ParamRef::fixed("sdr", "underruns"), UNDERRUNS)
            .with_rounds(config.counter_rounds)
            .with_interval(config.counter_interval())
    }

    pub fn late_packets(config: &CheckConfig) -> Self {
        Self::new(ProbeId::LatePackets, ParamRef::fixed("sdr", "latepackets"), LATE_PACKETS)
            .with_rounds(config.counter_rounds)
            .with_interval(config.counter_interval())
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Take the baseline and `rounds` further samples.
    pub async fn sample(&self, ctx: &ProbeContext<'_>) -> Result<SampleHistory, HealthError> {
        let mut history = SampleHistory::new(self.rounds);

        for round in 0..=self.rounds {
            let value = ctx.read(&self.param).await?;
            let count = numeric(&value, self.label.title)?;
            let stored = history.record(count);
            debug_assert!(stored, "sample history overflow at round {}", round);
            debug!(probe = %self.id, round, count, stored, "counter sample");

            if round == self.rounds {
                break;
            }
            if round == 0 {
                ctx.progress(format!("Checking for {}", self.label.noun));
            } else {
                ctx.progress(format!("Check {}/{}...", round, self.rounds));
            }
            ctx.sleep(self.interval).await;
        }

        Ok(history)
    }
}

#[async_trait]
impl Probe for RetryUntilStable {
    fn id(&self) -> ProbeId {
        self.id
    }

    async fn check(&self, ctx: &ProbeContext<'_>) -> ProbeResult {
        let history = self.sample(ctx).await?;
        stable_verdict(self.label, self.rounds, &history)
    }
}
