//! Run sequencer.
//!
//! Ordering:
//! - RC reachability, modulating activity and GPSDO run strictly one after another.
//! - After GPSDO the underrun and late packet chains start together.
//! - Sample rate and predistortion liveness follow the underrun chain only.
//!
//! A failed probe never stops the ones after it. The Run ends when every probe is terminal.

use odr_shared::{Aggregate, Outcome, ProbeId};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::client::ParameterClient;
use crate::config::CheckConfig;
use crate::modulating::ModulatingProbe;
use crate::probes::{DpdEngineProbe, GpsdoProbe, Probe, ProbeContext, RcReachableProbe, SampleRateProbe};
use crate::retry::RetryUntilStable;
use crate::timer::{Sleeper, TokioSleeper};
use crate::tracker::RunTracker;

pub struct Orchestrator<C, S = TokioSleeper> {
    client: C,
    sleeper: S,
    rc: RcReachableProbe,
    modulating: ModulatingProbe,
    gpsdo: GpsdoProbe,
    underruns: RetryUntilStable,
    late_packets: RetryUntilStable,
    sample_rate: SampleRateProbe,
    dpd: DpdEngineProbe,
}

impl<C: ParameterClient> Orchestrator<C, TokioSleeper> {
    pub fn new(client: C, checks: &CheckConfig) -> Self {
        Self::with_sleeper(client, TokioSleeper, checks)
    }
}

impl<C: ParameterClient, S: Sleeper> Orchestrator<C, S> {
    pub fn with_sleeper(client: C, sleeper: S, checks: &CheckConfig) -> Self {
        Self {
            client,
            sleeper,
            rc: RcReachableProbe::new(),
            modulating: ModulatingProbe::new(checks.frame_recheck_delay()),
            gpsdo: GpsdoProbe::new(checks.min_gpsdo_satellites),
            underruns: RetryUntilStable::underruns(checks),
            late_packets: RetryUntilStable::late_packets(checks),
            sample_rate: SampleRateProbe::new(checks.expected_sample_rate),
            dpd: DpdEngineProbe,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// One fresh Run with a private tracker.
    pub async fn run(&self) -> Aggregate {
        let tracker = RunTracker::new();
        self.run_with(&tracker).await
    }

    /// One fresh Run published on `tracker`. The tracker is reset first.
    pub async fn run_with(&self, tracker: &RunTracker) -> Aggregate {
        tracker.reset();
        let started = Instant::now();
        info!("Health check started");

        self.step(&self.rc, tracker).await;
        self.step(&self.modulating, tracker).await;
        self.step(&self.gpsdo, tracker).await;

        tokio::join!(self.step(&self.late_packets, tracker), async {
            self.step(&self.underruns, tracker).await;
            self.step(&self.sample_rate, tracker).await;
            self.step(&self.dpd, tracker).await;
        });

        let aggregate = tracker.snapshot();
        let (ok, fail, pending) = aggregate.counts();
        info!(
            overall = %aggregate.overall(),
            ok,
            fail,
            pending,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Health check finished"
        );
        aggregate
    }

    async fn step(&self, probe: &dyn Probe, tracker: &RunTracker) -> Outcome {
        let id: ProbeId = probe.id();
        let ctx = ProbeContext::new(id, &self.client, &self.sleeper, tracker);

        let outcome = match probe.check(&ctx).await {
            Ok(comment) => Outcome::Ok(comment),
            Err(e) => {
                debug!(probe = %id, kind = e.kind(), "probe failed");
                Outcome::Fail(e.to_string())
            }
        };

        if let Err(e) = tracker.resolve(id, outcome.clone()) {
            warn!(probe = %id, "Outcome not recorded: {}", e);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FakeParameterClient;
    use crate::timer::RecordingSleeper;
    use odr_shared::{OverallStatus, ParamRef};
    use std::time::Duration;

    fn orchestrator(client: FakeParameterClient) -> Orchestrator<FakeParameterClient, RecordingSleeper> {
        Orchestrator::with_sleeper(client, RecordingSleeper::new(), &CheckConfig::default())
    }

    #[tokio::test]
    async fn test_healthy_device() {
        let orch = orchestrator(FakeParameterClient::healthy());
        let agg = orch.run().await;

        assert!(agg.is_complete());
        assert_eq!(agg.overall(), OverallStatus::Ok);
        assert_eq!(
            agg.outcome(ProbeId::DpdEngine).and_then(|o| o.comment()),
            Some("State: Idle")
        );
    }

    #[tokio::test]
    async fn test_delays_follow_config() {
        let orch = orchestrator(FakeParameterClient::healthy());
        orch.run().await;

        let delays = orch.sleeper().delays();
        assert_eq!(delays.len(), 7);
        assert_eq!(delays[0], Duration::from_millis(200));
        assert_eq!(
            delays.iter().filter(|d| **d == Duration::from_millis(2_000)).count(),
            6
        );
    }

    #[tokio::test]
    async fn test_gating_probes_run_in_order() {
        let orch = orchestrator(FakeParameterClient::healthy());
        orch.run().await;

        let log = orch.client().read_log();
        assert_eq!(log[0], ParamRef::fixed("sdr", "freq"));
        assert_eq!(log[1], ParamRef::fixed("sdr", "frames"));
        assert_eq!(log[2], ParamRef::fixed("sdr", "frames"));
        assert_eq!(log[3], ParamRef::fixed("sdr", "gpsdo_num_sv"));

        let rate_at = log.iter().position(|p| *p == ParamRef::fixed("modulator", "rate")).unwrap();
        let last_underrun = log.iter().rposition(|p| *p == ParamRef::fixed("sdr", "underruns")).unwrap();
        assert!(rate_at > last_underrun);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_probes() {
        let client = FakeParameterClient::healthy().with_value(ParamRef::fixed("sdr", "frames"), "0");
        let orch = orchestrator(client);
        let agg = orch.run().await;

        assert_eq!(
            agg.outcome(ProbeId::Modulating),
            Some(&Outcome::Fail("number of frames is 0".into()))
        );
        assert!(agg.outcome(ProbeId::GpsdoQuality).is_some_and(Outcome::is_ok));
        assert!(agg.is_complete());
        assert_eq!(agg.overall(), OverallStatus::Degraded);
    }
}
