//! Run scenarios with a scripted modulator and simulated time.

use async_trait::async_trait;
use odr_health::{CheckConfig, FakeParameterClient, Orchestrator, ParameterClient, RecordingSleeper, RunTracker};
use odr_shared::{
    ClientError, DpdCommand, DpdResults, Outcome, OverallStatus, ParamRef, ParamValue, ProbeId, RcParameters,
};
use std::time::Duration;

fn orchestrator(client: FakeParameterClient) -> Orchestrator<FakeParameterClient, RecordingSleeper> {
    Orchestrator::with_sleeper(client, RecordingSleeper::new(), &CheckConfig::default())
}

/// Scripted modulator whose reads of one parameter never answer.
struct HangingParam {
    inner: FakeParameterClient,
    hang: ParamRef,
}

#[async_trait]
impl ParameterClient for HangingParam {
    async fn read(&self, param: &ParamRef) -> Result<ParamValue, ClientError> {
        if *param == self.hang {
            return std::future::pending().await;
        }
        self.inner.read(param).await
    }

    async fn write(&self, param: &ParamRef, value: &ParamValue) -> Result<(), ClientError> {
        self.inner.write(param, value).await
    }

    async fn rc_parameters(&self) -> Result<RcParameters, ClientError> {
        self.inner.rc_parameters().await
    }

    async fn dpd_results(&self) -> Result<DpdResults, ClientError> {
        self.inner.dpd_results().await
    }

    async fn dpd_command(&self, command: &DpdCommand) -> Result<(), ClientError> {
        self.inner.dpd_command(command).await
    }
}

fn comment(agg: &odr_shared::Aggregate, id: ProbeId) -> Option<String> {
    agg.outcome(id).and_then(|o| o.comment().map(String::from))
}

#[tokio::test]
async fn test_every_probe_reaches_terminal_outcome() {
    let agg = orchestrator(FakeParameterClient::healthy()).run().await;

    assert!(agg.is_complete());
    assert_eq!(agg.counts(), (7, 0, 0));
    assert!(agg.overall_ok());
    assert_eq!(comment(&agg, ProbeId::RcReachable), None);
    assert_eq!(comment(&agg, ProbeId::Modulating).as_deref(), Some("Number of frames modulated: 1010"));
    assert_eq!(comment(&agg, ProbeId::GpsdoQuality).as_deref(), Some("Number of SVs used: 7"));
    assert_eq!(comment(&agg, ProbeId::Underruns).as_deref(), Some("Number of underruns is not increasing: 0"));
    assert_eq!(comment(&agg, ProbeId::SampleRate).as_deref(), Some("Samplerate: 8192000"));
}

#[tokio::test]
async fn test_unreachable_rc_does_not_block_gpsdo() {
    let client = FakeParameterClient::healthy().with_error(
        ParamRef::fixed("sdr", "freq"),
        ClientError::Unreachable("connection refused".into()),
    );
    let orch = orchestrator(client);
    let agg = orch.run().await;

    assert_eq!(
        agg.outcome(ProbeId::RcReachable),
        Some(&Outcome::Fail("Device unreachable: connection refused".into()))
    );
    assert_eq!(orch.client().read_count(&ParamRef::fixed("sdr", "gpsdo_num_sv")), 1);
    assert!(agg.outcome(ProbeId::GpsdoQuality).is_some_and(Outcome::is_ok));
    assert_eq!(agg.overall(), OverallStatus::Degraded);
}

#[tokio::test]
async fn test_device_down_fails_every_probe() {
    let orch = orchestrator(FakeParameterClient::unreachable("connection refused"));
    let agg = orch.run().await;

    assert_eq!(agg.counts(), (0, 7, 0));
    // Counter chains stop at their first failed read
    assert_eq!(orch.client().read_count(&ParamRef::fixed("sdr", "underruns")), 1);
    assert_eq!(orch.client().read_count(&ParamRef::fixed("sdr", "latepackets")), 1);
    assert_eq!(orch.sleeper().count(), 0);
}

#[tokio::test]
async fn test_incrementing_underruns_degrade_run() {
    let client = FakeParameterClient::healthy()
        .with_values(ParamRef::fixed("sdr", "underruns"), ["5", "5", "5", "7"]);
    let agg = orchestrator(client).run().await;

    assert_eq!(
        agg.outcome(ProbeId::Underruns),
        Some(&Outcome::Fail("Underruns observed during last 3 checks: 5 -> 7".into()))
    );
    assert!(agg.outcome(ProbeId::SampleRate).is_some_and(Outcome::is_ok));
    assert!(agg.outcome(ProbeId::DpdEngine).is_some_and(Outcome::is_ok));
    assert_eq!(agg.overall(), OverallStatus::Degraded);
}

#[tokio::test]
async fn test_threshold_failures_report_observed_values() {
    let client = FakeParameterClient::healthy()
        .with_value(ParamRef::fixed("sdr", "gpsdo_num_sv"), "3")
        .with_value(ParamRef::fixed("modulator", "rate"), "4096000");
    let agg = orchestrator(client).run().await;

    assert_eq!(
        agg.outcome(ProbeId::GpsdoQuality),
        Some(&Outcome::Fail("Number of SVs (3) is too low".into()))
    );
    assert_eq!(
        agg.outcome(ProbeId::SampleRate),
        Some(&Outcome::Fail("Samplerate is not 8192ksps: 4096000".into()))
    );
    assert_eq!(agg.counts(), (5, 2, 0));
}

#[tokio::test]
async fn test_counter_chains_interleave() {
    let orch = orchestrator(FakeParameterClient::healthy());
    orch.run().await;

    let log = orch.client().read_log();
    let underruns = ParamRef::fixed("sdr", "underruns");
    let late = ParamRef::fixed("sdr", "latepackets");

    let first_late = log.iter().position(|p| *p == late).unwrap();
    let last_underrun = log.iter().rposition(|p| *p == underruns).unwrap();
    assert!(first_late < last_underrun, "late packet chain should start before underruns finish");
    assert_eq!(orch.client().read_count(&underruns), 4);
    assert_eq!(orch.client().read_count(&late), 4);
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    // Same orchestrator twice: the frame counter keeps moving across both Runs
    let client = FakeParameterClient::healthy()
        .with_values(ParamRef::fixed("sdr", "frames"), ["1000", "1010", "1000", "1010"]);
    let orch = orchestrator(client);

    let first = orch.run().await;
    let second = orch.run().await;
    assert_eq!(first.overall(), OverallStatus::Ok);
    assert_eq!(first, second);
    assert_eq!(orch.client().read_count(&ParamRef::fixed("sdr", "frames")), 4);

    let failing = || {
        FakeParameterClient::healthy()
            .with_value(ParamRef::fixed("sdr", "frames"), "0")
            .with_error(ParamRef::fixed("sdr", "freq"), ClientError::Device("Timeout".into()))
    };
    let orch = orchestrator(failing());
    let a = orch.run().await;
    let b = orch.run().await;
    assert_eq!(a.overall(), OverallStatus::Degraded);
    assert_eq!(a, b);
}

#[tokio::test(start_paused = true)]
async fn test_rate_and_dpd_do_not_wait_for_late_packets() {
    let late = ParamRef::fixed("sdr", "latepackets");
    let client = HangingParam {
        inner: FakeParameterClient::healthy(),
        hang: late.clone(),
    };
    let orch = Orchestrator::with_sleeper(client, RecordingSleeper::new(), &CheckConfig::default());
    let tracker = RunTracker::new();

    let run = tokio::time::timeout(Duration::from_millis(300), orch.run_with(&tracker)).await;
    assert!(run.is_err(), "run cannot finish while late packets hang");

    let agg = tracker.snapshot();
    assert!(agg.outcome(ProbeId::LatePackets).is_some_and(|o| !o.is_terminal()));
    assert_eq!(
        agg.outcome(ProbeId::Underruns),
        Some(&Outcome::Ok(Some("Number of underruns is not increasing: 0".into())))
    );
    assert_eq!(
        agg.outcome(ProbeId::SampleRate),
        Some(&Outcome::Ok(Some("Samplerate: 8192000".into())))
    );
    assert_eq!(
        agg.outcome(ProbeId::DpdEngine),
        Some(&Outcome::Ok(Some("State: Idle".into())))
    );
    assert_eq!(agg.overall(), OverallStatus::Running);
}

#[tokio::test]
async fn test_tracker_is_reset_between_runs() {
    let tracker = RunTracker::new();
    let degraded = orchestrator(FakeParameterClient::healthy().with_value(ParamRef::fixed("sdr", "frames"), "0"));
    assert_eq!(degraded.run_with(&tracker).await.overall(), OverallStatus::Degraded);

    let healthy = orchestrator(FakeParameterClient::healthy());
    let agg = healthy.run_with(&tracker).await;
    assert_eq!(agg.overall(), OverallStatus::Ok);
    assert_eq!(tracker.snapshot(), agg);
}

#[tokio::test]
async fn test_observer_sees_degraded_before_completion() {
    let tracker = RunTracker::new();
    let mut rx = tracker.subscribe();
    let orch = orchestrator(FakeParameterClient::healthy().with_value(ParamRef::fixed("sdr", "frames"), "0"));

    let run = orch.run_with(&tracker);
    let watch = async {
        let mut saw_early_degraded = false;
        while rx.changed().await.is_ok() {
            let agg = rx.borrow_and_update().clone();
            if agg.overall() == OverallStatus::Degraded && !agg.is_complete() {
                saw_early_degraded = true;
            }
            if agg.is_complete() {
                break;
            }
        }
        saw_early_degraded
    };

    let (agg, saw_early_degraded) = tokio::join!(run, watch);
    assert!(agg.is_complete());
    assert!(saw_early_degraded);
}

#[tokio::test]
async fn test_custom_check_config() {
    let config = CheckConfig {
        counter_rounds: 1,
        counter_interval_ms: 500,
        frame_recheck_delay_ms: 50,
        ..CheckConfig::default()
    };
    let orch = Orchestrator::with_sleeper(FakeParameterClient::healthy(), RecordingSleeper::new(), &config);
    assert!(orch.run().await.overall_ok());

    let mut delays = orch.sleeper().delays();
    delays.sort();
    assert_eq!(
        delays,
        vec![Duration::from_millis(50), Duration::from_millis(500), Duration::from_millis(500)]
    );
}
