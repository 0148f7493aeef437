//! ODR Health - cascading health check for the ODR-DabMod web API.
//!
//! The check reads a fixed chain of device parameters through a [`ParameterClient`], turns
//! each into an [`Outcome`](odr_shared::Outcome) and folds them into one
//! [`Aggregate`](odr_shared::Aggregate) per Run.

pub mod client;
pub mod config;
pub mod modulating;
pub mod orchestrator;
pub mod probes;
pub mod retry;
pub mod timer;
pub mod tracker;

pub use client::{FakeParameterClient, HttpParameterClient, ParameterClient};
pub use config::{CheckConfig, ConfigError, DeviceConfig, HealthConfig, CONFIG_ENV, CONFIG_PATH};
pub use modulating::ModulatingProbe;
pub use orchestrator::Orchestrator;
pub use probes::{Probe, ProbeContext, ProbeResult};
pub use retry::{RetryUntilStable, SampleHistory};
pub use timer::{RecordingSleeper, Sleeper, TokioSleeper};
pub use tracker::RunTracker;
