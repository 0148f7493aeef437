//! Command implementations for odrctl

use anyhow::{Context, Result};
use chrono::Utc;
use odr_health::{
    CheckConfig, HealthConfig, HttpParameterClient, Orchestrator, ParameterClient, RunTracker, Sleeper,
};
use odr_shared::{Aggregate, DpdCommand, ParamRef, ParamValue, RunReport};
use std::path::Path;
use tracing::{debug, info};

use crate::cli::DpdAction;
use crate::errors::{EXIT_DEGRADED, EXIT_SUCCESS};
use crate::output;

/// A client plus the settings a command needs.
pub struct Session<C> {
    pub device: String,
    pub checks: CheckConfig,
    pub client: C,
}

impl Session<HttpParameterClient> {
    /// Load the configuration, apply `--url` and build the HTTP client.
    pub fn open(config_path: Option<&Path>, url: Option<&str>) -> Result<Self> {
        let mut config = HealthConfig::load(config_path).context("Failed to load configuration")?;
        if let Some(url) = url {
            config.device.base_url = url.to_string();
            config.validate().context("Invalid --url")?;
        }

        let client = HttpParameterClient::new(&config.device).context("Failed to create HTTP client")?;
        debug!("Using modulator at {}", client.base_url());
        Ok(Self {
            device: client.base_url().to_string(),
            checks: config.checks,
            client,
        })
    }
}

/// Run the health check, rendering outcomes as they resolve.
pub async fn check<C, S>(session: Session<C>, sleeper: S, json: bool) -> Result<i32>
where
    C: ParameterClient,
    S: Sleeper,
{
    let orchestrator = Orchestrator::with_sleeper(session.client, sleeper, &session.checks);
    let tracker = RunTracker::new();
    let mut rx = tracker.subscribe();
    let started_at = Utc::now();

    if !json {
        println!("Checking {}", session.device);
    }

    let run = orchestrator.run_with(&tracker);
    tokio::pin!(run);

    let mut shown = Aggregate::standard();
    let aggregate = loop {
        tokio::select! {
            aggregate = &mut run => break aggregate,
            Ok(()) = rx.changed() => {
                let current = rx.borrow_and_update().clone();
                if !json {
                    output::print_lines(&output::transitions(&shown, &current));
                }
                shown = current;
            }
        }
    };
    if !json {
        output::print_lines(&output::transitions(&shown, &aggregate));
        println!();
    }

    let report = RunReport::new(session.device, started_at, aggregate);
    info!(run_id = %report.run_id, overall = %report.overall, "Run complete");

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_lines(&output::report_lines(&report));
    }

    Ok(if report.is_ok() { EXIT_SUCCESS } else { EXIT_DEGRADED })
}

pub async fn get<C: ParameterClient>(client: &C, controllable: &str, param: &str) -> Result<i32> {
    let param = ParamRef::new(controllable, param)?;
    let value = client
        .read(&param)
        .await
        .with_context(|| format!("Failed to read {}", param))?;
    println!("{}", value);
    Ok(EXIT_SUCCESS)
}

pub async fn set<C: ParameterClient>(client: &C, controllable: &str, param: &str, value: &str) -> Result<i32> {
    let param = ParamRef::new(controllable, param)?;
    let value = ParamValue::parse(value);
    client
        .write(&param, &value)
        .await
        .with_context(|| format!("Failed to set {}", param))?;
    println!("{} = {}", param, value);
    Ok(EXIT_SUCCESS)
}

pub async fn params<C: ParameterClient>(client: &C, json: bool) -> Result<i32> {
    let table = client
        .rc_parameters()
        .await
        .context("Failed to fetch the parameter table")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
    } else {
        output::print_lines(&output::param_table_lines(&table));
    }
    Ok(EXIT_SUCCESS)
}

pub async fn dpd<C: ParameterClient>(client: &C, action: DpdAction) -> Result<i32> {
    let command = match action {
        DpdAction::Status { json } => {
            let results = client
                .dpd_results()
                .await
                .context("Failed to fetch predistortion results")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                output::print_lines(&output::dpd_lines(&results));
            }
            return Ok(EXIT_SUCCESS);
        }
        DpdAction::Calibrate => DpdCommand::Calibrate,
        DpdAction::TriggerRun => DpdCommand::TriggerRun,
        DpdAction::Adapt => DpdCommand::Adapt,
        DpdAction::Reset => DpdCommand::Reset,
        DpdAction::RestoreDump { dump_id } => DpdCommand::RestoreDump(dump_id),
    };

    client
        .dpd_command(&command)
        .await
        .with_context(|| format!("Predistortion {} failed", command))?;
    println!("Predistortion {}: acknowledged", command);
    Ok(EXIT_SUCCESS)
}
