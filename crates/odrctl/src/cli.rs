//! Command line definition

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "odrctl")]
#[command(about = "ODR-DabMod health check and remote control", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: $ODR_HEALTH_CONFIG or /etc/odr/health.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the modulator web API, overrides the config file
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the modulator health check
    Check {
        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read one parameter
    Get {
        /// Controllable, e.g. "sdr"
        controllable: String,
        /// Parameter name, e.g. "freq"
        param: String,
    },

    /// Write one parameter
    Set {
        controllable: String,
        param: String,
        /// New value; integers and floats are sent as numbers
        value: String,
    },

    /// Show the remote control parameter table
    Params {
        #[arg(long)]
        json: bool,
    },

    /// Digital predistortion engine
    Dpd {
        #[command(subcommand)]
        action: DpdAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum DpdAction {
    /// Show the engine state and summary
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Start a calibration
    Calibrate,
    /// Capture and compute a new model
    TriggerRun,
    /// Apply the computed model
    Adapt,
    /// Reset predistortion to the identity model
    Reset,
    /// Restore a saved adaptation dump
    RestoreDump {
        /// Dump identifier as listed by `dpd status`
        dump_id: String,
    },
}
