//! Types exchanged with the digital predistortion (DPD) engine.
//!
//! The engine is an external collaborator: the health check only looks at `state`, the CLI
//! can show the rest and fire the acknowledge-only commands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload of `GET /api/dpd_results`. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DpdResults {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub stateprogress: Option<f64>,
    #[serde(default)]
    pub summary: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statplot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modelplot: Option<String>,
    #[serde(default)]
    pub modeldata: Option<serde_json::Value>,
    #[serde(default)]
    pub adapt_dumps: Vec<serde_json::Value>,
}

/// Fire-and-acknowledge commands understood by the DPD engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DpdCommand {
    Calibrate,
    TriggerRun,
    Adapt,
    Reset,
    RestoreDump(String),
}

impl DpdCommand {
    /// API path of the command endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            DpdCommand::Calibrate => "/api/dpd_calibrate",
            DpdCommand::TriggerRun => "/api/dpd_trigger_run",
            DpdCommand::Adapt => "/api/dpd_adapt",
            DpdCommand::Reset => "/api/dpd_reset",
            DpdCommand::RestoreDump(_) => "/api/dpd_restore_dump",
        }
    }

    /// JSON body of the POST.
    pub fn body(&self) -> serde_json::Value {
        match self {
            DpdCommand::RestoreDump(dump_id) => serde_json::json!({ "dump_id": dump_id }),
            _ => serde_json::json!({}),
        }
    }
}

impl fmt::Display for DpdCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DpdCommand::Calibrate => write!(f, "calibrate"),
            DpdCommand::TriggerRun => write!(f, "trigger run"),
            DpdCommand::Adapt => write!(f, "adapt"),
            DpdCommand::Reset => write!(f, "reset"),
            DpdCommand::RestoreDump(id) => write!(f, "restore dump {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_tolerate_missing_fields() {
        let r: DpdResults = serde_json::from_str("{}").unwrap();
        assert_eq!(r.state, None);
        assert!(r.summary.is_empty());

        let r: DpdResults = serde_json::from_str(
            r#"{"state":"Idle","stateprogress":0,"summary":["Calibration done"],"modeldata":null,"adapt_dumps":[]}"#,
        )
        .unwrap();
        assert_eq!(r.state.as_deref(), Some("Idle"));
        assert_eq!(r.summary, vec!["Calibration done".to_string()]);
    }

    #[test]
    fn test_command_paths() {
        assert_eq!(DpdCommand::TriggerRun.path(), "/api/dpd_trigger_run");
        assert_eq!(
            DpdCommand::RestoreDump("adapt_2019".into()).body(),
            serde_json::json!({"dump_id": "adapt_2019"})
        );
        assert_eq!(DpdCommand::Reset.body(), serde_json::json!({}));
    }
}
