//! Final record of one health-check Run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Aggregate, OverallStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub device: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub overall: OverallStatus,
    pub aggregate: Aggregate,
}

impl RunReport {
    pub fn new(device: impl Into<String>, started_at: DateTime<Utc>, aggregate: Aggregate) -> Self {
        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        Self {
            run_id: Uuid::new_v4(),
            device: device.into(),
            started_at,
            finished_at,
            duration_ms,
            overall: aggregate.overall(),
            aggregate,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.overall == OverallStatus::Ok
    }
}
