//! Parameter addressing and values.
//!
//! A parameter is addressed by `(controllable, param)`, e.g. `sdr.freq`. Values arrive untyped
//! from the web API: the remote control answers with strings most of the time, but the JSON
//! layer may also hand back numbers. Each probe decides how to interpret what it reads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ParamError;

/// Reference to one addressable value on the device. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamRef {
    controllable: String,
    param: String,
}

impl ParamRef {
    pub fn new(controllable: impl Into<String>, param: impl Into<String>) -> Result<Self, ParamError> {
        let controllable = controllable.into();
        let param = param.into();
        if controllable.trim().is_empty() {
            return Err(ParamError::EmptyControllable);
        }
        if param.trim().is_empty() {
            return Err(ParamError::EmptyParam);
        }
        Ok(Self { controllable, param })
    }

    /// Build a reference from compile-time names used by the built-in probes.
    pub fn fixed(controllable: &'static str, param: &'static str) -> Self {
        debug_assert!(!controllable.is_empty() && !param.is_empty());
        Self {
            controllable: controllable.to_string(),
            param: param.to_string(),
        }
    }

    pub fn controllable(&self) -> &str {
        &self.controllable
    }

    pub fn param(&self) -> &str {
        &self.param
    }
}

impl fmt::Display for ParamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.controllable, self.param)
    }
}

/// A parameter value as seen at the transport boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(serde_json::Number),
    Text(String),
}

impl ParamValue {
    /// Convert the `data` member of an envelope. Never fails: exotic JSON is kept as text.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => ParamValue::Number(n),
            serde_json::Value::String(s) => ParamValue::Text(s),
            serde_json::Value::Bool(b) => ParamValue::Text(if b { "1" } else { "0" }.to_string()),
            serde_json::Value::Null => ParamValue::Text(String::new()),
            other => ParamValue::Text(other.to_string()),
        }
    }

    /// Parse a command line argument: integers and floats become numbers, the rest is text.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return ParamValue::Number(i.into());
        }
        if let Some(n) = trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            return ParamValue::Number(n);
        }
        ParamValue::Text(input.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => n.as_f64(),
            ParamValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    /// Integer view; floats are accepted only when they carry no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Number(n) => n.as_i64().or_else(|| integral(n.as_f64()?)),
            ParamValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| integral(s.parse::<f64>().ok()?))
            }
        }
    }

    /// Boolean view of "0"/"1" style flags.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Number(_) => self.as_i64().map(|i| i != 0),
            ParamValue::Text(s) => match s.trim() {
                "1" | "true" => Some(true),
                "0" | "false" => Some(false),
                _ => None,
            },
        }
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Number(v.into())
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// One row of the remote-control parameter table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcParameter {
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// controllable -> parameter -> value/help, as served by `/api/rc_parameters`.
pub type RcParameters = BTreeMap<String, BTreeMap<String, RcParameter>>;
