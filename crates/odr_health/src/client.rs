//! Parameter Client
//!
//! Request/response shim over the modulator web API. One call is one round trip: no retries,
//! no caching. Retry policy belongs to the probes.
//!
//! Production code uses `HttpParameterClient`. Tests use `FakeParameterClient` with scripted
//! responses per parameter.

use async_trait::async_trait;
use odr_shared::envelope;
use odr_shared::{ClientError, DpdCommand, DpdResults, ParamRef, ParamValue, RcParameters};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use crate::config::DeviceConfig;

// ============================================================================
// Client Trait
// ============================================================================

#[async_trait]
pub trait ParameterClient: Send + Sync {
    /// Read one parameter.
    async fn read(&self, param: &ParamRef) -> Result<ParamValue, ClientError>;

    /// Write one parameter.
    async fn write(&self, param: &ParamRef, value: &ParamValue) -> Result<(), ClientError>;

    /// Full remote-control parameter table.
    async fn rc_parameters(&self) -> Result<RcParameters, ClientError>;

    /// Current results of the predistortion engine.
    async fn dpd_results(&self) -> Result<DpdResults, ClientError>;

    /// Fire a predistortion command and wait for the acknowledge.
    async fn dpd_command(&self, command: &DpdCommand) -> Result<(), ClientError>;
}

// ============================================================================
// HTTP Client (Production)
// ============================================================================

pub struct HttpParameterClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpParameterClient {
    pub fn new(config: &DeviceConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Unreachable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a finished request into the envelope payload.
    async fn payload(
        &self,
        what: &str,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Value, ClientError> {
        let response = response.map_err(|e| {
            debug!("{} failed in transport: {}", what, e);
            ClientError::Unreachable(e.to_string())
        })?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Unreachable(format!("failed to read response body: {}", e)))?;

        let result = envelope::decode(status, &body);
        match &result {
            Ok(data) => debug!("{} -> HTTP {} {}", what, status, data),
            Err(e) => debug!("{} -> HTTP {} error: {}", what, status, e),
        }
        result
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ClientError> {
        let response = self.client.get(self.url(path)).query(query).send().await;
        self.payload(&format!("GET {}", path), response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        let response = self.client.post(self.url(path)).json(body).send().await;
        self.payload(&format!("POST {}", path), response).await
    }
}

fn malformed(what: &str, e: serde_json::Error) -> ClientError {
    ClientError::Unreachable(format!("malformed {} payload: {}", what, e))
}

#[async_trait]
impl ParameterClient for HttpParameterClient {
    async fn read(&self, param: &ParamRef) -> Result<ParamValue, ClientError> {
        let data = self
            .get(
                "/api/parameter",
                &[("controllable", param.controllable()), ("param", param.param())],
            )
            .await?;
        Ok(ParamValue::from_json(data))
    }

    async fn write(&self, param: &ParamRef, value: &ParamValue) -> Result<(), ClientError> {
        let body = serde_json::json!({
            "controllable": param.controllable(),
            "param": param.param(),
            "value": value,
        });
        self.post("/api/parameter", &body).await.map(|_| ())
    }

    async fn rc_parameters(&self) -> Result<RcParameters, ClientError> {
        let data = self.get("/api/rc_parameters", &[]).await?;
        serde_json::from_value(data).map_err(|e| malformed("rc_parameters", e))
    }

    async fn dpd_results(&self) -> Result<DpdResults, ClientError> {
        let data = self.get("/api/dpd_results", &[]).await?;
        serde_json::from_value(data).map_err(|e| malformed("dpd_results", e))
    }

    async fn dpd_command(&self, command: &DpdCommand) -> Result<(), ClientError> {
        self.post(command.path(), &command.body()).await.map(|_| ())
    }
}

// ============================================================================
// Fake Client (Testing)
// ============================================================================

type Script<T> = VecDeque<Result<T, ClientError>>;

/// Scripted client for deterministic tests.
///
/// Each parameter has a queue of responses. Reads pop from the front; the last response
/// repeats forever. Unknown parameters fail like the device does for an unknown name.
#[derive(Default)]
pub struct FakeParameterClient {
    reads: Mutex<HashMap<ParamRef, Script<ParamValue>>>,
    read_log: Mutex<Vec<ParamRef>>,
    writes: Mutex<Vec<(ParamRef, ParamValue)>>,
    write_error: Mutex<Option<ClientError>>,
    rc_parameters: Mutex<Option<Result<RcParameters, ClientError>>>,
    dpd: Mutex<Script<DpdResults>>,
    commands: Mutex<Vec<DpdCommand>>,
}

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn next_scripted<T: Clone>(script: &mut Script<T>) -> Option<Result<T, ClientError>> {
    if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().cloned()
    }
}

impl FakeParameterClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A modulator where every probe of the health check passes.
    pub fn healthy() -> Self {
        Self::new()
            .with_value(ParamRef::fixed("sdr", "freq"), "229072000")
            .with_values(ParamRef::fixed("sdr", "frames"), ["1000", "1010"])
            .with_value(ParamRef::fixed("sdr", "gpsdo_num_sv"), "7")
            .with_value(ParamRef::fixed("sdr", "underruns"), "0")
            .with_value(ParamRef::fixed("sdr", "latepackets"), "0")
            .with_value(ParamRef::fixed("modulator", "rate"), "8192000")
            .with_dpd(DpdResults {
                state: Some("Idle".into()),
                ..Default::default()
            })
    }

    /// A device that answers nothing at all.
    pub fn unreachable(msg: &str) -> Self {
        let client = Self::new();
        *locked(&client.write_error) = Some(ClientError::Unreachable(msg.to_string()));
        *locked(&client.rc_parameters) = Some(Err(ClientError::Unreachable(msg.to_string())));
        locked(&client.dpd).push_back(Err(ClientError::Unreachable(msg.to_string())));
        for (controllable, param) in [
            ("sdr", "freq"),
            ("sdr", "frames"),
            ("sdr", "gpsdo_num_sv"),
            ("sdr", "underruns"),
            ("sdr", "latepackets"),
            ("modulator", "rate"),
        ] {
            locked(&client.reads).insert(
                ParamRef::fixed(controllable, param),
                VecDeque::from([Err(ClientError::Unreachable(msg.to_string()))]),
            );
        }
        client
    }

    /// Replace the script of one parameter.
    pub fn with_script(self, param: ParamRef, script: Vec<Result<ParamValue, ClientError>>) -> Self {
        locked(&self.reads).insert(param, script.into());
        self
    }

    pub fn with_value(self, param: ParamRef, value: impl Into<ParamValue>) -> Self {
        self.with_script(param, vec![Ok(value.into())])
    }

    pub fn with_values<V: Into<ParamValue>>(self, param: ParamRef, values: impl IntoIterator<Item = V>) -> Self {
        let script = values.into_iter().map(|v| Ok(v.into())).collect();
        self.with_script(param, script)
    }

    pub fn with_error(self, param: ParamRef, error: ClientError) -> Self {
        self.with_script(param, vec![Err(error)])
    }

    pub fn with_dpd(self, results: DpdResults) -> Self {
        *locked(&self.dpd) = VecDeque::from([Ok(results)]);
        self
    }

    pub fn with_dpd_error(self, error: ClientError) -> Self {
        *locked(&self.dpd) = VecDeque::from([Err(error)]);
        self
    }

    pub fn with_rc_parameters(self, table: RcParameters) -> Self {
        *locked(&self.rc_parameters) = Some(Ok(table));
        self
    }

    pub fn with_write_error(self, error: ClientError) -> Self {
        *locked(&self.write_error) = Some(error);
        self
    }

    /// Every parameter read so far, in order.
    pub fn read_log(&self) -> Vec<ParamRef> {
        locked(&self.read_log).clone()
    }

    pub fn read_count(&self, param: &ParamRef) -> usize {
        locked(&self.read_log).iter().filter(|p| *p == param).count()
    }

    pub fn writes(&self) -> Vec<(ParamRef, ParamValue)> {
        locked(&self.writes).clone()
    }

    pub fn commands(&self) -> Vec<DpdCommand> {
        locked(&self.commands).clone()
    }
}

#[async_trait]
impl ParameterClient for FakeParameterClient {
    async fn read(&self, param: &ParamRef) -> Result<ParamValue, ClientError> {
        locked(&self.read_log).push(param.clone());
        let mut reads = locked(&self.reads);
        match reads.get_mut(param).and_then(next_scripted) {
            Some(result) => result,
            None => Err(ClientError::Device(format!(
                "Error getting param: {} not found",
                param
            ))),
        }
    }

    async fn write(&self, param: &ParamRef, value: &ParamValue) -> Result<(), ClientError> {
        if let Some(err) = locked(&self.write_error).clone() {
            return Err(err);
        }
        locked(&self.writes).push((param.clone(), value.clone()));
        // Subsequent reads see the written value.
        locked(&self.reads).insert(param.clone(), VecDeque::from([Ok(value.clone())]));
        Ok(())
    }

    async fn rc_parameters(&self) -> Result<RcParameters, ClientError> {
        locked(&self.rc_parameters)
            .clone()
            .unwrap_or_else(|| Ok(RcParameters::new()))
    }

    async fn dpd_results(&self) -> Result<DpdResults, ClientError> {
        next_scripted(&mut locked(&self.dpd))
            .unwrap_or_else(|| Err(ClientError::Device("DPD state unknown".into())))
    }

    async fn dpd_command(&self, command: &DpdCommand) -> Result<(), ClientError> {
        locked(&self.commands).push(command.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_script_repeats_last_response() {
        let frames = ParamRef::fixed("sdr", "frames");
        let fake = FakeParameterClient::new().with_values(frames.clone(), ["1", "2"]);

        assert_eq!(fake.read(&frames).await, Ok(ParamValue::from("1")));
        assert_eq!(fake.read(&frames).await, Ok(ParamValue::from("2")));
        assert_eq!(fake.read(&frames).await, Ok(ParamValue::from("2")));
        assert_eq!(fake.read_count(&frames), 3);
    }

    #[tokio::test]
    async fn test_fake_unknown_param_is_device_error() {
        let fake = FakeParameterClient::new();
        let err = fake.read(&ParamRef::fixed("tist", "offset")).await.unwrap_err();
        assert!(matches!(err, ClientError::Device(_)));
    }

    #[tokio::test]
    async fn test_fake_write_then_read() {
        let gain = ParamRef::fixed("gain", "digital");
        let fake = FakeParameterClient::new();
        fake.write(&gain, &ParamValue::from("0.8")).await.unwrap();

        assert_eq!(fake.read(&gain).await, Ok(ParamValue::from("0.8")));
        assert_eq!(fake.writes(), vec![(gain, ParamValue::from("0.8"))]);
    }

    #[tokio::test]
    async fn test_fake_unreachable_fails_everything() {
        let fake = FakeParameterClient::unreachable("connection refused");
        assert!(fake.read(&ParamRef::fixed("sdr", "freq")).await.unwrap_err().is_unreachable());
        assert!(fake.dpd_results().await.unwrap_err().is_unreachable());
        assert!(fake
            .write(&ParamRef::fixed("sdr", "txgain"), &ParamValue::from(40i64))
            .await
            .unwrap_err()
            .is_unreachable());
    }

    #[test]
    fn test_http_client_trims_base_url() {
        let client = HttpParameterClient::new(&DeviceConfig {
            base_url: "http://modulator.local:8099/".into(),
            request_timeout_secs: Some(3),
        })
        .unwrap();
        assert_eq!(client.url("/api/parameter"), "http://modulator.local:8099/api/parameter");
    }
}
