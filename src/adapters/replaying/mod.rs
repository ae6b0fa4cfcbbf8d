//! Replaying adapters that serve recorded interactions from cassettes.

pub mod image_generator;

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cassette::replayer::CassetteReplayer;

/// Retrieve the recorded output for a call through `port::method` with `input`.
pub(crate) fn next_output<I: Serialize>(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
    input: &I,
) -> Result<serde_json::Value, String> {
    let input = serde_json::to_value(input).map_err(|e| format!("Unserializable input: {e}"))?;
    let mut guard = replayer.lock().map_err(|_| "Replayer lock poisoned".to_string())?;
    let output = guard.next_interaction(port, method, &input).map(|i| i.output.clone());
    output
}

/// Outcome of a replayed call.
#[derive(Debug)]
pub(crate) enum Replayed<T> {
    /// The recording held a successful value.
    Ok(T),
    /// The recording held an error, kept as its display text.
    Err(String),
}

/// Deserialize a recorded output following the `Ok`/`Err` convention.
pub(crate) fn replay_result<T: DeserializeOwned>(
    output: serde_json::Value,
) -> Result<Replayed<T>, serde_json::Error> {
    if let Some(err_val) = output.get("Err").or_else(|| output.get("err")) {
        let msg = err_val.as_str().unwrap_or("replayed error").to_string();
        return Ok(Replayed::Err(msg));
    }
    let value = match output.get("Ok").or_else(|| output.get("ok")) {
        Some(ok_val) => ok_val.clone(),
        None => output,
    };
    serde_json::from_value(value).map(Replayed::Ok)
}
