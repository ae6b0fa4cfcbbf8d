//! Records interactions into a cassette file.

use std::fmt::Display;
use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;

use super::format::{Cassette, Interaction};

/// Collects interactions and writes them as a YAML cassette file.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    commit: String,
    interactions: Vec<Interaction>,
}

impl CassetteRecorder {
    /// Create a new recorder that will write to the given path.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        commit: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            commit: commit.into(),
            interactions: Vec::new(),
        }
    }

    /// Record one call and its result using the `Ok`/`Err` JSON convention.
    /// The `seq` field is assigned in completion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the input or the `Ok` value cannot be serialized.
    pub fn record<I, T, E>(
        &mut self,
        port: &str,
        method: &str,
        input: &I,
        result: &Result<T, E>,
    ) -> Result<(), serde_json::Error>
    where
        I: Serialize,
        T: Serialize,
        E: Display,
    {
        let input = serde_json::to_value(input)?;
        let output = match result {
            Ok(v) => serde_json::json!({ "Ok": serde_json::to_value(v)? }),
            Err(e) => serde_json::json!({ "Err": e.to_string() }),
        };
        self.interactions.push(Interaction {
            seq: self.interactions.len() as u64,
            port: port.to_string(),
            method: method.to_string(),
            input,
            output,
        });
        Ok(())
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }

    /// Finish recording and write the cassette YAML file to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn finish(self) -> Result<PathBuf, std::io::Error> {
        let cassette = Cassette {
            name: self.name,
            recorded_at: Utc::now(),
            commit: self.commit,
            interactions: self.interactions,
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path)
    }
}
