//! Service configuration.
//!
//! Loaded from an optional JSON file named by `BAZI_CONFIG`, then overridden
//! field by field from `BAZI_*` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

pub const CONFIG_FILE_VAR: &str = "BAZI_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_addr: String,
    /// Interpreter used to run the engine script.
    pub engine_program: String,
    pub engine_script: String,
    pub engine_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5001".to_string(),
            engine_program: "python3".to_string(),
            engine_script: "./bazi.py".to_string(),
            engine_timeout_secs: 30,
            body_limit_bytes: 64 * 1024,
        }
    }
}

impl ServiceConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load from an explicit variable map (file first, then overrides).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let mut config = match vars.get(CONFIG_FILE_VAR) {
            Some(path) => Self::load_from_file(Path::new(path))?,
            None => Self::default(),
        };

        if let Some(v) = vars.get("BAZI_BIND_ADDR") {
            config.bind_addr = v.clone();
        }
        if let Some(v) = vars.get("BAZI_ENGINE_PROGRAM") {
            config.engine_program = v.clone();
        }
        if let Some(v) = vars.get("BAZI_ENGINE_SCRIPT") {
            config.engine_script = v.clone();
        }
        if let Some(v) = vars.get("BAZI_ENGINE_TIMEOUT_SECS") {
            config.engine_timeout_secs = v
                .parse()
                .with_context(|| format!("Invalid BAZI_ENGINE_TIMEOUT_SECS: {:?}", v))?;
        }
        if let Some(v) = vars.get("BAZI_BODY_LIMIT_BYTES") {
            config.body_limit_bytes = v
                .parse()
                .with_context(|| format!("Invalid BAZI_BODY_LIMIT_BYTES: {:?}", v))?;
        }

        Ok(config)
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: ServiceConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}
