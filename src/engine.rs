//! External calculation engine.
//!
//! Defines the [`ReportEngine`] trait so the HTTP layer can run against the
//! real subprocess ([`ScriptEngine`]) or a canned engine in tests. A non-zero
//! exit never reaches the report parser.

use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ServiceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarType {
    #[default]
    Gregorian,
    Lunar,
}

/// Birth date and time handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BirthInput {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub gender: Gender,
    pub calendar: CalendarType,
}

impl BirthInput {
    /// Positional date/time arguments followed by the `-g` / `-n` flags.
    pub fn engine_args(&self) -> Vec<String> {
        let mut args = vec![
            self.year.to_string(),
            self.month.to_string(),
            self.day.to_string(),
            self.hour.to_string(),
        ];
        if self.calendar == CalendarType::Gregorian {
            args.push("-g".to_string());
        }
        if self.gender == Gender::Female {
            args.push("-n".to_string());
        }
        args
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("无法启动计算程序: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("计算超时 ({0}s)")]
    Timeout(u64),

    #[error("计算失败: {stderr}")]
    Failed {
        status: Option<i32>,
        stderr: String,
        stdout: String,
    },

    #[error("计算程序输出不是有效的 UTF-8")]
    InvalidOutput,
}

impl EngineError {
    /// Whatever the engine printed to stdout before failing, if anything.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            EngineError::Failed { stdout, .. } if !stdout.is_empty() => Some(stdout.as_str()),
            _ => None,
        }
    }
}

/// Async trait implemented by each engine backend.
#[async_trait::async_trait]
pub trait ReportEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Run the engine; `Ok` only when it exited successfully.
    async fn run(&self, input: &BirthInput) -> Result<String, EngineError>;
}

/// Runs the engine script as a subprocess.
pub struct ScriptEngine {
    program: String,
    script: String,
    timeout: Duration,
}

impl ScriptEngine {
    pub fn new(program: impl Into<String>, script: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            config.engine_program.clone(),
            config.engine_script.clone(),
            Duration::from_secs(config.engine_timeout_secs),
        )
    }

    fn command(&self, input: &BirthInput) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.script)
            .args(input.engine_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait::async_trait]
impl ReportEngine for ScriptEngine {
    fn name(&self) -> &str {
        "script"
    }

    async fn run(&self, input: &BirthInput) -> Result<String, EngineError> {
        let args = input.engine_args();
        debug!("Running engine: {} {} {:?}", self.program, self.script, args);

        let output = tokio::time::timeout(self.timeout, self.command(input).output())
            .await
            .map_err(|_| EngineError::Timeout(self.timeout.as_secs()))??;

        if !output.status.success() {
            return Err(EngineError::Failed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            });
        }

        let stdout = String::from_utf8(output.stdout).map_err(|_| EngineError::InvalidOutput)?;
        info!("Engine finished: {} bytes of output", stdout.len());
        Ok(stdout)
    }
}
