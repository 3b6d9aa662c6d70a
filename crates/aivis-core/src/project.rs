//! Lifecycle enums shared by the store, the pipeline and the HTTP surface.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Where a project is in its setup → check → analysis lifecycle.
///
/// Callers observe pipeline progress only through this field and the
/// execution log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Setup,
    Validating,
    Checking,
    Analyzing,
    Completed,
    Failed,
}

impl ProjectStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Setup => "setup",
            ProjectStatus::Validating => "validating",
            ProjectStatus::Checking => "checking",
            ProjectStatus::Analyzing => "analyzing",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        }
    }

    /// `true` while a pipeline run owns the project.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, ProjectStatus::Checking | ProjectStatus::Analyzing)
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(ProjectStatus::Setup),
            "validating" => Ok(ProjectStatus::Validating),
            "checking" => Ok(ProjectStatus::Checking),
            "analyzing" => Ok(ProjectStatus::Analyzing),
            "completed" => Ok(ProjectStatus::Completed),
            "failed" => Ok(ProjectStatus::Failed),
            _ => Err(CoreError::InvalidProjectStatus(s.to_string())),
        }
    }
}

/// Status of one generated answer for a (prompt, backend) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Pending,
    Success,
    Failed,
}

impl ResponseStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseStatus::Pending => "pending",
            ResponseStatus::Success => "success",
            ResponseStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ResponseStatus::Pending),
            "success" => Ok(ResponseStatus::Success),
            "failed" => Ok(ResponseStatus::Failed),
            _ => Err(CoreError::InvalidResponseStatus(s.to_string())),
        }
    }
}

/// Severity of an execution-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(LogLevel::Info),
            "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            _ => Err(CoreError::InvalidLogLevel(s.to_string())),
        }
    }
}
