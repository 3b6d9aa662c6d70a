//! Shared domain types and configuration for the AI visibility tracker.

pub mod app_config;
pub mod backends;
pub mod config;
pub mod project;
pub mod project_file;
pub mod report;
pub mod sentiment;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use backends::Backend;
pub use config::{load_app_config, load_app_config_from_env};
pub use project::{LogLevel, ProjectStatus, ResponseStatus};
pub use project_file::{
    load_project_file, parse_project_file, CompetitorSpec, ProjectFile, PromptSpec,
};
pub use report::{
    ActionPlan, AnalysisReport, BackendFavorite, BrandScore, CompetitorComparison, GapAnalysis,
    Insights, LeaderboardEntry, NegativeInstance, NegativeSentimentDigest, PromptWinner,
    INSIGHT_PLACEHOLDER,
};
pub use sentiment::{SentimentLabel, UNCLASSIFIED_SENTIMENT_WEIGHT};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    #[error("invalid project status: {0}")]
    InvalidProjectStatus(String),

    #[error("invalid response status: {0}")]
    InvalidResponseStatus(String),

    #[error("invalid sentiment label: {0}")]
    InvalidSentiment(String),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read project file {path}: {source}")]
    ProjectFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse project file: {0}")]
    ProjectFileParse(#[from] serde_yaml::Error),

    #[error("project file validation failed: {0}")]
    Validation(String),
}
