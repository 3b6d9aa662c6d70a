//! The visibility pipeline: query backends, extract brand mentions,
//! classify their sentiment, score every brand, and build the analysis
//! report with insights and an action plan.
//!
//! Every stage reads and writes through an injected
//! [`aivis_db::VisibilityStore`] and calls backends through an injected
//! [`aivis_llm::TextGenerator`].

pub mod analysis;
pub mod audit;
pub mod error;
pub mod extract;
pub mod impersonate;
pub mod insights;
pub mod pipeline;
pub mod query;
pub mod runner;
pub mod scorer;
pub mod sentiment;
pub mod types;

mod reply;

pub use analysis::{analyze, AnalysisSnapshot};
pub use error::EngineError;
pub use extract::{extract_mentions, ExtractedMention};
pub use impersonate::impersonate_competitor;
pub use pipeline::{run_analysis, run_pipeline, run_visibility_check};
pub use runner::PipelineRunner;
pub use scorer::ScoringContext;
pub use types::{project_brands, Brand, EngineConfig};
