pub mod analysis;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod i18n;
pub mod knowledge;
pub mod llm;
pub mod logging;
pub mod outlet;
pub mod session;
pub mod team;
pub mod workflow;

// Re-export commonly used types
pub use analysis::{AnalysisCategory, AnalysisRequest, Pipeline, PipelineOutcome, Stage};
pub use config::Config;
pub use error::{AnalysisError, GenerationError, IngestionError, ValidationError};
pub use session::AnalysisSession;
pub use team::{Agent, Responder, Response, Team, extract_text};
pub use workflow::launch;
