pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{LlmSettings, OpenAiClient, TokenizerKind};
pub use app::pipelines::SurveyPipeline;
pub use config::{cli::LocalStorage, ResolvedConfig};
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use core::{engine::ReportEngine, summarizer::Summarizer};
pub use domain::model::{OutputFormat, QuestionSummary, Report, SummaryOutcome, SurveyFile};
pub use utils::error::{ReportError, Result};
