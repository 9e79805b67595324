pub mod engine;
pub mod prompts;
pub mod summarizer;

pub use crate::domain::model::{QuestionSummary, Report, SurveyFile};
pub use crate::domain::ports::{ConfigProvider, LanguageModel, Pipeline, Storage, TokenCounter};
pub use crate::utils::error::Result;
