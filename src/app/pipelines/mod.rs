pub mod survey_pipeline;

pub use survey_pipeline::SurveyPipeline;
