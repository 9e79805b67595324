use crate::core::{Pipeline, Report, SurveyFile};
use crate::utils::error::Result;

/// 一次完整執行的結果
#[derive(Debug, Clone)]
pub struct ReportRun {
    pub report: Report,
    pub written: Vec<String>,
}

pub struct ReportEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ReportEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<ReportRun> {
        tracing::info!("🚀 Starting survey report generation");

        // Extract
        tracing::info!("📥 Loading survey responses...");
        let survey = self.pipeline.extract().await?;
        tracing::info!(
            "Loaded {} respondents across {} questions",
            survey.respondent_count,
            survey.questions.len()
        );

        // Transform
        tracing::info!("🤖 Summarizing responses...");
        let report = self.pipeline.transform(survey).await?;
        let failed = report.failed_count();
        if failed > 0 {
            tracing::warn!(
                "⚠️ {} of {} questions could not be summarized",
                failed,
                report.questions.len()
            );
        } else {
            tracing::info!("Summarized {} questions", report.questions.len());
        }

        // Load
        tracing::info!("📄 Writing report...");
        let written = self.pipeline.load(&report).await?;
        for path in &written {
            tracing::info!("Output saved to: {}", path);
        }

        Ok(ReportRun { report, written })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{QuestionColumn, QuestionSummary, SummaryOutcome};
    use crate::utils::error::ReportError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubPipeline {
        steps: Mutex<Vec<&'static str>>,
        fail_extract: bool,
    }

    #[async_trait]
    impl Pipeline for StubPipeline {
        async fn extract(&self) -> Result<SurveyFile> {
            self.steps.lock().unwrap().push("extract");
            if self.fail_extract {
                return Err(ReportError::NoQuestionsError {
                    message: "found 3 columns".to_string(),
                });
            }
            Ok(SurveyFile {
                metadata_headers: vec!["a".into(), "b".into(), "c".into()],
                questions: vec![QuestionColumn {
                    question: "Q".to_string(),
                    responses: vec!["yes".to_string()],
                }],
                respondent_count: 1,
            })
        }

        async fn transform(&self, survey: SurveyFile) -> Result<Report> {
            self.steps.lock().unwrap().push("transform");
            let questions = survey
                .questions
                .iter()
                .enumerate()
                .map(|(i, q)| QuestionSummary {
                    index: i + 1,
                    question: q.question.clone(),
                    summary: "fine".to_string(),
                    response_count: q.responses.len(),
                    llm_calls: 1,
                    outcome: SummaryOutcome::Summarized,
                })
                .collect();
            Ok(Report::new("Stub", questions))
        }

        async fn load(&self, report: &Report) -> Result<Vec<String>> {
            self.steps.lock().unwrap().push("load");
            Ok(vec![format!("out/{}.docx", report.file_stem())])
        }
    }

    #[test]
    fn test_run_executes_phases_in_order() {
        let engine = ReportEngine::new(StubPipeline::default());

        let run = tokio_test::block_on(engine.run()).unwrap();

        assert_eq!(run.written, vec!["out/Stub Report.docx".to_string()]);
        assert_eq!(run.report.questions.len(), 1);
        assert_eq!(
            *engine.pipeline.steps.lock().unwrap(),
            vec!["extract", "transform", "load"]
        );
    }

    #[test]
    fn test_extract_failure_stops_the_run() {
        let engine = ReportEngine::new(StubPipeline {
            fail_extract: true,
            ..Default::default()
        });

        let err = tokio_test::block_on(engine.run()).unwrap_err();

        assert!(matches!(err, ReportError::NoQuestionsError { .. }));
        assert_eq!(*engine.pipeline.steps.lock().unwrap(), vec!["extract"]);
    }
}
