use crate::adapters::{csv_reader, docx};
use crate::core::summarizer::Summarizer;
use crate::core::{ConfigProvider, Pipeline, Report, Storage, SurveyFile};
use crate::domain::model::OutputFormat;
use crate::utils::error::Result;
use std::path::Path;

pub struct SurveyPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) summarizer: Summarizer,
}

impl<S: Storage, C: ConfigProvider> SurveyPipeline<S, C> {
    pub fn new(storage: S, config: C, summarizer: Summarizer) -> Self {
        Self {
            storage,
            config,
            summarizer,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SurveyPipeline<S, C> {
    async fn extract(&self) -> Result<SurveyFile> {
        let path = self.config.csv_path();
        tracing::debug!("Reading survey responses from {}", path.display());

        let data = tokio::fs::read(path).await?;
        csv_reader::parse_survey(data.as_slice())
    }

    async fn transform(&self, survey: SurveyFile) -> Result<Report> {
        let mut questions = Vec::with_capacity(survey.questions.len());

        // 依欄位順序逐題處理，一次只有一個 LLM 請求
        for (offset, column) in survey.questions.iter().enumerate() {
            tracing::info!(
                "Summarizing question {}/{}: {}",
                offset + 1,
                survey.questions.len(),
                column.question
            );
            questions.push(self.summarizer.summarize_column(offset + 1, column).await);
        }

        let mut report = Report::new(self.config.report_title(), questions);

        if self.config.overall_summary() {
            tracing::info!("Generating collective feedback summary");
            match self.summarizer.collective_feedback(&report.questions).await {
                Ok(overall) => report.overall_summary = overall,
                Err(e) => tracing::warn!("⚠️ Collective feedback skipped: {}", e),
            }
        }

        Ok(report)
    }

    async fn load(&self, report: &Report) -> Result<Vec<String>> {
        let stem = report.file_stem();
        let mut written = Vec::new();

        for format in self.config.output_formats() {
            let data = match format {
                OutputFormat::Docx => docx::render_docx(report)?,
                OutputFormat::Json => serde_json::to_vec_pretty(report)?,
            };
            let file_name = format!("{}.{}", stem, format.extension());

            tracing::debug!("Writing {} ({} bytes) to storage", file_name, data.len());
            self.storage.write_file(&file_name, &data).await?;

            written.push(
                Path::new(self.config.output_path())
                    .join(&file_name)
                    .to_string_lossy()
                    .into_owned(),
            );
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolvedConfig;
    use crate::core::summarizer::test_support::{terse_prompts, CharCounter, ScriptedModel};
    use crate::domain::model::SummaryOutcome;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn pipeline(
        model: Arc<ScriptedModel>,
        config: ResolvedConfig,
    ) -> SurveyPipeline<MockStorage, ResolvedConfig> {
        let summarizer = Summarizer::new(model, Arc::new(CharCounter), terse_prompts(), 1000);
        SurveyPipeline::new(MockStorage::default(), config, summarizer)
    }

    fn survey(csv: &str) -> SurveyFile {
        csv_reader::parse_survey(csv.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_single_question_two_rows_gives_one_summary() {
        let model = Arc::new(ScriptedModel::default());
        let p = pipeline(model.clone(), ResolvedConfig::new("Pulse", "unused.csv", "sk"));

        let report = p
            .transform(survey("id,who,when,How are you?\n1,a,t,Good\n2,b,t,Tired\n"))
            .await
            .unwrap();

        assert_eq!(report.questions.len(), 1);
        assert_eq!(report.questions[0].question, "How are you?");
        assert_eq!(report.questions[0].llm_calls, 1);
        assert_eq!(model.summarize_calls(), 1);
        assert!(report.overall_summary.is_none());
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_one_question() {
        let model = Arc::new(ScriptedModel {
            fail_when_contains: Some("SUM Second".to_string()),
            ..Default::default()
        });
        let mut config = ResolvedConfig::new("Pulse", "unused.csv", "sk");
        config.overall_summary = true;
        let p = pipeline(model.clone(), config);

        let report = p
            .transform(survey("id,who,when,First,Second,Third\n1,a,t,x,y,z\n"))
            .await
            .unwrap();

        let order: Vec<&str> = report.questions.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(order, vec!["First", "Second", "Third"]);
        assert_eq!(report.questions[0].outcome, SummaryOutcome::Summarized);
        assert!(matches!(
            report.questions[1].outcome,
            SummaryOutcome::Failed { .. }
        ));
        assert_eq!(report.questions[2].outcome, SummaryOutcome::Summarized);
        assert_eq!(report.failed_count(), 1);

        let overall_prompt = model.calls().last().cloned().unwrap();
        assert!(overall_prompt.starts_with("OVERALL Question 1: First"));
        assert!(overall_prompt.contains("Question 3: Third"));
        assert!(!overall_prompt.contains("Question 2: Second"));
        assert!(report.overall_summary.is_some());
    }

    #[tokio::test]
    async fn test_load_writes_each_format() {
        let model = Arc::new(ScriptedModel::default());
        let mut config = ResolvedConfig::new("Team / Q3", "unused.csv", "sk");
        config.output_path = "reports".to_string();
        config.output_formats = vec![OutputFormat::Docx, OutputFormat::Json];
        let p = pipeline(model, config);

        let report = p
            .transform(survey("id,who,when,Q\n1,a,t,ok\n"))
            .await
            .unwrap();
        let written = p.load(&report).await.unwrap();

        assert_eq!(
            written,
            vec![
                Path::new("reports").join("Team _ Q3 Report.docx").to_string_lossy().into_owned(),
                Path::new("reports").join("Team _ Q3 Report.json").to_string_lossy().into_owned(),
            ]
        );

        let files = p.storage.files.lock().unwrap();
        assert!(files["Team _ Q3 Report.docx"].starts_with(b"PK"));
        let json: serde_json::Value =
            serde_json::from_slice(&files["Team _ Q3 Report.json"]).unwrap();
        assert_eq!(json["title"], "Team / Q3");
        assert_eq!(json["questions"][0]["outcome"]["status"], "summarized");
    }
}
