use crate::core::prompts::PromptTemplates;
use crate::domain::model::{QuestionColumn, QuestionSummary, SummaryOutcome};
use crate::domain::ports::{LanguageModel, TokenCounter};
use crate::utils::error::{ReportError, Result};
use std::sync::Arc;

pub const DEFAULT_TOKEN_THRESHOLD: usize = 3000;

pub const NO_RESPONSES_TEXT: &str = "No responses were given to this question.";

/// 單題摘要的結果與統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryRun {
    pub summary: String,
    pub batches: usize,
    pub llm_calls: usize,
}

pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
    counter: Arc<dyn TokenCounter>,
    prompts: PromptTemplates,
    token_threshold: usize,
}

/// 把 client 的錯誤改標成發生錯誤的階段與批次
fn at_stage(stage: &str, batch: usize, err: ReportError) -> ReportError {
    let message = match err {
        ReportError::LlmError { message, .. } => message,
        other => other.to_string(),
    };
    ReportError::llm(stage, format!("batch {}: {}", batch, message))
}

impl Summarizer {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        counter: Arc<dyn TokenCounter>,
        prompts: PromptTemplates,
        token_threshold: usize,
    ) -> Self {
        Self {
            model,
            counter,
            prompts,
            token_threshold,
        }
    }

    pub fn token_threshold(&self) -> usize {
        self.token_threshold
    }

    /// 依 token 上限分批摘要，再把每批的摘要逐一合併成一份。
    ///
    /// 緩衝區的 token 數超過上限且後面還有回覆時就送出一批；
    /// 最後一則回覆加入後一定再送出一次。總量沒超過上限時只會呼叫一次 LLM。
    pub async fn summarize_responses(&self, question: &str, responses: &[&str]) -> Result<SummaryRun> {
        let mut run = SummaryRun::default();
        self.fold_batches(question, responses, &mut run).await?;
        Ok(run)
    }

    /// 統計寫在 `run` 裡，失敗時呼叫端仍可讀到已發出的次數
    async fn fold_batches(&self, question: &str, responses: &[&str], run: &mut SummaryRun) -> Result<()> {
        let total = responses.len();
        let mut buffer: Vec<&str> = Vec::new();
        let mut buffer_tokens = 0usize;
        let mut current: Option<String> = None;

        for (position, &response) in responses.iter().enumerate() {
            buffer_tokens += self.counter.count(response);
            buffer.push(response);

            let is_last = position + 1 == total;
            if !is_last && buffer_tokens <= self.token_threshold {
                continue;
            }

            run.batches += 1;
            let batch = run.batches;
            tracing::debug!(
                "Flushing batch {} for '{}': {} responses, {} tokens",
                batch,
                question,
                buffer.len(),
                buffer_tokens
            );

            let prompt = self.prompts.summary_prompt(question, &buffer);
            run.llm_calls += 1;
            let new_summary = self
                .model
                .complete(&prompt)
                .await
                .map_err(|e| at_stage("summarize", batch, e))?;
            buffer.clear();
            buffer_tokens = 0;

            current = Some(match current.take() {
                None => new_summary,
                Some(previous) => {
                    tracing::debug!("Combining batch {} into running summary", batch);
                    let prompt = self.prompts.combine_prompt(&previous, &new_summary);
                    run.llm_calls += 1;
                    self.model
                        .complete(&prompt)
                        .await
                        .map_err(|e| at_stage("combine", batch, e))?
                }
            });
        }

        run.summary = current.unwrap_or_default();
        Ok(())
    }

    /// 摘要單一題目；LLM 失敗只記在這一題，不中斷整份報告
    pub async fn summarize_column(&self, index: usize, column: &QuestionColumn) -> QuestionSummary {
        let responses = column.non_empty_responses();
        let mut summary = QuestionSummary {
            index,
            question: column.question.clone(),
            summary: String::new(),
            response_count: responses.len(),
            llm_calls: 0,
            outcome: SummaryOutcome::Summarized,
        };

        if responses.is_empty() {
            tracing::warn!("⚠️ Question {} has no responses, skipping LLM", index);
            summary.summary = NO_RESPONSES_TEXT.to_string();
            summary.outcome = SummaryOutcome::NoResponses;
            return summary;
        }

        let mut run = SummaryRun::default();
        let result = self.fold_batches(&column.question, &responses, &mut run).await;
        summary.llm_calls = run.llm_calls;

        match result {
            Ok(()) => {
                tracing::info!(
                    "📝 Question {} summarized ({} responses, {} batches, {} LLM calls)",
                    index,
                    summary.response_count,
                    run.batches,
                    run.llm_calls
                );
                summary.summary = run.summary;
            }
            Err(e) => {
                tracing::error!(
                    "❌ Question {} failed after {} LLM calls: {}",
                    index,
                    run.llm_calls,
                    e
                );
                summary.outcome = SummaryOutcome::Failed {
                    error: e.to_string(),
                };
            }
        }

        summary
    }

    /// 用所有成功的題目摘要產生整體回饋；沒有可用摘要時回傳 None
    pub async fn collective_feedback(&self, questions: &[QuestionSummary]) -> Result<Option<String>> {
        let blocks: Vec<String> = questions
            .iter()
            .filter(|q| q.is_summarized())
            .map(|q| format!("{}\n{}", q.heading(), q.summary))
            .collect();

        if blocks.is_empty() {
            return Ok(None);
        }

        let prompt = self.prompts.collective_feedback_prompt(&blocks.join("\n\n"));
        let overall = self
            .model
            .complete(&prompt)
            .await
            .map_err(|e| at_stage("collective feedback", 1, e))?;
        Ok(Some(overall))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 每個字元算一個 token，方便精準控制批次邊界
    pub struct CharCounter;

    impl TokenCounter for CharCounter {
        fn count(&self, text: &str) -> usize {
            text.chars().count()
        }
    }

    /// 記錄所有 prompt，依類型回覆固定格式的文字
    #[derive(Default)]
    pub struct ScriptedModel {
        pub prompts: Mutex<Vec<String>>,
        pub fail_on_call: Option<usize>,
        pub fail_when_contains: Option<String>,
    }

    impl ScriptedModel {
        pub fn calls(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        pub fn summarize_calls(&self) -> usize {
            self.calls().iter().filter(|p| p.starts_with("SUM")).count()
        }

        pub fn combine_calls(&self) -> usize {
            self.calls().iter().filter(|p| p.starts_with("COMBINE")).count()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            let call = {
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(prompt.to_string());
                prompts.len()
            };
            if self.fail_on_call == Some(call) {
                return Err(ReportError::llm("chat completion", "HTTP 500"));
            }
            if let Some(needle) = &self.fail_when_contains {
                if prompt.contains(needle.as_str()) {
                    return Err(ReportError::llm("chat completion", "HTTP 429"));
                }
            }
            if let Some(rest) = prompt.strip_prefix("COMBINE ") {
                return Ok(format!("({})", rest));
            }
            Ok(format!("s{}", call))
        }
    }

    pub fn terse_prompts() -> PromptTemplates {
        PromptTemplates {
            summary: "SUM {survey_question}:{responses}".to_string(),
            combine: "COMBINE {current_summary}+{new_summary}".to_string(),
            collective_feedback: "OVERALL {collective_feedback}".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    fn summarizer(model: Arc<ScriptedModel>, threshold: usize) -> Summarizer {
        Summarizer::new(model, Arc::new(CharCounter), terse_prompts(), threshold)
    }

    #[tokio::test]
    async fn test_under_threshold_makes_single_call() {
        let model = Arc::new(ScriptedModel::default());
        let s = summarizer(model.clone(), 20);

        let run = s.summarize_responses("Q", &["aaaa", "bbbb", "cccc"]).await.unwrap();

        assert_eq!(run.llm_calls, 1);
        assert_eq!(run.batches, 1);
        assert_eq!(run.summary, "s1");
        assert_eq!(model.combine_calls(), 0);
        assert!(model.calls()[0].contains("- aaaa\n- bbbb\n- cccc"));
    }

    #[tokio::test]
    async fn test_exactly_threshold_does_not_flush_early() {
        let model = Arc::new(ScriptedModel::default());
        let s = summarizer(model.clone(), 8);

        let run = s.summarize_responses("Q", &["aaaa", "bbbb", "c"]).await.unwrap();

        assert_eq!(run.llm_calls, 1);
    }

    #[tokio::test]
    async fn test_over_threshold_batches_and_combines() {
        let model = Arc::new(ScriptedModel::default());
        let s = summarizer(model.clone(), 5);

        // 6 > 5 → flush；4+4 > 5 → flush；最後一則 → flush
        let run = s
            .summarize_responses("Q", &["aaaaaa", "bbbb", "cccc", "dd"])
            .await
            .unwrap();

        assert_eq!(run.batches, 3);
        assert_eq!(model.summarize_calls(), 3);
        assert_eq!(model.combine_calls(), 2);
        assert_eq!(run.llm_calls, 5);

        let calls = model.calls();
        assert!(calls[0].ends_with("- aaaaaa"));
        assert!(calls[1].ends_with("- bbbb\n- cccc"));
        assert_eq!(calls[2], "COMBINE s1+s2");
        assert!(calls[3].ends_with("- dd"));
        assert_eq!(calls[4], "COMBINE (s1+s2)+s4");
        assert_eq!(run.summary, "((s1+s2)+s4)");
    }

    #[tokio::test]
    async fn test_last_response_over_threshold_is_still_summarized() {
        let model = Arc::new(ScriptedModel::default());
        let s = summarizer(model.clone(), 3);

        let run = s.summarize_responses("Q", &["ab", "cdef"]).await.unwrap();

        assert_eq!(run.batches, 1);
        assert!(model.calls()[0].ends_with("- ab\n- cdef"));
    }

    #[tokio::test]
    async fn test_empty_responses_make_no_calls() {
        let model = Arc::new(ScriptedModel::default());
        let s = summarizer(model.clone(), 10);

        let run = s.summarize_responses("Q", &[]).await.unwrap();
        assert_eq!(run.llm_calls, 0);
        assert!(model.calls().is_empty());

        let column = QuestionColumn {
            question: "Anything else?".to_string(),
            responses: vec!["".to_string(), "  ".to_string()],
        };
        let summary = s.summarize_column(4, &column).await;
        assert_eq!(summary.outcome, SummaryOutcome::NoResponses);
        assert_eq!(summary.summary, NO_RESPONSES_TEXT);
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_combine_failure_fails_question_with_stage() {
        let model = Arc::new(ScriptedModel {
            fail_on_call: Some(3),
            ..Default::default()
        });
        let s = summarizer(model.clone(), 1);
        let column = QuestionColumn {
            question: "Q".to_string(),
            responses: vec!["aa".to_string(), "bb".to_string()],
        };

        let summary = s.summarize_column(1, &column).await;

        match summary.outcome {
            SummaryOutcome::Failed { error } => {
                assert_eq!(error, "LLM combine call failed: batch 2: HTTP 500");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(summary.response_count, 2);
        // 兩次 summarize 加上失敗的 combine
        assert_eq!(model.calls().len(), 3);
        assert_eq!(summary.llm_calls, 3);
        assert!(summary.summary.is_empty());
    }

    #[tokio::test]
    async fn test_first_summarize_failure_counts_the_attempt() {
        let model = Arc::new(ScriptedModel {
            fail_on_call: Some(1),
            ..Default::default()
        });
        let s = summarizer(model.clone(), 100);
        let column = QuestionColumn {
            question: "Q".to_string(),
            responses: vec!["only".to_string()],
        };

        let summary = s.summarize_column(1, &column).await;

        assert!(matches!(summary.outcome, SummaryOutcome::Failed { .. }));
        assert_eq!(summary.llm_calls, 1);
    }

    #[tokio::test]
    async fn test_collective_feedback_uses_only_summarized_questions() {
        let model = Arc::new(ScriptedModel::default());
        let s = summarizer(model.clone(), 100);
        let questions = vec![
            QuestionSummary {
                index: 1,
                question: "Q1".to_string(),
                summary: "liked it".to_string(),
                response_count: 3,
                llm_calls: 1,
                outcome: SummaryOutcome::Summarized,
            },
            QuestionSummary {
                index: 2,
                question: "Q2".to_string(),
                summary: String::new(),
                response_count: 3,
                llm_calls: 0,
                outcome: SummaryOutcome::Failed {
                    error: "boom".to_string(),
                },
            },
        ];

        let overall = s.collective_feedback(&questions).await.unwrap();

        assert_eq!(overall.as_deref(), Some("s1"));
        assert_eq!(model.calls(), vec!["OVERALL Question 1: Q1\nliked it".to_string()]);

        assert_eq!(s.collective_feedback(&questions[1..]).await.unwrap(), None);
    }
}
