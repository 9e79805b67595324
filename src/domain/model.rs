use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 前三欄為受訪者的中繼資料（時間戳記、ID 等），不屬於題目
pub const METADATA_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Docx,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionColumn {
    pub question: String,
    pub responses: Vec<String>,
}

impl QuestionColumn {
    /// 去除空白回覆後的答案
    pub fn non_empty_responses(&self) -> Vec<&str> {
        self.responses
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyFile {
    pub metadata_headers: Vec<String>,
    pub questions: Vec<QuestionColumn>,
    pub respondent_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummaryOutcome {
    Summarized,
    NoResponses,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSummary {
    /// 從 1 開始
    pub index: usize,
    pub question: String,
    pub summary: String,
    pub response_count: usize,
    pub llm_calls: usize,
    pub outcome: SummaryOutcome,
}

impl QuestionSummary {
    pub fn heading(&self) -> String {
        format!("Question {}: {}", self.index, self.question)
    }

    pub fn is_summarized(&self) -> bool {
        matches!(self.outcome, SummaryOutcome::Summarized)
    }

    /// 實際寫進報告段落的文字
    pub fn display_text(&self) -> String {
        match &self.outcome {
            SummaryOutcome::Failed { error } => format!("Summary unavailable: {}", error),
            _ => self.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub questions: Vec<QuestionSummary>,
    pub overall_summary: Option<String>,
}

impl Report {
    pub fn new(title: impl Into<String>, questions: Vec<QuestionSummary>) -> Self {
        Self {
            title: title.into(),
            generated_at: Utc::now(),
            questions,
            overall_summary: None,
        }
    }

    pub fn heading(&self) -> String {
        format!("Survey Diagnostic Report: {}", self.title)
    }

    pub fn failed_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| matches!(q.outcome, SummaryOutcome::Failed { .. }))
            .count()
    }

    /// 輸出檔名，路徑分隔字元會被替換掉
    pub fn file_stem(&self) -> String {
        let safe: String = self
            .title
            .trim()
            .chars()
            .map(|c| match c {
                '/' | '\\' | '\0' => '_',
                c => c,
            })
            .collect();
        format!("{} Report", safe)
    }
}
