use crate::domain::model::{OutputFormat, Report, SurveyFile};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn report_title(&self) -> &str;
    fn csv_path(&self) -> &Path;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[OutputFormat];
    fn overall_summary(&self) -> bool;
}

/// 單輪 prompt 進、文字出的語言模型
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<SurveyFile>;
    async fn transform(&self, survey: SurveyFile) -> Result<Report>;
    /// 回傳實際寫出的檔案路徑
    async fn load(&self, report: &Report) -> Result<Vec<String>>;
}
