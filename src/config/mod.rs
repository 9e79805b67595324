pub mod cli;
pub mod toml_config;

use crate::adapters::openai::LlmSettings;
use crate::adapters::tokenizer::TokenizerKind;
use crate::core::prompts::PromptTemplates;
use crate::core::summarizer::DEFAULT_TOKEN_THRESHOLD;
use crate::core::ConfigProvider;
use crate::domain::model::OutputFormat;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use toml_config::ReportConfig;

pub const DEFAULT_OUTPUT_PATH: &str = "./output";

/// 日誌裡不印出金鑰內容
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// CLI 與 TOML 合併後的最終設定
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub title: String,
    pub csv_path: PathBuf,
    pub api_key: ApiKey,
    pub output_path: String,
    pub output_formats: Vec<OutputFormat>,
    pub llm: LlmSettings,
    pub token_threshold: usize,
    pub tokenizer: TokenizerKind,
    pub prompts: PromptTemplates,
    pub overall_summary: bool,
}

impl ResolvedConfig {
    pub fn new(title: impl Into<String>, csv_path: impl Into<PathBuf>, api_key: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            csv_path: csv_path.into(),
            api_key: ApiKey::new(api_key),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            output_formats: vec![OutputFormat::Docx],
            llm: LlmSettings::default(),
            token_threshold: DEFAULT_TOKEN_THRESHOLD,
            tokenizer: TokenizerKind::default(),
            prompts: PromptTemplates::default(),
            overall_summary: false,
        }
    }
}

impl Validate for ResolvedConfig {
    fn validate(&self) -> Result<()> {
        // 與輸入表單相同的順序：標題、檔案、金鑰
        validation::require_input("title", Some(self.title.as_str()))?;
        validation::validate_input_file("csv", &self.csv_path, &["csv"])?;
        validation::require_input("api_key", Some(self.api_key.expose()))?;

        validation::validate_path("output.output_path", &self.output_path)?;
        if self.output_formats.is_empty() {
            return Err(crate::utils::error::ReportError::InvalidConfigValueError {
                field: "output.output_formats".to_string(),
                value: "[]".to_string(),
                reason: "At least one output format is required".to_string(),
            });
        }

        validation::validate_http_url("llm.base_url", &self.llm.base_url)?;
        validation::validate_range("llm.temperature", self.llm.temperature, 0.0, 2.0)?;
        validation::validate_positive_number("llm.timeout_seconds", self.llm.timeout_seconds as usize, 1)?;
        validation::validate_positive_number("summarizer.token_threshold", self.token_threshold, 1)?;

        self.prompts.validate()
    }
}

impl ConfigProvider for ResolvedConfig {
    fn report_title(&self) -> &str {
        self.title.trim()
    }

    fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.output_formats
    }

    fn overall_summary(&self) -> bool {
        self.overall_summary
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "survey-report")]
#[command(about = "Turn survey responses into an AI-written Word report")]
pub struct CliConfig {
    #[arg(long, help = "Title of the survey response report")]
    pub title: Option<String>,

    #[arg(long, help = "CSV export of the survey responses")]
    pub csv: Option<PathBuf>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, help = "Directory the report is written to [default: ./output]")]
    pub output_path: Option<String>,

    #[arg(long, help = "Optional TOML file with llm/summarizer/prompts/output settings")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long, help = "Base URL of an OpenAI-compatible API")]
    pub base_url: Option<String>,

    #[arg(long, help = "Max tokens per summarization batch [default: 3000]")]
    pub token_threshold: Option<usize>,

    #[arg(long, value_enum)]
    pub tokenizer: Option<TokenizerKind>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long = "format", value_enum, value_delimiter = ',')]
    pub formats: Vec<OutputFormat>,

    #[arg(long, help = "Also write an overall collective-feedback summary")]
    pub overall_summary: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 合併順序：CLI 參數 > TOML 檔 > 預設值
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        // 標題與檔案先於設定檔檢查；API key 可能來自設定檔，所以排在後面
        let title = validation::require_input("title", self.title.as_deref())?;
        let csv_path = self
            .csv
            .clone()
            .ok_or_else(|| crate::utils::error::ReportError::MissingInputError {
                field: "csv".to_string(),
            })?;

        let file = match &self.config {
            Some(path) => ReportConfig::from_file(path)?,
            None => ReportConfig::default(),
        };
        let api_key = validation::require_input(
            "api_key",
            self.api_key.as_deref().or_else(|| file.api_key()),
        )?;

        let mut resolved = ResolvedConfig::new(title, csv_path, api_key);

        let llm = file.llm.unwrap_or_default();
        let summarizer = file.summarizer.unwrap_or_default();
        let output = file.output.unwrap_or_default();

        if let Some(base_url) = self.base_url.clone().or(llm.base_url) {
            resolved.llm.base_url = base_url;
        }
        if let Some(model) = self.model.clone().or(llm.model) {
            resolved.llm.model = model;
        }
        if let Some(temperature) = self.temperature.or(llm.temperature) {
            resolved.llm.temperature = temperature;
        }
        if let Some(timeout) = self.timeout_seconds.or(llm.timeout_seconds) {
            resolved.llm.timeout_seconds = timeout;
        }
        if let Some(threshold) = self.token_threshold.or(summarizer.token_threshold) {
            resolved.token_threshold = threshold;
        }
        if let Some(tokenizer) = self.tokenizer.or(summarizer.tokenizer) {
            resolved.tokenizer = tokenizer;
        }
        if let Some(output_path) = self.output_path.clone().or(output.output_path) {
            resolved.output_path = output_path;
        }
        if !self.formats.is_empty() {
            resolved.output_formats = self.formats.clone();
        } else if let Some(formats) = output.output_formats {
            resolved.output_formats = formats;
        }
        resolved.overall_summary = self.overall_summary || summarizer.overall_summary.unwrap_or(false);
        if let Some(prompts) = file.prompts {
            resolved.prompts = prompts.apply(resolved.prompts);
        }

        resolved.validate()?;
        Ok(resolved)
    }
}
