use crate::adapters::tokenizer::TokenizerKind;
use crate::core::prompts::PromptTemplates;
use crate::domain::model::OutputFormat;
use crate::utils::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    pub llm: Option<LlmConfig>,
    pub summarizer: Option<SummarizerConfig>,
    pub prompts: Option<PromptsConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummarizerConfig {
    pub token_threshold: Option<usize>,
    pub tokenizer: Option<TokenizerKind>,
    pub overall_summary: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    pub summary: Option<String>,
    pub combine: Option<String>,
    pub collective_feedback: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub output_path: Option<String>,
    pub output_formats: Option<Vec<OutputFormat>>,
}

impl PromptsConfig {
    /// 只覆蓋有設定的模板
    pub fn apply(&self, base: PromptTemplates) -> PromptTemplates {
        PromptTemplates {
            summary: self.summary.clone().unwrap_or(base.summary),
            combine: self.combine.clone().unwrap_or(base.combine),
            collective_feedback: self
                .collective_feedback
                .clone()
                .unwrap_or(base.collective_feedback),
        }
    }
}

impl ReportConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ReportError::ConfigError {
            message: format!("Cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ReportError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// 未被替換的 `${VAR}` 視為沒有提供金鑰
    pub fn api_key(&self) -> Option<&str> {
        self.llm
            .as_ref()
            .and_then(|llm| llm.api_key.as_deref())
            .filter(|key| !key.trim_start().starts_with("${"))
    }
}
