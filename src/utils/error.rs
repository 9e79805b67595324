use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required input: {field}")]
    MissingInputError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Survey file has no question columns: {message}")]
    NoQuestionsError { message: String },

    #[error("LLM {stage} call failed: {message}")]
    LlmError { stage: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Network,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn llm(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LlmError {
            stage: stage.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingInputError { .. } | Self::ValidationError { .. } => ErrorCategory::Input,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            Self::HttpError(_) | Self::LlmError { .. } => ErrorCategory::Network,
            Self::CsvError(_) | Self::NoQuestionsError { .. } | Self::SerializationError(_) => {
                ErrorCategory::Data
            }
            Self::ZipError(_) | Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingInputError { field } => match field.as_str() {
                "title" => "You must enter a title for the survey report".to_string(),
                "csv" => "You must upload the survey responses".to_string(),
                "api_key" => "You must enter an OpenAI API Key".to_string(),
                other => format!("Missing required input: {}", other),
            },
            Self::CsvError(e) => format!("Could not read the survey responses file: {}", e),
            Self::NoQuestionsError { .. } => {
                "The survey file has no question columns after the first three metadata columns"
                    .to_string()
            }
            Self::HttpError(_) | Self::LlmError { .. } => {
                format!("The language model request failed: {}", self)
            }
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MissingInputError { .. } => "Pass --title, --csv and --api-key (or set OPENAI_API_KEY)",
            Self::InvalidConfigValueError { .. } | Self::ConfigError { .. } => {
                "Check the command-line flags and the TOML config file"
            }
            Self::ValidationError { .. } => "Fix the reported value and run again",
            Self::CsvError(_) | Self::NoQuestionsError { .. } => {
                "Export the survey as CSV with three metadata columns followed by one column per question"
            }
            Self::HttpError(_) | Self::LlmError { .. } => {
                "Verify the API key, base URL and network connectivity, then retry"
            }
            Self::IoError(_) | Self::ZipError(_) => {
                "Check that the output directory exists and is writable"
            }
            Self::SerializationError(_) => "Report this as a bug",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
