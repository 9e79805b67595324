use crate::domain::ports::TokenCounter;
use crate::utils::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// cl100k_base，與 gpt-3.5-turbo / gpt-4 相同的編碼
    #[default]
    Bpe,
    /// 約 4 個字元一個 token
    Heuristic,
}

pub struct BpeTokenCounter {
    bpe: CoreBPE,
}

impl BpeTokenCounter {
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| ReportError::ConfigError {
            message: format!("Failed to load cl100k_base tokenizer: {}", e),
        })?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for BpeTokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.chars().count().div_ceil(CHARS_PER_TOKEN)
    }
}

pub fn build_counter(kind: TokenizerKind) -> Result<Arc<dyn TokenCounter>> {
    Ok(match kind {
        TokenizerKind::Bpe => Arc::new(BpeTokenCounter::cl100k()?),
        TokenizerKind::Heuristic => Arc::new(HeuristicTokenCounter),
    })
}
