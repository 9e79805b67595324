// Adapters layer: concrete implementations for external systems (csv, llm api, tokenizer, docx).

pub mod csv_reader;
pub mod docx;
pub mod openai;
pub mod tokenizer;

pub use openai::{LlmSettings, OpenAiClient};
pub use tokenizer::{build_counter, TokenizerKind};
