//! 提案者层：LLM 客户端抽象与实现、提案解析、提示词构建

pub mod mock;
pub mod openai;
pub mod parse;
pub mod prompt;
pub mod traits;

pub use mock::MockLlmClient;
pub use openai::OpenAiClient;
pub use parse::{extract_code_blocks, parse_proposal, Proposal};
pub use traits::{LlmClient, Message, Role};
