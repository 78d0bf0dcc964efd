//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 以脚本化回复队列依次应答，并记录收到的提示词，便于不联网验证编排循环。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::proposer::{LlmClient, Message};

/// Mock 客户端：按脚本顺序返回回复，记录每次收到的最后一条消息
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 历次 complete 收到的最后一条消息内容（按调用顺序）
    pub fn seen_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let last = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(last);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| "mock replies exhausted".to_string())
    }
}
