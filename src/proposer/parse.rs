//! 提案解析
//!
//! 从 LLM 输出中提取 JSON（```json 围栏优先，其次最外层大括号），解析为 Proposal；
//! 不含 JSON 的输出视为纯文本回复，损坏的 JSON 视为 ProposerUnavailable（当轮致命，不静默重试）。

use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::Value;

use crate::core::TraceError;

/// 提案 JSON 线格式：运行命令或持久化文件，二选一（仅用于解析与 Schema 生成）
#[derive(Debug, Clone, Deserialize, JsonSchema)]
struct ProposalWire {
    /// 要运行的追踪命令名，如 bpftrace、funccount-bpfcc
    #[serde(default)]
    command: Option<String>,
    /// 传给命令的参数表，键必须是该命令 Schema 声明的参数
    #[serde(default)]
    args: Option<serde_json::Map<String, Value>>,
    /// 持久化动作：目标文件名
    #[serde(default)]
    filename: Option<String>,
    /// 持久化动作：文件内容
    #[serde(default)]
    content: Option<String>,
}

/// 提案者返回的三种动作
#[derive(Debug, Clone)]
pub enum Proposal {
    /// 运行某个追踪命令
    RunCommand {
        command: String,
        args: serde_json::Map<String, Value>,
    },
    /// 将文本写入文件（持久化动作，立即成功结束）
    SaveFile { filename: String, content: String },
    /// 无动作，纯文本回复
    Explain(String),
}

/// 返回提案 JSON 结构的 Schema 字符串，可拼入提示词减少模型输出格式错误
pub fn proposal_schema_json() -> String {
    let schema = schema_for!(ProposalWire);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::new())
}

/// 从文本中提取 JSON 负载：```json 围栏优先，其次最外层大括号；无则 None
pub(crate) fn extract_json(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        return Some(
            rest.find("```")
                .map(|end| rest[..end].trim())
                .unwrap_or_else(|| rest.trim()),
        );
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// 解析 LLM 输出：含 JSON 则为 RunCommand / SaveFile，否则为 Explain
pub fn parse_proposal(output: &str) -> Result<Proposal, TraceError> {
    let trimmed = output.trim();
    let Some(json_str) = extract_json(trimmed) else {
        return Ok(Proposal::Explain(trimmed.to_string()));
    };

    let wire: ProposalWire = serde_json::from_str(json_str).map_err(|e| {
        TraceError::ProposerUnavailable(format!("unparseable proposal: {}: {}", e, json_str))
    })?;

    match wire {
        ProposalWire {
            command: Some(command),
            args,
            ..
        } if !command.is_empty() => Ok(Proposal::RunCommand {
            command,
            args: args.unwrap_or_default(),
        }),
        ProposalWire {
            filename: Some(filename),
            content: Some(content),
            ..
        } => Ok(Proposal::SaveFile { filename, content }),
        _ => Err(TraceError::ProposerUnavailable(format!(
            "proposal carries no action: {}",
            json_str
        ))),
    }
}

/// 从 Markdown 回复中提取所有围栏代码块（生成 eBPF 程序用）
pub fn extract_code_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            match current.take() {
                Some(block) => blocks.push(block),
                None => current = Some(String::new()),
            }
            continue;
        }
        if let Some(block) = current.as_mut() {
            block.push_str(line);
            block.push('\n');
        }
    }
    blocks
}
