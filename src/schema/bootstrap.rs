//! Schema 引导
//!
//! 注册表缺少命令时的回退路径：抓取 `cmd --help`（短超时、不提权），
//! 交给提案者按示例格式生成 FunctionSchema。失败归为 ProposerUnavailable：
//! 没有合法 Schema 的重试无法取得进展，直接上报。

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::core::TraceError;
use crate::proposer::parse::extract_json;
use crate::proposer::{prompt, LlmClient, Message};
use crate::schema::FunctionSchema;

/// --help 抓取超时（秒）
const HELP_TIMEOUT_SECS: u64 = 10;

/// 为未注册的命令生成 Schema：抓取帮助文档并请求提案者转换
pub async fn bootstrap_schema(
    llm: &dyn LlmClient,
    command: &str,
) -> Result<FunctionSchema, TraceError> {
    let help_doc = capture_help(command).await;
    tracing::info!(command = %command, "bootstrapping schema from --help output");
    let reply = llm
        .complete(&[Message::user(prompt::schema_generation_prompt(
            command, &help_doc,
        ))])
        .await
        .map_err(TraceError::ProposerUnavailable)?;
    parse_schema_reply(&reply)
}

/// 抓取 `command --help`；许多工具把 usage 打到 stderr，stdout 为空时取 stderr。
/// 抓取失败不致命，把错误文本交给模型自行斟酌。
async fn capture_help(command: &str) -> String {
    let result = tokio::time::timeout(
        Duration::from_secs(HELP_TIMEOUT_SECS),
        Command::new(command)
            .arg("--help")
            .stdin(Stdio::null())
            .output(),
    )
    .await;
    match result {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if stdout.trim().is_empty() {
                String::from_utf8_lossy(&output.stderr).into_owned()
            } else {
                stdout.into_owned()
            }
        }
        Ok(Err(e)) => format!("Error executing help command: {}", e),
        Err(_) => format!("Help command timed out after {}s", HELP_TIMEOUT_SECS),
    }
}

/// 解析提案者生成的 Schema JSON 并校验不变式
fn parse_schema_reply(reply: &str) -> Result<FunctionSchema, TraceError> {
    let json_str = extract_json(reply).ok_or_else(|| {
        TraceError::ProposerUnavailable(format!("schema generation returned no JSON: {}", reply))
    })?;
    let schema: FunctionSchema = serde_json::from_str(json_str).map_err(|e| {
        TraceError::ProposerUnavailable(format!("schema generation returned invalid JSON: {}", e))
    })?;
    schema.validate().map_err(|e| {
        TraceError::ProposerUnavailable(format!("generated schema is inconsistent: {}", e))
    })?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposer::MockLlmClient;

    #[tokio::test]
    async fn bootstraps_schema_from_mock_reply() {
        let reply = r#"```json
{
    "name": "softirqs-bpfcc",
    "description": "Measure soft IRQ event time",
    "parameters": {
        "type": "object",
        "properties": {
            "interval": {"type": "integer", "description": "output interval, seconds"},
            "timestamp": {"type": "boolean", "description": "include timestamp"}
        },
        "required": []
    }
}
```"#;
        let llm = MockLlmClient::new(vec![reply.to_string()]);
        let schema = bootstrap_schema(&llm, "softirqs-bpfcc").await.unwrap();
        assert_eq!(schema.name, "softirqs-bpfcc");
        assert!(schema.parameters.properties.contains_key("interval"));

        // 提示词应携带命令名与帮助文档要求
        let prompts = llm.seen_prompts();
        assert!(prompts[0].contains("softirqs-bpfcc"));
    }

    #[tokio::test]
    async fn inconsistent_generated_schema_is_rejected() {
        let reply = r#"{"name": "t", "parameters": {"type": "object", "properties": {}, "required": ["ghost"]}}"#;
        let llm = MockLlmClient::new(vec![reply.to_string()]);
        let err = bootstrap_schema(&llm, "t").await.unwrap_err();
        assert!(matches!(err, TraceError::ProposerUnavailable(_)));
    }
}
