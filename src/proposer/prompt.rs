//! 提示词构建
//!
//! 运行提示、错误反馈提示、解释提示、Schema 生成提示与 eBPF 程序生成提示；
//! 输出格式约束通过注入提案 JSON Schema 降低模型格式错误率。

use crate::proposer::parse::proposal_schema_json;
use crate::schema::FunctionSchema;

/// 解释提示中嵌入的命令输出上限（字符），超过则截断以控制 token
const EXPLAIN_OUTPUT_CAP: usize = 4096;

/// 固定的 info 请求
pub fn info_prompt() -> &'static str {
    "Explain what's eBPF"
}

fn action_format_section() -> String {
    format!(
        "When you decide to act, respond with exactly one JSON object and nothing else.\n\
         To run a command: {{\"command\": \"<name>\", \"args\": {{...}}}}.\n\
         To save text to a file instead of running anything: {{\"filename\": \"<path>\", \"content\": \"<text>\"}}.\n\
         If no action is warranted, reply in plain prose without any JSON.\n\
         The JSON Schema of a valid action is:\n{}",
        proposal_schema_json()
    )
}

/// 将用户请求翻译为 bpftrace 调用的首轮提示
pub fn running_prompt(request: &str) -> String {
    format!(
        "As a supportive assistant to a Linux system administrator, your role is to \
         leverage bpftrace to generate eBPF tracing that aids in problem-solving. \
         You may not always need to run the tool.\n\n{}\n\n\
         Now, you have received the following request from a user: {}\n\
         Please accomplish this task to the best of your ability.",
        action_format_section(),
        request
    )
}

/// 针对指定工具 Schema 的提示（-c 模式）：注入该命令的函数描述
pub fn command_prompt(schema: &FunctionSchema, request: &str) -> String {
    let schema_json =
        serde_json::to_string_pretty(schema).unwrap_or_else(|_| String::new());
    format!(
        "As a supportive assistant to a Linux system administrator, you drive the \
         tracing tool `{}`. Its callable description is:\n{}\n\n{}\n\n\
         The user request is: {}",
        schema.name,
        schema_json,
        action_format_section(),
        request
    )
}

/// 上一轮失败后的纠错提示：携带前一轮提示与序列化的执行结果
pub fn error_prompt(previous_prompt: &str, result_json: &str) -> String {
    format!(
        "{}\n\n\
         The previous command failed to execute or did not finish. \
         Maybe you can try to list the attach points and choose one to attach, \
         if you have not done so before. \
         The original command and its output were:\n\n{}\n\n\
         Please fix the action according to this error and respond with the corrected JSON action only.",
        previous_prompt, result_json
    )
}

/// 请求解释成功运行的输出（纯读取，不再触发执行）
pub fn explain_prompt(request: &str, stdout: &str) -> String {
    let output: String = stdout.chars().take(EXPLAIN_OUTPUT_CAP).collect();
    format!(
        "Please explain the output of the previous trace run:\n\n{}\n\n\
         The original user request was: {}",
        output, request
    )
}

/// 从 --help 文档生成函数调用 Schema 的提示
pub fn schema_generation_prompt(command: &str, help_doc: &str) -> String {
    let example = r#"```json
{
    "name": "get_current_weather",
    "description": "Get the current weather",
    "parameters": {
        "type": "object",
        "properties": {
            "location": {
                "type": "string",
                "description": "The city and state, e.g. San Francisco, CA"
            },
            "format": {
                "type": "string",
                "enum": ["celsius", "fahrenheit"],
                "description": "The temperature unit to use."
            }
        },
        "required": ["location", "format"]
    }
}
```"#;
    format!(
        "Please generate a JSON representation of the command `{}` as per the provided help documentation:\n\n{}\n\n\
         Your JSON should strictly adhere to the following guidelines:\n\
         - Do not include extra fields such as examples.\n\
         - Ensure the command description accurately matches the help documentation.\n\
         - Parameter names should not start with a '-' or contain a ','.\n\
         - Your format should align with the provided example: {}\n\
         - Assign the most appropriate data type to each parameter. Possible types are \"string\", \"boolean\", \"integer\", \"float\" and \"array\".\n\n\
         IMPORTANT: Provide the JSON representation directly, without any additional explanation. \
         If any information is missing from the help documentation, use your best judgment to provide a logical solution.",
        command, help_doc, example
    )
}

/// 生成 eBPF 程序的提示（-g 模式）
pub fn generate_prompt(request: &str) -> String {
    format!(
        "You are now a translator from human language to Linux eBPF programs. \
         Please write an eBPF program for me. \
         No explanation required, no instruction required, don't tell me how to compile and run. \
         What I want is just an eBPF program in markdown format for: {}",
        request
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_prompt_carries_request_and_format() {
        let p = running_prompt("count page faults by process");
        assert!(p.contains("count page faults by process"));
        assert!(p.contains("\"command\""));
    }

    #[test]
    fn error_prompt_carries_previous_context() {
        let p = error_prompt("original prompt", r#"{"stderr": "no such probe"}"#);
        assert!(p.contains("original prompt"));
        assert!(p.contains("no such probe"));
    }

    #[test]
    fn explain_prompt_truncates_long_output() {
        let long = "x".repeat(EXPLAIN_OUTPUT_CAP + 100);
        let p = explain_prompt("req", &long);
        assert!(p.len() < long.len() + 200);
    }
}
