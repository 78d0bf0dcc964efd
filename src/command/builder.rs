//! 参数分类与命令向量构建
//!
//! 将 (FunctionSchema, 参数表) 转换为有序 argv：提权 token 与命令名打头，
//! 位置参数作为最后一个裸 token；boolean true 为裸 --flag，false 不发出；
//! 数值裸 token，字符串带引号 token；数组元素按声明旗标逐个重复发出。
//! 参数表按其枚举顺序处理，同一输入产出确定的向量。

use std::fmt;

use serde_json::Value;

use crate::core::TraceError;
use crate::schema::{FunctionSchema, ParameterKind, PositionalSpec};

/// 构建完成的命令向量：一次构建，不可变，交执行器消费一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVector {
    tokens: Vec<String>,
}

impl CommandVector {
    /// 由 build 产出；测试亦可直接构造
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// 第一个 token（提权命令），由执行器作为程序启动
    pub fn program(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }

    /// 程序之后的全部参数
    pub fn args(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }
}

impl fmt::Display for CommandVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

/// 值渲染为裸 token（位置参数与数值用）
fn render_bare(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 值渲染为带引号 token（字符串与数组元素用）
fn render_quoted(value: &Value) -> String {
    format!("\"{}\"", render_bare(value))
}

/// 按 Schema 分类参数表并构建命令向量
///
/// 失败条件：参数表引用未声明参数，或缺少 required 参数，均为 SchemaViolation
/// （由编排器回注下一轮提案，不终止整个运行）。
pub fn build(
    schema: &FunctionSchema,
    positional: &PositionalSpec,
    args: &serde_json::Map<String, Value>,
    elevation: &str,
) -> Result<CommandVector, TraceError> {
    for req in &schema.parameters.required {
        if !args.contains_key(req) {
            return Err(TraceError::SchemaViolation(format!(
                "missing required parameter `{}` for `{}`",
                req, schema.name
            )));
        }
    }

    let mut tokens = vec![elevation.to_string(), schema.name.clone()];
    let mut positional_value: Option<String> = None;

    for (key, value) in args {
        let spec = schema.parameters.properties.get(key).ok_or_else(|| {
            TraceError::SchemaViolation(format!(
                "unknown parameter `{}` for `{}`",
                key, schema.name
            ))
        })?;

        // 位置参数：仅捕获非布尔值，后写覆盖，最后统一追加
        if positional.is_positional(&schema.name, key) && !value.is_boolean() {
            positional_value = Some(render_bare(value));
            continue;
        }

        match spec.kind {
            ParameterKind::Boolean => {
                if value.as_bool() == Some(true) {
                    tokens.push(format!("--{}", key));
                }
                // false 不发出，不是错误
            }
            ParameterKind::Integer | ParameterKind::Float => {
                tokens.push(format!("--{}", key));
                tokens.push(render_bare(value));
            }
            ParameterKind::String => {
                tokens.push(format!("--{}", key));
                tokens.push(render_quoted(value));
            }
            ParameterKind::Array => {
                let flag = spec
                    .flag
                    .clone()
                    .unwrap_or_else(|| format!("--{}", key));
                match value.as_array() {
                    Some(items) => {
                        for item in items {
                            tokens.push(flag.clone());
                            tokens.push(render_quoted(item));
                        }
                    }
                    None => {
                        tokens.push(flag);
                        tokens.push(render_quoted(value));
                    }
                }
            }
        }
    }

    if let Some(pos) = positional_value {
        tokens.push(pos);
    }

    Ok(CommandVector { tokens })
}
