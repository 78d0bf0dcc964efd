//! 函数调用 Schema 注册表
//!
//! 启动时从 JSON 文件（或内嵌默认表）一次性加载，此后只读，可安全并发读取。
//! 加载时校验 required ⊆ parameters；重名条目告警并按后写覆盖。
//! 某命令缺失不视为致命：调用方回退到 --help 引导生成（bootstrap）。

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::TraceError;

/// 内嵌的预定义函数表：bpftrace 与常用 bcc 工具
const DEFAULT_FUNCS: &str = include_str!("../../data/funcs.json");

/// 参数声明类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Boolean,
    Integer,
    Float,
    /// 字符串数组，每个元素以独立旗标重复发出
    Array,
}

/// 单个参数的声明：类型、描述、可选枚举值与可选短旗标
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// 数组类参数发出时使用的旗标（如 -I）；缺省为 --参数名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
}

/// 参数对象（对应 JSON Schema 的 object 层）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterObject {
    #[serde(rename = "type", default = "default_object_type")]
    pub object_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, ParameterSpec>,
    #[serde(default)]
    pub required: BTreeSet<String>,
}

fn default_object_type() -> String {
    "object".to_string()
}

/// 一个可调用命令的完整描述：名称、说明与参数表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub parameters: ParameterObject,
}

impl FunctionSchema {
    /// 校验结构不变式：required 引用的参数必须已声明
    pub fn validate(&self) -> Result<(), TraceError> {
        for req in &self.parameters.required {
            if !self.parameters.properties.contains_key(req) {
                return Err(TraceError::ConfigError(format!(
                    "schema `{}` requires undeclared parameter `{}`",
                    self.name, req
                )));
            }
        }
        Ok(())
    }
}

/// 只读注册表：按命令名索引 FunctionSchema
#[derive(Debug)]
pub struct SchemaRegistry {
    functions: HashMap<String, FunctionSchema>,
}

impl SchemaRegistry {
    /// 从 JSON 文件加载；path 为 None 时使用内嵌默认表
    pub fn load(path: Option<&Path>) -> Result<Self, TraceError> {
        let data = match path {
            Some(p) => std::fs::read_to_string(p).map_err(|e| {
                TraceError::ConfigError(format!("cannot read schema file {}: {}", p.display(), e))
            })?,
            None => DEFAULT_FUNCS.to_string(),
        };
        let functions: Vec<FunctionSchema> = serde_json::from_str(&data)
            .map_err(|e| TraceError::ConfigError(format!("invalid schema JSON: {}", e)))?;
        Self::from_functions(functions)
    }

    /// 从已解析的函数列表构建，逐条校验；重名告警并按后写覆盖
    pub fn from_functions(functions: Vec<FunctionSchema>) -> Result<Self, TraceError> {
        let mut map = HashMap::with_capacity(functions.len());
        for func in functions {
            func.validate()?;
            if map.contains_key(&func.name) {
                tracing::warn!(command = %func.name, "duplicate schema entry, keeping the later one");
            }
            map.insert(func.name.clone(), func);
        }
        Ok(Self { functions: map })
    }

    /// 按命令名解析 Schema；缺失返回 None（可恢复，走 bootstrap）
    pub fn resolve(&self, name: &str) -> Option<&FunctionSchema> {
        self.functions.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_json(name: &str, required: &str) -> String {
        format!(
            r#"{{"name": "{}", "description": "d", "parameters": {{"type": "object",
                "properties": {{"pid": {{"type": "integer", "description": "trace this PID"}}}},
                "required": [{}]}}}}"#,
            name, required
        )
    }

    #[test]
    fn loads_embedded_defaults() {
        let registry = SchemaRegistry::load(None).unwrap();
        assert!(!registry.is_empty());
        let bpftrace = registry.resolve("bpftrace").unwrap();
        assert!(bpftrace.parameters.required.contains("program"));
        assert_eq!(
            bpftrace.parameters.properties.get("program").map(|p| p.kind),
            Some(ParameterKind::String)
        );
    }

    #[test]
    fn missing_command_resolves_to_none() {
        let registry = SchemaRegistry::load(None).unwrap();
        assert!(registry.resolve("not-a-real-tool").is_none());
    }

    #[test]
    fn rejects_required_not_in_properties() {
        let func: FunctionSchema =
            serde_json::from_str(&schema_json("broken", r#""missing""#)).unwrap();
        let err = SchemaRegistry::from_functions(vec![func]).unwrap_err();
        assert!(matches!(err, TraceError::ConfigError(_)));
    }

    #[test]
    fn duplicate_names_keep_the_later_entry() {
        let a: FunctionSchema = serde_json::from_str(&schema_json("dup", "")).unwrap();
        let mut b = a.clone();
        b.description = "later".to_string();
        let registry = SchemaRegistry::from_functions(vec![a, b]).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("dup").unwrap().description, "later");
    }

    #[test]
    fn array_parameter_carries_flag() {
        let registry = SchemaRegistry::load(None).unwrap();
        let bpftrace = registry.resolve("bpftrace").unwrap();
        let include = bpftrace.parameters.properties.get("includeDir").unwrap();
        assert_eq!(include.kind, ParameterKind::Array);
        assert_eq!(include.flag.as_deref(), Some("-I"));
    }
}
