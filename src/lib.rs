//! Beetrace - 自然语言驱动的 eBPF 追踪执行引擎
//!
//! 模块划分：
//! - **cli**: 操作员命令行参数（clap）
//! - **command**: 参数分类与命令向量构建
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误分类与 propose -> build -> execute 重试编排
//! - **exec**: 受控子进程执行（确认门、超时、流式输出捕获）
//! - **proposer**: LLM 提案者（OpenAI 兼容 / Mock）、提案解析与提示词构建
//! - **schema**: 函数调用 Schema 注册表、位置参数表与 --help 引导生成

pub mod cli;
pub mod command;
pub mod config;
pub mod core;
pub mod exec;
pub mod proposer;
pub mod schema;
