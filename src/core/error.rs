//! 错误类型
//!
//! 与重试编排器配合：SchemaViolation 与执行失败同路，回注下一轮提案；
//! ProposerUnavailable 与 UserAborted 属于致命错误，立即上报不重试。
//! 超时不单列：折叠进 ExecutionResult 的非空 stderr / 退出码路径。

use thiserror::Error;

/// 引擎运行过程中可能出现的错误（Schema 校验、子进程、提案者、确认门等）
#[derive(Error, Debug)]
pub enum TraceError {
    /// 参数表引用未声明参数或缺少必填参数，可经下一轮提案恢复
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// 提案者出错或输出不可解析；没有合法提案的重试无法取得进展
    #[error("Proposer unavailable: {0}")]
    ProposerUnavailable(String),

    /// 操作员在确认门拒绝执行，立即终止且不可重试
    #[error("Aborted by operator")]
    UserAborted,

    #[error("Failed to spawn process: {0}")]
    SpawnFailed(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    /// 持久化动作写文件失败
    #[error("Persist failed: {0}")]
    PersistFailed(String),
}
