//! 重试编排器
//!
//! propose -> build -> execute 的有界循环：失败结果序列化后并入下一轮提示，
//! 最多 max_attempts 次（默认 5），各次尝试严格串行。
//! SchemaViolation 与执行失败同路回注；SaveFile 提案与纯文本回复立即终止。
//! 显式循环代替自递归，尝试上界独立可测。

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::command::build;
use crate::config::AppConfig;
use crate::core::TraceError;
use crate::exec::{ExecutionResult, ProcessRunner};
use crate::proposer::{parse_proposal, prompt, LlmClient, Message, Proposal};
use crate::schema::{bootstrap_schema, FunctionSchema, PositionalSpec, SchemaRegistry};

/// 编排器：启动时构建一次的只读上下文（注册表、位置参数表、LLM、执行器），
/// 全程按引用使用，无全局可变状态。
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    registry: SchemaRegistry,
    positional: PositionalSpec,
    runner: ProcessRunner,
    max_attempts: u32,
    default_timeout_secs: u64,
    elevation: String,
    explain_on_success: bool,
}

/// 尝试之间传递的状态；仅在两次尝试之间被修改
#[derive(Debug, Default)]
pub struct RetryState {
    pub attempts_remaining: u32,
    pub previous_prompt: Option<String>,
    pub last_result: Option<ExecutionResult>,
}

/// 一次完整运行的终态
#[derive(Debug)]
pub enum RunOutcome {
    /// 命令执行成功（stderr 为空）
    Succeeded {
        result: ExecutionResult,
        explanation: Option<String>,
        attempts_used: u32,
    },
    /// 持久化动作：文本已写入文件
    Saved { filename: String },
    /// 提案者判断无需动作，返回纯文本
    Answered(String),
    /// 重试额度耗尽
    Exhausted {
        last_result: Option<ExecutionResult>,
        attempts_used: u32,
    },
}

/// 单次尝试的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptOutcome {
    /// stderr 为空且未请求继续
    Succeeded,
    /// stderr 为空但提案要求继续对话；占用一次额度但不按失败上报
    ContinueRequested,
    /// stderr 非空（含超时被杀）
    Failed,
}

fn classify_attempt(result: &ExecutionResult, continue_requested: bool) -> AttemptOutcome {
    if !result.succeeded() {
        AttemptOutcome::Failed
    } else if continue_requested {
        AttemptOutcome::ContinueRequested
    } else {
        AttemptOutcome::Succeeded
    }
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        registry: SchemaRegistry,
        positional: PositionalSpec,
        runner: ProcessRunner,
        cfg: &AppConfig,
    ) -> Self {
        Self {
            llm,
            registry,
            positional,
            runner,
            max_attempts: cfg.engine.max_attempts,
            default_timeout_secs: cfg.executor.timeout_secs,
            elevation: cfg.executor.elevation.clone(),
            explain_on_success: cfg.engine.explain_on_success,
        }
    }

    /// -e 模式：将自由文本请求翻译为 bpftrace 调用并限次重试
    pub async fn execute(&self, request: &str) -> Result<RunOutcome, TraceError> {
        self.drive(request, prompt::running_prompt(request), None)
            .await
    }

    /// -c 模式：针对指定工具（注册表内或 --help 引导生成）驱动同一循环
    pub async fn run_tool(&self, cmd_name: &str, request: &str) -> Result<RunOutcome, TraceError> {
        let bootstrapped;
        let schema = match self.registry.resolve(cmd_name) {
            Some(s) => s,
            None => {
                bootstrapped = bootstrap_schema(self.llm.as_ref(), cmd_name).await?;
                &bootstrapped
            }
        };
        self.drive(request, prompt::command_prompt(schema, request), Some(schema))
            .await
    }

    async fn drive(
        &self,
        request: &str,
        seed_prompt: String,
        pinned: Option<&FunctionSchema>,
    ) -> Result<RunOutcome, TraceError> {
        let mut state = RetryState {
            attempts_remaining: self.max_attempts,
            previous_prompt: None,
            last_result: None,
        };
        let mut attempts_used = 0u32;

        while state.attempts_remaining > 0 {
            state.attempts_remaining -= 1;
            attempts_used += 1;

            // 首轮用种子提示；之后携带上一轮提示与序列化的执行结果
            let prompt_text = match (&state.previous_prompt, &state.last_result) {
                (Some(prev), Some(result)) => {
                    let result_json = serde_json::to_string(result)
                        .unwrap_or_else(|_| result.stderr.clone());
                    prompt::error_prompt(prev, &result_json)
                }
                _ => seed_prompt.clone(),
            };

            tracing::debug!(attempt = attempts_used, "requesting proposal");
            let output = self
                .llm
                .complete(&[Message::user(prompt_text.clone())])
                .await
                .map_err(TraceError::ProposerUnavailable)?;

            match parse_proposal(&output)? {
                Proposal::SaveFile { filename, content } => {
                    // 覆盖写入操作员/提案者给定路径
                    std::fs::write(&filename, content).map_err(|e| {
                        TraceError::PersistFailed(format!("{}: {}", filename, e))
                    })?;
                    tracing::info!(file = %filename, "content persisted");
                    return Ok(RunOutcome::Saved { filename });
                }
                Proposal::Explain(text) => {
                    return Ok(RunOutcome::Answered(text));
                }
                Proposal::RunCommand { command, mut args } => {
                    // 编排指令参数不属于工具 argv
                    let continue_requested = args
                        .remove("continue")
                        .and_then(|v: Value| v.as_bool())
                        .unwrap_or(false);
                    let timeout_secs = args
                        .remove("timeout")
                        .and_then(|v: Value| v.as_u64())
                        .unwrap_or(self.default_timeout_secs);

                    // Schema 解析：钉住的 Schema 优先，其次注册表，缺失走引导生成
                    let bootstrapped;
                    let schema = if let Some(s) = pinned.filter(|s| s.name == command) {
                        s
                    } else if let Some(s) = self.registry.resolve(&command) {
                        s
                    } else {
                        bootstrapped = bootstrap_schema(self.llm.as_ref(), &command).await?;
                        &bootstrapped
                    };

                    // 构建失败（SchemaViolation）与执行失败同路回注
                    let vector = match build(schema, &self.positional, &args, &self.elevation) {
                        Ok(v) => v,
                        Err(TraceError::SchemaViolation(msg)) => {
                            tracing::warn!(error = %msg, "schema violation, feeding back");
                            state.previous_prompt = Some(prompt_text);
                            state.last_result = Some(ExecutionResult {
                                command: command.clone(),
                                stdout: String::new(),
                                stderr: format!("schema violation: {}", msg),
                                exit_code: -1,
                            });
                            continue;
                        }
                        Err(e) => return Err(e),
                    };

                    let result = self
                        .runner
                        .run(&vector, Duration::from_secs(timeout_secs))
                        .await?;

                    match classify_attempt(&result, continue_requested) {
                        AttemptOutcome::Succeeded => {
                            let explanation = if self.explain_on_success {
                                self.llm
                                    .complete(&[Message::user(prompt::explain_prompt(
                                        request,
                                        &result.stdout,
                                    ))])
                                    .await
                                    .ok()
                            } else {
                                None
                            };
                            return Ok(RunOutcome::Succeeded {
                                result,
                                explanation,
                                attempts_used,
                            });
                        }
                        AttemptOutcome::ContinueRequested => {
                            tracing::info!(
                                attempt = attempts_used,
                                "proposer requested continuation, feeding result forward"
                            );
                        }
                        AttemptOutcome::Failed => {
                            tracing::warn!(
                                attempt = attempts_used,
                                exit_code = result.exit_code,
                                "attempt failed, feeding result forward"
                            );
                        }
                    }

                    state.previous_prompt = Some(prompt_text);
                    state.last_result = Some(result);
                }
            }
        }

        tracing::warn!(attempts = attempts_used, "retry credits exhausted");
        Ok(RunOutcome::Exhausted {
            last_result: state.last_result.take(),
            attempts_used,
        })
    }
}
