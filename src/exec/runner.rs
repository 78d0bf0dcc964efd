//! 受控子进程执行器
//!
//! 启动单个子进程并施加硬超时：stdout 逐行实时回显给操作员并按发出顺序累积，
//! stderr 后台收集；超时强杀后仍返回已捕获的部分输出（超时不单列为错误类别）。
//! 进程管理中的管道错误折叠进现有结果，不向上传播。

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use crate::command::CommandVector;
use crate::core::TraceError;
use crate::exec::ConfirmGate;

/// 被信号杀死（如超时强杀）时没有退出码，统一记为 -1
const KILLED_EXIT_CODE: i32 = -1;

/// 子进程回收后留给清扫任务的宽限秒数；孙进程仍占着管道时放弃等待，
/// 返回已捕获的部分内容
const DRAIN_GRACE_SECS: u64 = 1;

/// 单次执行的结构化结果；每次尝试新建，返回后不再修改。
/// stderr 为空即视为本次尝试成功。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// 空格连接的完整命令行
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn succeeded(&self) -> bool {
        self.stderr.is_empty()
    }
}

/// 毒锁折叠为已有内容的快照读取
fn snapshot(buf: &Arc<Mutex<String>>) -> String {
    buf.lock().map(|g| g.clone()).unwrap_or_default()
}

/// 执行器：持有确认门，按 run 一次消费一个命令向量
pub struct ProcessRunner {
    confirm: Arc<dyn ConfirmGate>,
}

impl ProcessRunner {
    pub fn new(confirm: Arc<dyn ConfirmGate>) -> Self {
        Self { confirm }
    }

    /// 确认、启动、限时执行命令向量，返回结构化结果
    ///
    /// 操作员拒绝确认返回 UserAborted（硬停止，未启动任何进程）；
    /// 启动失败返回 SpawnFailed；其余情况总能给出 ExecutionResult。
    pub async fn run(
        &self,
        vector: &CommandVector,
        timeout: Duration,
    ) -> Result<ExecutionResult, TraceError> {
        let command_line = vector.to_string();

        if !self.confirm.confirm(&command_line).await {
            tracing::warn!(command = %command_line, "execution rejected at confirmation gate");
            return Err(TraceError::UserAborted);
        }

        let mut child = Command::new(vector.program())
            .args(vector.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TraceError::SpawnFailed(format!("{}: {}", vector.program(), e)))?;

        tracing::info!(
            command = %command_line,
            timeout_secs = timeout.as_secs(),
            "child process started"
        );

        // 清扫任务写入共享缓冲：即使任务被放弃，已捕获内容仍可取回。
        // stdout 逐行回显并按发出顺序累积，stderr 分块收集；读取都是异步的，
        // 超时杀进程不会和阻塞读竞争。
        let stdout_buf = Arc::new(Mutex::new(String::new()));
        let stderr_buf = Arc::new(Mutex::new(String::new()));
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let mut stdout_task = tokio::spawn({
            let buf = stdout_buf.clone();
            async move {
                if let Some(pipe) = stdout_pipe {
                    let mut lines = BufReader::new(pipe).lines();
                    // Ok(None) 为 EOF；读错误（如 broken pipe）折叠为已捕获内容
                    while let Ok(Some(line)) = lines.next_line().await {
                        println!("{}", line);
                        if let Ok(mut b) = buf.lock() {
                            b.push_str(&line);
                            b.push('\n');
                        }
                    }
                }
            }
        });

        let mut stderr_task = tokio::spawn({
            let buf = stderr_buf.clone();
            async move {
                if let Some(mut pipe) = stderr_pipe {
                    let mut chunk = [0u8; 4096];
                    loop {
                        match pipe.read(&mut chunk).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                if let Ok(mut b) = buf.lock() {
                                    b.push_str(&String::from_utf8_lossy(&chunk[..n]));
                                }
                            }
                        }
                    }
                }
            }
        });

        // 子进程退出与超时竞争；超时强杀后重新等待以回收。
        // 进程已自行退出时 start_kill 会失败，视为无事。
        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => status.ok(),
            Err(_) => {
                tracing::warn!(command = %command_line, "timeout reached, killing child process");
                if let Err(e) = child.start_kill() {
                    tracing::debug!(error = %e, "child already exited before kill");
                }
                child.wait().await.ok()
            }
        };

        // 最终清扫：正常情况下管道随进程退出到 EOF，任务立即结束；
        // 若有孙进程仍持有管道，宽限期后放弃，返回部分结果
        let drained = tokio::time::timeout(Duration::from_secs(DRAIN_GRACE_SECS), async {
            let _ = (&mut stdout_task).await;
            let _ = (&mut stderr_task).await;
        })
        .await;
        if drained.is_err() {
            tracing::debug!(command = %command_line, "output pipes still open after exit, abandoning drain");
            stdout_task.abort();
            stderr_task.abort();
        }

        let stdout = snapshot(&stdout_buf);
        let stderr = snapshot(&stderr_buf);
        let exit_code = status.and_then(|s| s.code()).unwrap_or(KILLED_EXIT_CODE);

        tracing::info!(
            command = %command_line,
            exit_code,
            stderr_len = stderr.len(),
            "child process finished"
        );

        Ok(ExecutionResult {
            command: command_line,
            stdout,
            stderr,
            exit_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::AutoConfirm;

    struct DenyConfirm;

    #[async_trait::async_trait]
    impl ConfirmGate for DenyConfirm {
        async fn confirm(&self, _command: &str) -> bool {
            false
        }
    }

    fn vector(tokens: &[&str]) -> CommandVector {
        CommandVector::from_tokens(tokens.iter().map(|t| t.to_string()).collect())
    }

    fn runner() -> ProcessRunner {
        ProcessRunner::new(Arc::new(AutoConfirm))
    }

    #[tokio::test]
    async fn captures_stdout_in_order() {
        let result = runner()
            .run(
                &vector(&["sh", "-c", "echo one; echo two"]),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert_eq!(result.stdout, "one\ntwo\n");
        assert_eq!(result.exit_code, 0);
        assert!(result.succeeded());
        assert_eq!(result.command, "sh -c echo one; echo two");
    }

    #[tokio::test]
    async fn nonempty_stderr_is_failure() {
        let result = runner()
            .run(
                &vector(&["sh", "-c", "echo oops >&2"]),
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert!(!result.succeeded());
        assert!(result.stderr.contains("oops"));
        // 退出码为 0 也不改变失败判定
        assert_eq!(result.exit_code, 0);
    }

    #[tokio::test]
    async fn timeout_kills_child_and_returns_partial_output() {
        let start = std::time::Instant::now();
        let result = runner()
            .run(
                &vector(&["sh", "-c", "echo early; sleep 30"]),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert!(start.elapsed() < Duration::from_secs(10));
        assert_eq!(result.stdout, "early\n");
        assert_eq!(result.exit_code, KILLED_EXIT_CODE);
    }

    #[tokio::test]
    async fn rejected_confirmation_is_user_aborted() {
        let runner = ProcessRunner::new(Arc::new(DenyConfirm));
        let err = runner
            .run(&vector(&["sh", "-c", "echo nope"]), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, TraceError::UserAborted));
    }

    #[tokio::test]
    async fn spawn_failure_is_reported() {
        let err = runner()
            .run(
                &vector(&["/nonexistent/beetrace-test-binary"]),
                Duration::from_secs(5),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TraceError::SpawnFailed(_)));
    }
}
