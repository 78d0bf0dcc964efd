//! 执行确认门
//!
//! 子进程启动前的唯一人工取消点：把完整命令展示给操作员并阻塞等待。
//! 非肯定回答即放弃，不产生任何执行结果。

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

/// 确认门 trait：返回 true 表示操作员同意执行
#[async_trait]
pub trait ConfirmGate: Send + Sync {
    async fn confirm(&self, command: &str) -> bool;
}

/// 终端确认：打印完整命令并读取 stdin，仅 y / yes 视为同意
pub struct TtyConfirm;

#[async_trait]
impl ConfirmGate for TtyConfirm {
    async fn confirm(&self, command: &str) -> bool {
        println!("The command to run is: {}", command);
        println!("Enter 'y' to proceed: ");
        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        if reader.read_line(&mut line).await.is_err() {
            return false;
        }
        matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// 自动确认（-y 或测试）
pub struct AutoConfirm;

#[async_trait]
impl ConfirmGate for AutoConfirm {
    async fn confirm(&self, _command: &str) -> bool {
        true
    }
}
