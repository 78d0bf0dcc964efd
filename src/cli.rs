//! 操作员命令行参数
//!
//! 对外表面：命令名 + 自由文本请求 + 详细程度开关；进度与错误打印到标准输出，
//! 不定义额外的进程退出码。

use clap::Parser;

/// 用自然语言驱动 bpftrace / bcc 追踪工具的受控执行
#[derive(Debug, Parser)]
#[command(
    name = "beetrace",
    about = "Use an LLM to drive bpftrace / bcc tracing tools under guarded execution"
)]
pub struct Cli {
    /// 用指定 bcc 工具完成追踪任务
    #[arg(
        short = 'c',
        long = "cmd",
        num_args = 2,
        value_names = ["CMD_NAME", "QUERY"]
    )]
    pub cmd: Option<Vec<String>>,

    /// 将请求翻译为 bpftrace 命令并运行
    #[arg(short = 'e', long = "execute", value_name = "EXEC_QUERY")]
    pub execute: Option<String>,

    /// 生成 eBPF 程序并写入 generated.bpf.c
    #[arg(short = 'g', long = "generate", value_name = "GEN_QUERY")]
    pub generate: Option<String>,

    /// 让提案者解释什么是 eBPF
    #[arg(short = 'i', long = "info")]
    pub info: bool,

    /// 显示更多日志
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// 跳过执行前确认门
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// OpenAI API Key（亦可通过环境变量 OPENAI_API_KEY 提供）
    #[arg(short = 'k', long = "key", value_name = "OPENAI_API_KEY")]
    pub key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cmd_pair() {
        let cli = Cli::parse_from([
            "beetrace",
            "-c",
            "profile-bpfcc",
            "profile the system for 5 seconds",
        ]);
        let pair = cli.cmd.unwrap();
        assert_eq!(pair[0], "profile-bpfcc");
        assert!(pair[1].contains("5 seconds"));
    }

    #[test]
    fn parses_execute_with_flags() {
        let cli = Cli::parse_from(["beetrace", "-e", "count page faults", "-v", "-y"]);
        assert_eq!(cli.execute.as_deref(), Some("count page faults"));
        assert!(cli.verbose);
        assert!(cli.yes);
        assert!(cli.cmd.is_none());
    }
}
