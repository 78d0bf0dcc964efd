//! Beetrace - 自然语言驱动的 eBPF 追踪执行引擎
//!
//! 入口：初始化日志与配置，构建编排器上下文，按 CLI 模式分发。

use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use beetrace::cli::Cli;
use beetrace::config::{load_config, AppConfig};
use beetrace::core::{Orchestrator, RunOutcome};
use beetrace::exec::{AutoConfirm, ConfirmGate, ProcessRunner, TtyConfirm};
use beetrace::proposer::{extract_code_blocks, prompt, LlmClient, Message, OpenAiClient};
use beetrace::schema::{PositionalSpec, SchemaRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 日志：默认 info，-v 提升为 debug，可通过 RUST_LOG 覆盖
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(default_level.parse().unwrap()))
        .with(fmt::layer())
        .init();

    if let Some(key) = cli.key.as_deref() {
        std::env::set_var("OPENAI_API_KEY", key);
    }
    if std::env::var("OPENAI_API_KEY").is_err() {
        println!(
            "Either provide your access token through `-k` or through the OPENAI_API_KEY environment variable"
        );
        return Ok(());
    }

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(
        cfg.llm.base_url.as_deref(),
        &cfg.llm.model,
        None,
    ));

    let registry = SchemaRegistry::load(cfg.schemas.funcs_path.as_deref())
        .context("Failed to load function schemas")?;
    let positional = PositionalSpec::defaults();
    let confirm: Arc<dyn ConfirmGate> = if cli.yes || !cfg.executor.require_confirmation {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(TtyConfirm)
    };
    let runner = ProcessRunner::new(confirm);
    let engine = Orchestrator::new(llm.clone(), registry, positional, runner, &cfg);

    if cli.info {
        let reply = llm
            .complete(&[Message::user(prompt::info_prompt())])
            .await
            .map_err(anyhow::Error::msg)
            .context("Proposer request failed")?;
        println!("{}", reply);
    } else if let Some(pair) = cli.cmd {
        let outcome = engine.run_tool(&pair[0], &pair[1]).await?;
        report(outcome);
    } else if let Some(query) = cli.execute {
        let outcome = engine.execute(&query).await?;
        report(outcome);
    } else if let Some(query) = cli.generate {
        generate_program(llm.as_ref(), &query).await?;
    } else {
        Cli::command().print_help()?;
    }

    Ok(())
}

/// 把一次运行的终态汇报给操作员
fn report(outcome: RunOutcome) {
    match outcome {
        RunOutcome::Succeeded {
            explanation,
            attempts_used,
            ..
        } => {
            tracing::info!(attempts = attempts_used, "trace completed");
            if let Some(explanation) = explanation {
                println!("AI explanation:\n{}", explanation);
            }
        }
        RunOutcome::Saved { filename } => {
            println!("Content saved to {}", filename);
        }
        RunOutcome::Answered(text) => {
            println!("{}", text);
        }
        RunOutcome::Exhausted {
            last_result,
            attempts_used,
        } => {
            println!("Retry times exceeded ({} attempts)...", attempts_used);
            if let Some(result) = last_result {
                println!("Last command: {}", result.command);
                println!("Last stderr: {}", result.stderr.trim());
            }
        }
    }
}

/// -g 模式：请求 eBPF 程序文本，提取围栏代码块写入 generated.bpf.c
async fn generate_program(llm: &dyn LlmClient, query: &str) -> anyhow::Result<()> {
    println!("Sending query to the proposer: {}", query);
    let response = llm
        .complete(&[Message::user(prompt::generate_prompt(query))])
        .await
        .map_err(anyhow::Error::msg)
        .context("Proposer request failed")?;
    let blocks = extract_code_blocks(&response);
    if blocks.is_empty() {
        println!(
            "It seems the proposer did not generate an eBPF program; it replied:\n{}",
            response
        );
        return Ok(());
    }
    std::fs::write("generated.bpf.c", blocks.concat())
        .context("Failed to write generated.bpf.c")?;
    println!("Program written to generated.bpf.c");
    Ok(())
}
