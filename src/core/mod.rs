//! 核心编排层：错误分类与 propose -> build -> execute 重试循环

pub mod error;
pub mod orchestrator;

pub use error::TraceError;
pub use orchestrator::{Orchestrator, RetryState, RunOutcome};
