//! 执行层：确认门与受控子进程执行

pub mod confirm;
pub mod runner;

pub use confirm::{AutoConfirm, ConfirmGate, TtyConfirm};
pub use runner::{ExecutionResult, ProcessRunner};
