//! 命令层：参数分类与命令向量构建

pub mod builder;

pub use builder::{build, CommandVector};
