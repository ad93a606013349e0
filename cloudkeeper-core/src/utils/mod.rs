//! 工具模块

pub mod datetime;
pub mod retry;

pub use retry::{with_retry, RetryPolicy};
