//! 日志系统模块
//!
//! 基于 `tracing` 提供结构化的日志记录功能。
//!
//! 库内部只通过 `tracing` 宏发出事件，是否输出由调用方安装的 subscriber 决定。
//! 缓存相关事件使用 `dist_rootsig::cache` 目标，检查工具使用 `dist_rootsig::app`。
//!
//! # 使用示例
//!
//! ```no_run
//! use dist_rootsig::core::{log, LogLevel};
//!
//! log::init_logger(LogLevel::Debug, false, None).unwrap();
//! dist_rootsig::app_info!(shaders = 2, "Inspecting shader set");
//! ```

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::path::Path;

use super::config::LogLevel;
use super::error::{Result, RootSigError};

/// 初始化日志系统
///
/// 只能成功调用一次；重复初始化返回 `RootSigError::Log`。
///
/// # 参数
///
/// * `level` - 日志级别
/// * `file_output` - 是否输出到文件
/// * `log_file_path` - 日志文件路径（可选，默认为 "dist_rootsig.log"）
pub fn init_logger(level: LogLevel, file_output: bool, log_file_path: Option<&str>) -> Result<()> {
    let filter = EnvFilter::new(level.directive());

    let result = if file_output {
        let log_path = log_file_path.unwrap_or("dist_rootsig.log");
        let path = Path::new(log_path);
        let directory = path.parent().unwrap_or(Path::new("."));
        let filename = path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("dist_rootsig.log");

        // 每天滚动
        let file_appender = RollingFileAppender::new(
            Rotation::DAILY,
            directory,
            filename
        );

        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_ansi(true);

        let file_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
    };

    result.map_err(|e| RootSigError::Log(e.to_string()))
}

impl LogLevel {
    /// `EnvFilter` 指令文本
    pub fn directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 缓存日志 - Debug 级别
#[macro_export]
macro_rules! cache_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "dist_rootsig::cache", $($arg)*)
    };
}

/// 缓存日志 - Trace 级别
#[macro_export]
macro_rules! cache_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "dist_rootsig::cache", $($arg)*)
    };
}

/// 缓存日志 - Warn 级别
#[macro_export]
macro_rules! cache_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "dist_rootsig::cache", $($arg)*)
    };
}

/// 应用层日志 - Info 级别
#[macro_export]
macro_rules! app_info {
    ($($arg:tt)*) => {
        tracing::info!(target: "dist_rootsig::app", $($arg)*)
    };
}

/// 应用层日志 - Error 级别
#[macro_export]
macro_rules! app_error {
    ($($arg:tt)*) => {
        tracing::error!(target: "dist_rootsig::app", $($arg)*)
    };
}

/// 日志级别转换
impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
    }

    #[test]
    fn test_directive() {
        assert_eq!(LogLevel::Warn.directive(), "warn");
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("verbose"), None);
    }
}
