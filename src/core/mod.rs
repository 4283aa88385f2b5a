//! 核心功能模块
//!
//! 提供与图形 API 无关的基础设施：日志、配置和错误处理。
//!
//! # 模块组织
//!
//! - `log`：日志系统，基于 `tracing`
//! - `config`：配置管理，支持从 TOML 文件加载
//! - `error`：错误处理，定义统一的错误类型

pub mod log;
pub mod config;
pub mod error;

// 重新导出常用类型，方便使用
pub use config::{Config, DeviceBackend, LogLevel, RootSignatureConfig};
pub use error::{
    ConfigError, LayoutConflictError, NativeCreationError, ReflectionError, Result, RootSigError,
};
