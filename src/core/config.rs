//! 配置管理模块
//!
//! 提供根签名缓存的配置加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [device]
//! backend = "headless"  # 或 "dx12"
//!
//! [root_signature]
//! raw_binding = true
//! raw_register = 0
//! raw_space = 1
//! deny_unused_stage_access = false
//!
//! [logging]
//! level = "info"        # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};

/// D3D12 为系统保留的寄存器空间起点
pub const RESERVED_REGISTER_SPACE_START: u32 = 0xFFFF_FFF0;

/// 全局配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 设备配置
    #[serde(default)]
    pub device: DeviceConfig,

    /// 根签名配置
    #[serde(default)]
    pub root_signature: RootSignatureConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 设备配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// 用于实际创建根签名对象的后端
    #[serde(default = "default_backend")]
    pub backend: DeviceBackend,
}

/// 设备后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBackend {
    /// 无 GPU 的校验设备，任何平台可用
    Headless,
    /// DirectX 12 设备（仅 Windows）
    Dx12,
}

/// 根签名构建配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSignatureConfig {
    /// 是否在根签名末尾追加一个只读根描述符（例如加速结构地址）
    #[serde(default = "default_raw_binding")]
    pub raw_binding: bool,

    /// 根描述符的寄存器编号 (t#)
    #[serde(default)]
    pub raw_register: u32,

    /// 根描述符的寄存器空间
    #[serde(default = "default_raw_space")]
    pub raw_space: u32,

    /// 图形根签名中为未使用的阶段添加 DENY_*_SHADER_ROOT_ACCESS
    #[serde(default)]
    pub deny_unused_stage_access: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_backend() -> DeviceBackend { DeviceBackend::Headless }
fn default_raw_binding() -> bool { true }
fn default_raw_space() -> u32 { 1 }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "dist_rootsig.log".to_string() }

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

impl Default for RootSignatureConfig {
    fn default() -> Self {
        Self {
            raw_binding: default_raw_binding(),
            raw_register: 0,
            raw_space: default_raw_space(),
            deny_unused_stage_access: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use dist_rootsig::core::Config;
    ///
    /// let config = Config::from_file("config.toml")?;
    /// # Ok::<(), dist_rootsig::core::RootSigError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--dx12` / `--headless`: 选择设备后端
    /// - `--log-level <level>`: 设置日志级别
    /// - `--raw-register <value>` / `--raw-space <value>`: 根描述符位置
    /// - `--no-raw-binding`: 不追加根描述符
    /// - `--deny-unused-stages`: 屏蔽未使用阶段的根访问
    ///
    /// 无法解析的值会被忽略，保留原配置。
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if args.iter().any(|a| a == "--dx12") {
            self.device.backend = DeviceBackend::Dx12;
        }

        if args.iter().any(|a| a == "--headless") {
            self.device.backend = DeviceBackend::Headless;
        }

        if args.iter().any(|a| a == "--no-raw-binding") {
            self.root_signature.raw_binding = false;
        }

        if args.iter().any(|a| a == "--deny-unused-stages") {
            self.root_signature.deny_unused_stage_access = true;
        }

        if let Some(value) = value_after(&args, "--raw-register").and_then(|v| v.parse().ok()) {
            self.root_signature.raw_register = value;
        }

        if let Some(value) = value_after(&args, "--raw-space").and_then(|v| v.parse().ok()) {
            self.root_signature.raw_space = value;
        }

        if let Some(level) = value_after(&args, "--log-level").and_then(LogLevel::parse) {
            self.logging.level = level;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.root_signature.raw_binding
            && self.root_signature.raw_space >= RESERVED_REGISTER_SPACE_START
        {
            return Err(ConfigError::InvalidValue {
                field: "root_signature.raw_space".to_string(),
                reason: format!(
                    "Register spaces 0x{:08X} and above are reserved",
                    RESERVED_REGISTER_SPACE_START
                ),
            }.into());
        }

        if self.device.backend == DeviceBackend::Dx12 && !cfg!(target_os = "windows") {
            return Err(ConfigError::InvalidValue {
                field: "device.backend".to_string(),
                reason: "DX12 backend is only available on Windows".to_string(),
            }.into());
        }

        Ok(())
    }
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).map(String::as_str)
}

impl DeviceBackend {
    /// 获取后端名称
    pub fn name(&self) -> &'static str {
        match self {
            DeviceBackend::Headless => "headless",
            DeviceBackend::Dx12 => "DirectX 12",
        }
    }
}

impl LogLevel {
    /// 从命令行文本解析日志级别
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}
