//! 错误处理模块
//!
//! 定义了根签名缓存中使用的统一错误类型。
//!
//! # 错误分类
//!
//! - `ReflectionError`：着色器字节码无法解析，或包含无法识别的资源绑定类型
//! - `LayoutConflictError`：同名绑定在不同阶段被声明为不同的资源类型
//! - `NativeCreationError`：设备拒绝根签名描述（超出限制、寄存器重叠等）
//!
//! 所有错误都同步返回给 `create_root_signature` 的调用者，不做自动重试，
//! 也不会在缓存中留下任何部分状态。

use std::fmt;

use crate::shader::{BindingKind, ShaderStage};

/// 统一的 Result 类型
pub type Result<T> = std::result::Result<T, RootSigError>;

/// 根签名子系统的错误类型
#[derive(Debug)]
pub enum RootSigError {
    /// 配置错误
    Config(ConfigError),

    /// 着色器反射错误
    Reflection(ReflectionError),

    /// 绑定布局冲突
    LayoutConflict(LayoutConflictError),

    /// 设备创建根签名失败
    NativeCreation(NativeCreationError),

    /// IO 错误
    Io(std::io::Error),

    /// 日志系统错误
    Log(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 着色器反射错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectionError {
    /// 字节码不是合法的着色器容器
    InvalidContainer(String),

    /// 读取越界
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// 缺少必需的数据块
    MissingChunk(&'static str),

    /// 资源名无效（未以 NUL 结尾或不是 UTF-8）
    InvalidName { offset: usize },

    /// 无法映射到四种绑定类型之一的资源
    UnsupportedInputType { name: String, input_type: u32 },

    /// 平台反射接口返回的错误
    Backend(String),
}

/// 同名绑定的资源类型冲突
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutConflictError {
    /// 绑定名
    pub name: String,
    /// 先前登记的类型
    pub existing: BindingKind,
    /// 冲突的类型
    pub conflicting: BindingKind,
    /// 引入冲突的着色器阶段
    pub stage: ShaderStage,
}

/// 设备创建根签名失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCreationError {
    /// 描述本身不合法
    InvalidDescription(String),

    /// 根签名开销超出上限（以 DWORD 计）
    CostExceeded { cost: u32, limit: u32 },

    /// 同一寄存器被多个对同一阶段可见的参数占用
    OverlappingRegisters {
        class: char,
        space: u32,
        register: u32,
    },

    /// 序列化失败
    Serialize(String),

    /// 设备调用失败
    Device(String),
}

impl fmt::Display for RootSigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootSigError::Config(e) => write!(f, "Configuration error: {}", e),
            RootSigError::Reflection(e) => write!(f, "Reflection error: {}", e),
            RootSigError::LayoutConflict(e) => write!(f, "Layout conflict: {}", e),
            RootSigError::NativeCreation(e) => write!(f, "Root signature creation failed: {}", e),
            RootSigError::Io(e) => write!(f, "IO error: {}", e),
            RootSigError::Log(msg) => write!(f, "Log error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for ReflectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectionError::InvalidContainer(msg) => write!(f, "Invalid shader container: {}", msg),
            ReflectionError::Truncated { offset, needed, available } => write!(
                f,
                "Unexpected end of bytecode at offset {} (need {} bytes, have {})",
                offset, needed, available
            ),
            ReflectionError::MissingChunk(fourcc) => write!(f, "Missing {} chunk", fourcc),
            ReflectionError::InvalidName { offset } => {
                write!(f, "Invalid resource name at offset {}", offset)
            }
            ReflectionError::UnsupportedInputType { name, input_type } => write!(
                f,
                "Resource '{}' has unsupported input type {}",
                name, input_type
            ),
            ReflectionError::Backend(msg) => write!(f, "Reflection backend error: {}", msg),
        }
    }
}

impl fmt::Display for LayoutConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "binding '{}' declared as {} in {} but already bound as {}",
            self.name,
            self.conflicting.name(),
            self.stage.name(),
            self.existing.name()
        )
    }
}

impl fmt::Display for NativeCreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeCreationError::InvalidDescription(msg) => {
                write!(f, "Invalid root signature description: {}", msg)
            }
            NativeCreationError::CostExceeded { cost, limit } => write!(
                f,
                "Root signature cost {} exceeds the limit of {} DWORDs",
                cost, limit
            ),
            NativeCreationError::OverlappingRegisters { class, space, register } => write!(
                f,
                "Register {}{} (space {}) is bound by more than one parameter",
                class, register, space
            ),
            NativeCreationError::Serialize(msg) => {
                write!(f, "Failed to serialize root signature: {}", msg)
            }
            NativeCreationError::Device(msg) => write!(f, "Device error: {}", msg),
        }
    }
}

impl std::error::Error for RootSigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RootSigError::Config(e) => Some(e),
            RootSigError::Reflection(e) => Some(e),
            RootSigError::LayoutConflict(e) => Some(e),
            RootSigError::NativeCreation(e) => Some(e),
            RootSigError::Io(e) => Some(e),
            RootSigError::Log(_) => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for ReflectionError {}
impl std::error::Error for LayoutConflictError {}
impl std::error::Error for NativeCreationError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for RootSigError {
    fn from(err: std::io::Error) -> Self {
        RootSigError::Io(err)
    }
}

impl From<ConfigError> for RootSigError {
    fn from(err: ConfigError) -> Self {
        RootSigError::Config(err)
    }
}

impl From<ReflectionError> for RootSigError {
    fn from(err: ReflectionError) -> Self {
        RootSigError::Reflection(err)
    }
}

impl From<LayoutConflictError> for RootSigError {
    fn from(err: LayoutConflictError) -> Self {
        RootSigError::LayoutConflict(err)
    }
}

impl From<NativeCreationError> for RootSigError {
    fn from(err: NativeCreationError) -> Self {
        RootSigError::NativeCreation(err)
    }
}
