//! dist_rootsig - 根签名生成与缓存
//!
//! 根据已编译着色器的资源绑定反射结果自动生成根签名，
//! 并按参与着色器的字节码内容去重、引用计数。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（日志、配置、错误处理）
//! - `shader`: 着色器对象、CRC-32 指纹与绑定反射
//! - `root_signature`: 布局合并、根签名描述、设备抽象与实例缓存
//! - `gfx`: DirectX 12 设备与反射器（仅 Windows）
//!
//! # 使用示例
//!
//! ```no_run
//! use dist_rootsig::core::RootSignatureConfig;
//! use dist_rootsig::root_signature::{HeadlessDevice, RootSignatureCreateDesc, RootSignatureManager};
//! use dist_rootsig::shader::{DxbcReflector, Shader, ShaderStage};
//!
//! let cs = Shader::from_file(ShaderStage::Compute, "blur_cs.cso").unwrap();
//! let manager = RootSignatureManager::new(
//!     HeadlessDevice::new(),
//!     DxbcReflector,
//!     RootSignatureConfig::default(),
//! );
//!
//! // 相同字节码的第二次创建命中缓存
//! let a = manager.create_root_signature(&RootSignatureCreateDesc::compute(&cs)).unwrap();
//! let b = manager.create_root_signature(&RootSignatureCreateDesc::compute(&cs)).unwrap();
//! assert_eq!(a.fingerprint(), b.fingerprint());
//! assert_eq!(manager.len(), 1);
//! ```

pub mod core;
pub mod shader;
pub mod root_signature;
#[cfg(target_os = "windows")]
pub mod gfx;

#[cfg(test)]
mod test_util;

pub use crate::core::{Config, Result, RootSigError};
pub use root_signature::{
    Fingerprint, GraphicsShaders, RootSignatureCreateDesc, RootSignatureHandle,
    RootSignatureManager,
};
pub use shader::{Shader, ShaderStage};
