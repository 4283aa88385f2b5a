//! 根签名模块
//!
//! 从着色器反射结果生成根签名，并按着色器内容去重缓存。
//!
//! # 模块结构
//!
//! - `fingerprint`：缓存键
//! - `layout`：跨阶段合并绑定，生成根签名描述
//! - `desc`：与 API 无关的根签名描述
//! - `device`：`RootSignatureDevice` 接口与无 GPU 的校验设备
//! - `manager`：带引用计数的实例缓存
//! - `handle`：调用方持有的句柄
//!
//! # 使用示例
//!
//! ```no_run
//! use dist_rootsig::core::RootSignatureConfig;
//! use dist_rootsig::root_signature::{
//!     GraphicsShaders, HeadlessDevice, RootSignatureCreateDesc, RootSignatureManager,
//! };
//! use dist_rootsig::shader::{DxbcReflector, Shader, ShaderStage};
//!
//! # fn main() -> dist_rootsig::core::Result<()> {
//! let vs = Shader::from_file(ShaderStage::Vertex, "shaders/basic_vs.cso")?;
//! let ps = Shader::from_file(ShaderStage::Pixel, "shaders/basic_ps.cso")?;
//!
//! let manager = RootSignatureManager::new(
//!     HeadlessDevice::new(),
//!     DxbcReflector,
//!     RootSignatureConfig::default(),
//! );
//! let desc = RootSignatureCreateDesc::graphics(GraphicsShaders::new(&vs).pixel(&ps));
//! let handle = manager.create_root_signature(&desc)?;
//! println!("{:?}", handle.slot_locations("gAlbedo"));
//! # Ok(())
//! # }
//! ```

pub mod fingerprint;
pub mod desc;
pub mod layout;
pub mod device;
pub mod manager;
pub mod handle;

pub use desc::{
    DescriptorRange, ParameterVisibility, RootParameter, RootSignatureDesc, RootSignatureFlags,
    MAX_ROOT_SIGNATURE_COST,
};
pub use device::{HeadlessDevice, HeadlessRootSignature, RootSignatureDevice};
pub use fingerprint::Fingerprint;
pub use handle::RootSignatureHandle;
pub use layout::{
    BindingLayout, GraphicsShaders, LayoutBuilder, RootBinding, RootSignatureCreateDesc,
    SlotLocation,
};
pub use manager::{RootSignatureCacheStats, RootSignatureInstance, RootSignatureManager};
