//! 图形后端模块
//!
//! 根签名设备与反射器的原生实现。目前只有 DirectX 12（仅 Windows）；
//! 其他平台使用 `root_signature::HeadlessDevice` 和 `shader::DxbcReflector`。

pub mod dx12;

pub use dx12::{D3dReflector, Dx12Device, Dx12RootSignature};
