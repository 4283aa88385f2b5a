//! DirectX 12 实现
//!
//! - `Dx12Device`：通过 D3D12 创建原生根签名
//! - `D3dReflector`：通过 `D3DReflect` 反射着色器绑定

pub mod device;
pub mod reflection;

pub use device::{Dx12Device, Dx12RootSignature};
pub use reflection::D3dReflector;
