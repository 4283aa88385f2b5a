//! 着色器模块
//!
//! 着色器对象、阶段与可见性定义，以及指纹计算和资源绑定反射。
//!
//! - `crc`：CRC-32 内容指纹
//! - `reflect`：`ShaderReflector` 接口与绑定类型映射
//! - `dxbc`：纯 Rust 实现的 DXBC 容器 / RDEF 反射器

pub mod crc;
pub mod reflect;
pub mod dxbc;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bitflags::bitflags;

use crate::core::error::Result;

pub use dxbc::DxbcReflector;
pub use reflect::{BindingKind, ShaderInputBinding, ShaderReflector};

bitflags! {
    /// 绑定对哪些着色器阶段可见
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ShaderVisibility: u32 {
        const VERTEX = 1 << 0;
        const PIXEL = 1 << 1;
        const GEOMETRY = 1 << 2;
        const DOMAIN = 1 << 3;
        const HULL = 1 << 4;
        const COMPUTE = 1 << 5;

        const ALL_GRAPHICS = Self::VERTEX.bits()
            | Self::PIXEL.bits()
            | Self::GEOMETRY.bits()
            | Self::DOMAIN.bits()
            | Self::HULL.bits();
    }
}

impl Default for ShaderVisibility {
    fn default() -> Self {
        ShaderVisibility::empty()
    }
}

/// 着色器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Geometry,
    Domain,
    Hull,
    Compute,
}

impl ShaderStage {
    /// 图形管线阶段的固定顺序，指纹计算依赖该顺序
    pub const GRAPHICS_ORDER: [ShaderStage; 5] = [
        ShaderStage::Vertex,
        ShaderStage::Pixel,
        ShaderStage::Geometry,
        ShaderStage::Domain,
        ShaderStage::Hull,
    ];

    /// 该阶段对应的可见性位
    pub fn visibility(&self) -> ShaderVisibility {
        match self {
            ShaderStage::Vertex => ShaderVisibility::VERTEX,
            ShaderStage::Pixel => ShaderVisibility::PIXEL,
            ShaderStage::Geometry => ShaderVisibility::GEOMETRY,
            ShaderStage::Domain => ShaderVisibility::DOMAIN,
            ShaderStage::Hull => ShaderVisibility::HULL,
            ShaderStage::Compute => ShaderVisibility::COMPUTE,
        }
    }

    /// 阶段名称
    pub fn name(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Pixel => "pixel",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Domain => "domain",
            ShaderStage::Hull => "hull",
            ShaderStage::Compute => "compute",
        }
    }

    /// 解析 `vs`/`ps`/`gs`/`ds`/`hs`/`cs` 缩写
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name {
            "vs" => Some(ShaderStage::Vertex),
            "ps" => Some(ShaderStage::Pixel),
            "gs" => Some(ShaderStage::Geometry),
            "ds" => Some(ShaderStage::Domain),
            "hs" => Some(ShaderStage::Hull),
            "cs" => Some(ShaderStage::Compute),
            _ => None,
        }
    }
}

/// 已编译的着色器
///
/// 只持有字节码和阶段标记；字节码通过 `Arc` 共享，克隆开销很小。
#[derive(Clone)]
pub struct Shader {
    stage: ShaderStage,
    bytecode: Arc<[u8]>,
    name: Option<String>,
}

impl Shader {
    /// 从内存中的字节码创建
    pub fn from_bytecode(stage: ShaderStage, bytecode: impl Into<Vec<u8>>) -> Self {
        Self {
            stage,
            bytecode: Arc::from(bytecode.into()),
            name: None,
        }
    }

    /// 从已编译的着色器文件（.cso / .dxbc）加载
    pub fn from_file<P: AsRef<Path>>(stage: ShaderStage, path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytecode = std::fs::read(path)?;
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        Ok(Self {
            stage,
            bytecode: Arc::from(bytecode),
            name,
        })
    }

    /// 设置调试名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("stage", &self.stage)
            .field("size", &self.bytecode.len())
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_visibility() {
        assert_eq!(ShaderStage::Hull.visibility(), ShaderVisibility::HULL);
        assert!(ShaderVisibility::ALL_GRAPHICS.contains(ShaderVisibility::DOMAIN));
        assert!(!ShaderVisibility::ALL_GRAPHICS.contains(ShaderVisibility::COMPUTE));
    }

    #[test]
    fn test_short_names() {
        assert_eq!(ShaderStage::from_short_name("ps"), Some(ShaderStage::Pixel));
        assert_eq!(ShaderStage::from_short_name("xs"), None);
    }

    #[test]
    fn test_shader_from_file() {
        let path = std::env::temp_dir().join(format!("dist_rootsig_shader_{}.cso", std::process::id()));
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let shader = Shader::from_file(ShaderStage::Compute, &path).unwrap();
        assert_eq!(shader.bytecode(), &[1, 2, 3]);
        assert_eq!(shader.stage(), ShaderStage::Compute);
        assert!(shader.name().unwrap().ends_with(".cso"));
        let _ = std::fs::remove_file(&path);

        assert!(Shader::from_file(ShaderStage::Compute, &path).is_err());
    }
}
