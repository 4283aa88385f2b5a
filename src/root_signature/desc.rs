//! 根签名描述
//!
//! 与图形 API 无关的根签名结构，设备实现负责将其转换为原生对象。
//!
//! - 描述符表：每种绑定类型的每种可见性一个，表内每个绑定一个范围
//! - 根描述符：直接以 GPU 地址绑定的只读资源，不经过描述符表
//!
//! 开销按 D3D12 规则计算：描述符表 1 DWORD，根描述符 2 DWORD，上限 64。

use bitflags::bitflags;

use crate::shader::{BindingKind, ShaderVisibility};

/// 根签名总开销上限（DWORD）
pub const MAX_ROOT_SIGNATURE_COST: u32 = 64;

bitflags! {
    /// 根签名标志，取值与 D3D12_ROOT_SIGNATURE_FLAGS 一致
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct RootSignatureFlags: u32 {
        const ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT = 0x1;
        const DENY_VERTEX_SHADER_ROOT_ACCESS = 0x2;
        const DENY_HULL_SHADER_ROOT_ACCESS = 0x4;
        const DENY_DOMAIN_SHADER_ROOT_ACCESS = 0x8;
        const DENY_GEOMETRY_SHADER_ROOT_ACCESS = 0x10;
        const DENY_PIXEL_SHADER_ROOT_ACCESS = 0x20;
    }
}

/// 根参数可见性，对应 D3D12_SHADER_VISIBILITY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterVisibility {
    All,
    Vertex,
    Hull,
    Domain,
    Geometry,
    Pixel,
}

impl ParameterVisibility {
    /// 同类型描述符表的生成顺序
    pub const TABLE_ORDER: [ParameterVisibility; 6] = [
        ParameterVisibility::All,
        ParameterVisibility::Vertex,
        ParameterVisibility::Hull,
        ParameterVisibility::Domain,
        ParameterVisibility::Geometry,
        ParameterVisibility::Pixel,
    ];

    /// 由阶段集合推导
    ///
    /// 只有一个图形阶段使用时收窄为该阶段，否则（多个阶段或计算着色器）为 `All`。
    pub fn from_stages(stages: ShaderVisibility) -> Self {
        if stages == ShaderVisibility::VERTEX {
            ParameterVisibility::Vertex
        } else if stages == ShaderVisibility::PIXEL {
            ParameterVisibility::Pixel
        } else if stages == ShaderVisibility::GEOMETRY {
            ParameterVisibility::Geometry
        } else if stages == ShaderVisibility::DOMAIN {
            ParameterVisibility::Domain
        } else if stages == ShaderVisibility::HULL {
            ParameterVisibility::Hull
        } else {
            ParameterVisibility::All
        }
    }

    /// 两个参数是否对同一阶段可见
    pub fn overlaps(&self, other: ParameterVisibility) -> bool {
        *self == ParameterVisibility::All || other == ParameterVisibility::All || *self == other
    }
}

/// 描述符表中的一个范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorRange {
    pub kind: BindingKind,
    pub base_register: u32,
    pub space: u32,
    pub count: u32,
    /// 对应 `BindingLayout::bindings` 中的下标
    pub binding_index: usize,
}

impl DescriptorRange {
    /// 最后一个寄存器（含）
    pub fn last_register(&self) -> u32 {
        self.base_register.saturating_add(self.count.saturating_sub(1))
    }
}

/// 根参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootParameter {
    /// 描述符表
    DescriptorTable {
        kind: BindingKind,
        ranges: Vec<DescriptorRange>,
        visibility: ParameterVisibility,
    },
    /// 根描述符
    RootDescriptor {
        kind: BindingKind,
        register: u32,
        space: u32,
        visibility: ParameterVisibility,
    },
}

impl RootParameter {
    /// 以 DWORD 计的开销
    pub fn cost(&self) -> u32 {
        match self {
            RootParameter::DescriptorTable { .. } => 1,
            RootParameter::RootDescriptor { .. } => 2,
        }
    }

    pub fn visibility(&self) -> ParameterVisibility {
        match self {
            RootParameter::DescriptorTable { visibility, .. }
            | RootParameter::RootDescriptor { visibility, .. } => *visibility,
        }
    }

    pub fn kind(&self) -> BindingKind {
        match self {
            RootParameter::DescriptorTable { kind, .. }
            | RootParameter::RootDescriptor { kind, .. } => *kind,
        }
    }
}

/// 根签名描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSignatureDesc {
    pub parameters: Vec<RootParameter>,
    pub flags: RootSignatureFlags,
}

impl RootSignatureDesc {
    /// 总开销（DWORD）
    pub fn cost(&self) -> u32 {
        self.parameters.iter().map(RootParameter::cost).sum()
    }

    /// 根描述符参数的下标
    pub fn root_descriptor_index(&self) -> Option<u32> {
        self.parameters
            .iter()
            .position(|p| matches!(p, RootParameter::RootDescriptor { .. }))
            .map(|i| i as u32)
    }
}
