//! 着色器资源绑定反射
//!
//! `ShaderReflector` 从已编译的字节码中列出着色器声明的外部资源绑定，
//! 每种字节码格式一个实现：
//!
//! - `DxbcReflector`：直接解析 DXBC 容器的 RDEF 块，任何平台可用
//! - `D3dReflector`：调用系统的 `D3DReflect`（仅 Windows）
//!
//! 测试中可以替换为返回固定绑定列表的假实现。

use crate::core::error::ReflectionError;

// D3D_SHADER_INPUT_TYPE
pub const SIT_CBUFFER: u32 = 0;
pub const SIT_TBUFFER: u32 = 1;
pub const SIT_TEXTURE: u32 = 2;
pub const SIT_SAMPLER: u32 = 3;
pub const SIT_UAV_RWTYPED: u32 = 4;
pub const SIT_STRUCTURED: u32 = 5;
pub const SIT_UAV_RWSTRUCTURED: u32 = 6;
pub const SIT_BYTEADDRESS: u32 = 7;
pub const SIT_UAV_RWBYTEADDRESS: u32 = 8;
pub const SIT_UAV_APPEND_STRUCTURED: u32 = 9;
pub const SIT_UAV_CONSUME_STRUCTURED: u32 = 10;
pub const SIT_UAV_RWSTRUCTURED_WITH_COUNTER: u32 = 11;
pub const SIT_RTACCELERATIONSTRUCTURE: u32 = 12;
pub const SIT_UAV_FEEDBACKTEXTURE: u32 = 13;

/// 资源绑定类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingKind {
    /// 常量缓冲 (CBV, b#)
    ConstantBuffer,
    /// 只读资源 (SRV, t#)
    ReadOnlyResource,
    /// 读写资源 (UAV, u#)
    ReadWriteResource,
    /// 采样器 (s#)
    Sampler,
}

impl BindingKind {
    /// 根签名中描述符表的固定排列顺序
    pub const TABLE_ORDER: [BindingKind; 4] = [
        BindingKind::ConstantBuffer,
        BindingKind::ReadOnlyResource,
        BindingKind::ReadWriteResource,
        BindingKind::Sampler,
    ];

    /// 获取类型名称
    pub fn name(&self) -> &'static str {
        match self {
            BindingKind::ConstantBuffer => "CBV",
            BindingKind::ReadOnlyResource => "SRV",
            BindingKind::ReadWriteResource => "UAV",
            BindingKind::Sampler => "Sampler",
        }
    }

    /// HLSL 寄存器前缀
    pub fn register_class(&self) -> char {
        match self {
            BindingKind::ConstantBuffer => 'b',
            BindingKind::ReadOnlyResource => 't',
            BindingKind::ReadWriteResource => 'u',
            BindingKind::Sampler => 's',
        }
    }

    /// 将 D3D_SHADER_INPUT_TYPE 映射为绑定类型
    ///
    /// 加速结构与反馈纹理无法放入描述符表，返回 `None`。
    pub fn from_input_type(input_type: u32) -> Option<Self> {
        match input_type {
            SIT_CBUFFER => Some(BindingKind::ConstantBuffer),
            SIT_SAMPLER => Some(BindingKind::Sampler),
            SIT_TBUFFER | SIT_TEXTURE | SIT_STRUCTURED | SIT_BYTEADDRESS => {
                Some(BindingKind::ReadOnlyResource)
            }
            SIT_UAV_RWTYPED
            | SIT_UAV_RWSTRUCTURED
            | SIT_UAV_RWBYTEADDRESS
            | SIT_UAV_APPEND_STRUCTURED
            | SIT_UAV_CONSUME_STRUCTURED
            | SIT_UAV_RWSTRUCTURED_WITH_COUNTER => Some(BindingKind::ReadWriteResource),
            _ => None,
        }
    }
}

/// 反射得到的单个资源绑定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInputBinding {
    /// 资源名
    pub name: String,
    /// 绑定类型
    pub kind: BindingKind,
    /// 寄存器编号
    pub register: u32,
    /// 寄存器空间（SM 5.1 之前恒为 0）
    pub space: u32,
    /// 数组大小，至少为 1
    pub count: u32,
}

impl ShaderInputBinding {
    pub fn new(name: impl Into<String>, kind: BindingKind, register: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            register,
            space: 0,
            count: 1,
        }
    }

    pub fn with_space(mut self, space: u32) -> Self {
        self.space = space;
        self
    }

    /// 从原始反射记录构造，完成类型映射
    pub fn from_raw(
        name: String,
        input_type: u32,
        register: u32,
        space: u32,
        bind_count: u32,
    ) -> Result<Self, ReflectionError> {
        let kind = BindingKind::from_input_type(input_type)
            .ok_or_else(|| ReflectionError::UnsupportedInputType {
                name: name.clone(),
                input_type,
            })?;

        Ok(Self {
            name,
            kind,
            register,
            space,
            // 无界数组在反射中报告为 0
            count: bind_count.max(1),
        })
    }
}

/// 着色器反射能力
///
/// 实现必须是纯函数：相同的字节码总是返回相同的绑定列表，
/// 按字节码中的声明顺序排列。
pub trait ShaderReflector: Send + Sync {
    /// 列出字节码声明的资源绑定
    fn reflect(&self, bytecode: &[u8]) -> Result<Vec<ShaderInputBinding>, ReflectionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_type_mapping() {
        assert_eq!(BindingKind::from_input_type(SIT_CBUFFER), Some(BindingKind::ConstantBuffer));
        assert_eq!(BindingKind::from_input_type(SIT_SAMPLER), Some(BindingKind::Sampler));
        assert_eq!(BindingKind::from_input_type(SIT_BYTEADDRESS), Some(BindingKind::ReadOnlyResource));
        assert_eq!(
            BindingKind::from_input_type(SIT_UAV_APPEND_STRUCTURED),
            Some(BindingKind::ReadWriteResource)
        );
        assert_eq!(
            BindingKind::from_input_type(SIT_UAV_RWSTRUCTURED_WITH_COUNTER),
            Some(BindingKind::ReadWriteResource)
        );
        assert_eq!(BindingKind::from_input_type(SIT_RTACCELERATIONSTRUCTURE), None);
        assert_eq!(BindingKind::from_input_type(SIT_UAV_FEEDBACKTEXTURE), None);
        assert_eq!(BindingKind::from_input_type(99), None);
    }

    #[test]
    fn test_from_raw() {
        let binding = ShaderInputBinding::from_raw("gTex".into(), SIT_TEXTURE, 3, 0, 0).unwrap();
        assert_eq!(binding.kind, BindingKind::ReadOnlyResource);
        assert_eq!(binding.count, 1);

        let err = ShaderInputBinding::from_raw("gScene".into(), SIT_RTACCELERATIONSTRUCTURE, 0, 0, 1)
            .unwrap_err();
        assert_eq!(
            err,
            ReflectionError::UnsupportedInputType {
                name: "gScene".into(),
                input_type: SIT_RTACCELERATIONSTRUCTURE,
            }
        );
    }
}
