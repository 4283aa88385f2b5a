//! DirectX 12 根签名设备
//!
//! 将 `RootSignatureDesc` 转换为 `D3D12_ROOT_SIGNATURE_DESC`，
//! 经 `D3D12SerializeRootSignature` 序列化后由 `ID3D12Device::CreateRootSignature` 创建。

use windows::{
    Win32::Graphics::Direct3D::*, Win32::Graphics::Direct3D12::*,
};

use crate::core::error::NativeCreationError;
use crate::root_signature::{
    ParameterVisibility, RootParameter, RootSignatureDesc, RootSignatureDevice,
};
use crate::shader::BindingKind;

/// D3D12 设备
pub struct Dx12Device {
    device: ID3D12Device,
}

// ID3D12Device 是自由线程对象
unsafe impl Send for Dx12Device {}
unsafe impl Sync for Dx12Device {}

impl Dx12Device {
    /// 包装已有设备
    pub fn new(device: ID3D12Device) -> Self {
        Self { device }
    }

    /// 在默认适配器上创建设备（特性级别 11_0）
    pub fn create_default() -> Result<Self, NativeCreationError> {
        let mut device: Option<ID3D12Device> = None;
        unsafe {
            D3D12CreateDevice(None, D3D_FEATURE_LEVEL_11_0, &mut device).map_err(|e| {
                NativeCreationError::Device(format!("Failed to create D3D12 device: {:?}", e))
            })?;
        }
        let device = device.ok_or_else(|| {
            NativeCreationError::Device("D3D12CreateDevice returned no device".to_string())
        })?;

        crate::cache_debug!("D3D12 device created");
        Ok(Self { device })
    }

    pub fn raw(&self) -> &ID3D12Device {
        &self.device
    }
}

/// D3D12 根签名对象
pub struct Dx12RootSignature {
    root_signature: ID3D12RootSignature,
}

unsafe impl Send for Dx12RootSignature {}
unsafe impl Sync for Dx12RootSignature {}

impl Dx12RootSignature {
    pub fn raw(&self) -> &ID3D12RootSignature {
        &self.root_signature
    }
}

fn range_type(kind: BindingKind) -> D3D12_DESCRIPTOR_RANGE_TYPE {
    match kind {
        BindingKind::ConstantBuffer => D3D12_DESCRIPTOR_RANGE_TYPE_CBV,
        BindingKind::ReadOnlyResource => D3D12_DESCRIPTOR_RANGE_TYPE_SRV,
        BindingKind::ReadWriteResource => D3D12_DESCRIPTOR_RANGE_TYPE_UAV,
        BindingKind::Sampler => D3D12_DESCRIPTOR_RANGE_TYPE_SAMPLER,
    }
}

fn shader_visibility(visibility: ParameterVisibility) -> D3D12_SHADER_VISIBILITY {
    match visibility {
        ParameterVisibility::All => D3D12_SHADER_VISIBILITY_ALL,
        ParameterVisibility::Vertex => D3D12_SHADER_VISIBILITY_VERTEX,
        ParameterVisibility::Hull => D3D12_SHADER_VISIBILITY_HULL,
        ParameterVisibility::Domain => D3D12_SHADER_VISIBILITY_DOMAIN,
        ParameterVisibility::Geometry => D3D12_SHADER_VISIBILITY_GEOMETRY,
        ParameterVisibility::Pixel => D3D12_SHADER_VISIBILITY_PIXEL,
    }
}

fn root_descriptor_type(kind: BindingKind) -> Result<D3D12_ROOT_PARAMETER_TYPE, NativeCreationError> {
    match kind {
        BindingKind::ConstantBuffer => Ok(D3D12_ROOT_PARAMETER_TYPE_CBV),
        BindingKind::ReadOnlyResource => Ok(D3D12_ROOT_PARAMETER_TYPE_SRV),
        BindingKind::ReadWriteResource => Ok(D3D12_ROOT_PARAMETER_TYPE_UAV),
        BindingKind::Sampler => Err(NativeCreationError::InvalidDescription(
            "samplers cannot be bound as root descriptors".to_string(),
        )),
    }
}

impl RootSignatureDevice for Dx12Device {
    type RootSignature = Dx12RootSignature;

    fn name(&self) -> &'static str {
        "dx12"
    }

    fn create_root_signature(
        &self,
        desc: &RootSignatureDesc,
    ) -> Result<Dx12RootSignature, NativeCreationError> {
        // 范围数组必须在序列化期间保持存活
        let ranges: Vec<Vec<D3D12_DESCRIPTOR_RANGE>> = desc
            .parameters
            .iter()
            .map(|parameter| match parameter {
                RootParameter::DescriptorTable { ranges, .. } => {
                    let mut offset = 0u32;
                    ranges
                        .iter()
                        .map(|range| {
                            let native = D3D12_DESCRIPTOR_RANGE {
                                RangeType: range_type(range.kind),
                                NumDescriptors: range.count,
                                BaseShaderRegister: range.base_register,
                                RegisterSpace: range.space,
                                OffsetInDescriptorsFromTableStart: offset,
                            };
                            offset = offset.saturating_add(range.count);
                            native
                        })
                        .collect()
                }
                RootParameter::RootDescriptor { .. } => Vec::new(),
            })
            .collect();

        let mut parameters = Vec::with_capacity(desc.parameters.len());
        for (parameter, ranges) in desc.parameters.iter().zip(&ranges) {
            let native = match parameter {
                RootParameter::DescriptorTable { visibility, .. } => D3D12_ROOT_PARAMETER {
                    ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
                    Anonymous: D3D12_ROOT_PARAMETER_0 {
                        DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE {
                            NumDescriptorRanges: ranges.len() as u32,
                            pDescriptorRanges: ranges.as_ptr(),
                        },
                    },
                    ShaderVisibility: shader_visibility(*visibility),
                },
                RootParameter::RootDescriptor { kind, register, space, visibility } => {
                    D3D12_ROOT_PARAMETER {
                        ParameterType: root_descriptor_type(*kind)?,
                        Anonymous: D3D12_ROOT_PARAMETER_0 {
                            Descriptor: D3D12_ROOT_DESCRIPTOR {
                                ShaderRegister: *register,
                                RegisterSpace: *space,
                            },
                        },
                        ShaderVisibility: shader_visibility(*visibility),
                    }
                }
            };
            parameters.push(native);
        }

        let root_desc = D3D12_ROOT_SIGNATURE_DESC {
            NumParameters: parameters.len() as u32,
            pParameters: parameters.as_ptr(),
            NumStaticSamplers: 0,
            pStaticSamplers: std::ptr::null(),
            Flags: D3D12_ROOT_SIGNATURE_FLAGS(desc.flags.bits() as i32),
        };

        unsafe {
            let mut signature: Option<ID3DBlob> = None;
            let mut error_blob: Option<ID3DBlob> = None;
            let serialized = D3D12SerializeRootSignature(
                &root_desc,
                D3D_ROOT_SIGNATURE_VERSION_1,
                &mut signature,
                Some(&mut error_blob),
            );

            if let Err(e) = serialized {
                let message = match error_blob {
                    Some(error) => {
                        let bytes = std::slice::from_raw_parts(
                            error.GetBufferPointer() as *const u8,
                            error.GetBufferSize(),
                        );
                        String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()
                    }
                    None => format!("{:?}", e),
                };
                return Err(NativeCreationError::Serialize(message));
            }

            let signature = signature.ok_or_else(|| {
                NativeCreationError::Serialize("serializer returned no blob".to_string())
            })?;

            let root_signature: ID3D12RootSignature = self
                .device
                .CreateRootSignature(
                    0,
                    std::slice::from_raw_parts(
                        signature.GetBufferPointer() as *const u8,
                        signature.GetBufferSize(),
                    ),
                )
                .map_err(|e| {
                    NativeCreationError::Device(format!("Failed to create root signature: {:?}", e))
                })?;

            Ok(Dx12RootSignature { root_signature })
        }
    }
}
