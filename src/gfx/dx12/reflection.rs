//! 基于 `D3DReflect` 的着色器反射

use std::ffi::c_void;

use windows::core::Interface;
use windows::Win32::Graphics::Direct3D::Fxc::D3DReflect;
use windows::Win32::Graphics::Direct3D12::{
    ID3D12ShaderReflection, D3D12_SHADER_DESC, D3D12_SHADER_INPUT_BIND_DESC,
};

use crate::core::error::ReflectionError;
use crate::shader::{ShaderInputBinding, ShaderReflector};

/// 调用系统反射接口的反射器
#[derive(Debug, Clone, Copy, Default)]
pub struct D3dReflector;

impl D3dReflector {
    pub fn new() -> Self {
        Self
    }
}

impl ShaderReflector for D3dReflector {
    fn reflect(&self, bytecode: &[u8]) -> Result<Vec<ShaderInputBinding>, ReflectionError> {
        unsafe {
            let mut reflection: Option<ID3D12ShaderReflection> = None;
            D3DReflect(
                bytecode.as_ptr() as *const c_void,
                bytecode.len(),
                &ID3D12ShaderReflection::IID,
                &mut reflection as *mut _ as *mut *mut c_void,
            )
            .map_err(|e| ReflectionError::Backend(format!("D3DReflect failed: {:?}", e)))?;
            let reflection = reflection.ok_or_else(|| {
                ReflectionError::Backend("D3DReflect returned no interface".to_string())
            })?;

            let mut shader_desc = D3D12_SHADER_DESC::default();
            reflection
                .GetDesc(&mut shader_desc)
                .map_err(|e| ReflectionError::Backend(format!("GetDesc failed: {:?}", e)))?;

            let mut bindings = Vec::with_capacity(shader_desc.BoundResources as usize);
            for index in 0..shader_desc.BoundResources {
                let mut bind_desc = D3D12_SHADER_INPUT_BIND_DESC::default();
                reflection
                    .GetResourceBindingDesc(index, &mut bind_desc)
                    .map_err(|e| {
                        ReflectionError::Backend(format!(
                            "GetResourceBindingDesc({}) failed: {:?}",
                            index, e
                        ))
                    })?;

                let name = bind_desc
                    .Name
                    .to_string()
                    .map_err(|_| ReflectionError::Backend(format!("resource {} has a non UTF-8 name", index)))?;

                bindings.push(ShaderInputBinding::from_raw(
                    name,
                    bind_desc.Type.0 as u32,
                    bind_desc.BindPoint,
                    bind_desc.Space,
                    bind_desc.BindCount,
                )?);
            }

            Ok(bindings)
        }
    }
}
