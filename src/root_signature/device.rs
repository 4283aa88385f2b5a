//! 根签名设备抽象
//!
//! 缓存只通过 `RootSignatureDevice` 创建原生根签名；释放由原生对象的 `Drop` 完成。
//!
//! `HeadlessDevice` 不依赖任何 GPU，按 D3D12 的规则校验描述并统计存活对象，
//! 用于非 Windows 平台、命令行检查和测试。

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::error::NativeCreationError;

use super::desc::{ParameterVisibility, RootParameter, RootSignatureDesc, MAX_ROOT_SIGNATURE_COST};
use crate::shader::BindingKind;

/// 能创建原生根签名的设备
pub trait RootSignatureDevice: Send + Sync + 'static {
    /// 原生根签名对象，丢弃时释放
    type RootSignature: Send + Sync + 'static;

    /// 后端名称，用于日志
    fn name(&self) -> &'static str;

    /// 根据描述创建原生根签名
    fn create_root_signature(
        &self,
        desc: &RootSignatureDesc,
    ) -> Result<Self::RootSignature, NativeCreationError>;
}

/// 无 GPU 的校验设备
pub struct HeadlessDevice {
    next_id: AtomicU64,
    created: AtomicUsize,
    live: Arc<AtomicUsize>,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            created: AtomicUsize::new(0),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 当前存活的根签名数量
    pub fn live_objects(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// 累计创建成功的根签名数量
    pub fn created_objects(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RootSignatureDevice for HeadlessDevice {
    type RootSignature = HeadlessRootSignature;

    fn name(&self) -> &'static str {
        "headless"
    }

    fn create_root_signature(
        &self,
        desc: &RootSignatureDesc,
    ) -> Result<HeadlessRootSignature, NativeCreationError> {
        validate_desc(desc)?;

        self.created.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(HeadlessRootSignature {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            desc: desc.clone(),
            live: self.live.clone(),
        })
    }
}

/// `HeadlessDevice` 创建的根签名
pub struct HeadlessRootSignature {
    id: u64,
    desc: RootSignatureDesc,
    live: Arc<AtomicUsize>,
}

impl HeadlessRootSignature {
    /// 设备内唯一的对象编号
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 创建时使用的描述
    pub fn desc(&self) -> &RootSignatureDesc {
        &self.desc
    }
}

impl Drop for HeadlessRootSignature {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl fmt::Debug for HeadlessRootSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessRootSignature")
            .field("id", &self.id)
            .field("parameters", &self.desc.parameters.len())
            .finish()
    }
}

/// 描述中的一段寄存器占用
struct RegisterUse {
    class: char,
    space: u32,
    first: u32,
    last: u32,
    visibility: ParameterVisibility,
}

/// 按 D3D12 规则校验根签名描述
///
/// - 总开销不超过 64 DWORD
/// - 描述符表非空，范围数量大于 0，采样器不与其他类型混放
/// - 根描述符不能是采样器
/// - 可见性重叠的参数之间，同类寄存器在同一空间内不重叠
pub fn validate_desc(desc: &RootSignatureDesc) -> Result<(), NativeCreationError> {
    let cost = desc.cost();
    if cost > MAX_ROOT_SIGNATURE_COST {
        return Err(NativeCreationError::CostExceeded {
            cost,
            limit: MAX_ROOT_SIGNATURE_COST,
        });
    }

    let mut uses = Vec::new();
    for (index, parameter) in desc.parameters.iter().enumerate() {
        match parameter {
            RootParameter::DescriptorTable { ranges, visibility, .. } => {
                if ranges.is_empty() {
                    return Err(NativeCreationError::InvalidDescription(format!(
                        "descriptor table {} has no ranges",
                        index
                    )));
                }
                let samplers = ranges.iter().filter(|r| r.kind == BindingKind::Sampler).count();
                if samplers != 0 && samplers != ranges.len() {
                    return Err(NativeCreationError::InvalidDescription(format!(
                        "descriptor table {} mixes samplers with other descriptors",
                        index
                    )));
                }
                for range in ranges {
                    if range.count == 0 {
                        return Err(NativeCreationError::InvalidDescription(format!(
                            "descriptor table {} has an empty range at register {}{}",
                            index,
                            range.kind.register_class(),
                            range.base_register
                        )));
                    }
                    uses.push(RegisterUse {
                        class: range.kind.register_class(),
                        space: range.space,
                        first: range.base_register,
                        last: range.last_register(),
                        visibility: *visibility,
                    });
                }
            }
            RootParameter::RootDescriptor { kind, register, space, visibility } => {
                if *kind == BindingKind::Sampler {
                    return Err(NativeCreationError::InvalidDescription(format!(
                        "root parameter {} is a sampler root descriptor",
                        index
                    )));
                }
                uses.push(RegisterUse {
                    class: kind.register_class(),
                    space: *space,
                    first: *register,
                    last: *register,
                    visibility: *visibility,
                });
            }
        }
    }

    for (i, a) in uses.iter().enumerate() {
        for b in &uses[i + 1..] {
            let overlapping = a.class == b.class
                && a.space == b.space
                && a.visibility.overlaps(b.visibility)
                && a.first <= b.last
                && b.first <= a.last;
            if overlapping {
                return Err(NativeCreationError::OverlappingRegisters {
                    class: a.class,
                    space: a.space,
                    register: a.first.max(b.first),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root_signature::desc::{DescriptorRange, RootSignatureFlags};

    fn table(kind: BindingKind, registers: &[(u32, u32)], visibility: ParameterVisibility) -> RootParameter {
        RootParameter::DescriptorTable {
            kind,
            ranges: registers
                .iter()
                .enumerate()
                .map(|(i, &(base_register, count))| DescriptorRange {
                    kind,
                    base_register,
                    space: 0,
                    count,
                    binding_index: i,
                })
                .collect(),
            visibility,
        }
    }

    fn desc(parameters: Vec<RootParameter>) -> RootSignatureDesc {
        RootSignatureDesc {
            parameters,
            flags: RootSignatureFlags::empty(),
        }
    }

    #[test]
    fn test_create_and_drop_tracks_live_objects() {
        let device = HeadlessDevice::new();
        let d = desc(vec![table(BindingKind::ConstantBuffer, &[(0, 1)], ParameterVisibility::All)]);

        let a = device.create_root_signature(&d).unwrap();
        let b = device.create_root_signature(&d).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(device.live_objects(), 2);

        drop(a);
        assert_eq!(device.live_objects(), 1);
        drop(b);
        assert_eq!(device.live_objects(), 0);
        assert_eq!(device.created_objects(), 2);
    }

    #[test]
    fn test_cost_limit() {
        let parameters = (0..33)
            .map(|i| RootParameter::RootDescriptor {
                kind: BindingKind::ReadOnlyResource,
                register: i,
                space: 0,
                visibility: ParameterVisibility::All,
            })
            .collect();
        let err = validate_desc(&desc(parameters)).unwrap_err();
        assert_eq!(err, NativeCreationError::CostExceeded { cost: 66, limit: 64 });
    }

    #[test]
    fn test_overlapping_ranges() {
        let d = desc(vec![table(
            BindingKind::ReadOnlyResource,
            &[(0, 4), (3, 1)],
            ParameterVisibility::All,
        )]);
        assert_eq!(
            validate_desc(&d).unwrap_err(),
            NativeCreationError::OverlappingRegisters { class: 't', space: 0, register: 3 }
        );
    }

    #[test]
    fn test_disjoint_visibility_allows_same_register() {
        let d = desc(vec![
            table(BindingKind::ConstantBuffer, &[(0, 1)], ParameterVisibility::Vertex),
            table(BindingKind::ConstantBuffer, &[(0, 1)], ParameterVisibility::Pixel),
        ]);
        assert!(validate_desc(&d).is_ok());
    }

    #[test]
    fn test_root_descriptor_overlaps_table() {
        let d = desc(vec![
            table(BindingKind::ReadOnlyResource, &[(0, 1)], ParameterVisibility::Pixel),
            RootParameter::RootDescriptor {
                kind: BindingKind::ReadOnlyResource,
                register: 0,
                space: 0,
                visibility: ParameterVisibility::All,
            },
        ]);
        assert!(matches!(
            validate_desc(&d),
            Err(NativeCreationError::OverlappingRegisters { class: 't', .. })
        ));
    }

    #[test]
    fn test_invalid_tables() {
        let empty = desc(vec![RootParameter::DescriptorTable {
            kind: BindingKind::Sampler,
            ranges: Vec::new(),
            visibility: ParameterVisibility::All,
        }]);
        assert!(matches!(
            validate_desc(&empty),
            Err(NativeCreationError::InvalidDescription(_))
        ));

        let zero = desc(vec![table(BindingKind::Sampler, &[(0, 0)], ParameterVisibility::All)]);
        assert!(matches!(
            validate_desc(&zero),
            Err(NativeCreationError::InvalidDescription(_))
        ));
    }

    #[test]
    fn test_failed_creation_leaves_no_object() {
        let device = HeadlessDevice::new();
        let d = desc(vec![table(BindingKind::Sampler, &[(0, 1), (0, 1)], ParameterVisibility::All)]);
        assert!(device.create_root_signature(&d).is_err());
        assert_eq!(device.live_objects(), 0);
        assert_eq!(device.created_objects(), 0);
    }
}
