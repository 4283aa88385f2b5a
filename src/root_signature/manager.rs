//! 根签名缓存管理器
//!
//! 以指纹为键缓存根签名实例并做引用计数：
//!
//! ```text
//! Absent ──create_root_signature──▶ Live(1) ──clone──▶ Live(n+1)
//!                                     │
//!                                     └──最后一个句柄释放──▶ Absent
//! ```
//!
//! 查找、构建和插入在同一个互斥区内完成，
//! 因此并发的未命中不会为同一指纹插入两个实例。
//! 构建失败时不插入任何条目。

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::config::RootSignatureConfig;
use crate::core::error::Result;
use crate::shader::ShaderReflector;

use super::desc::RootSignatureDesc;
use super::device::RootSignatureDevice;
use super::fingerprint::Fingerprint;
use super::handle::RootSignatureHandle;
use super::layout::{BindingLayout, RootBinding, RootSignatureCreateDesc, SlotLocation};

/// 缓存中的根签名实例
///
/// 创建后不可变；句柄和缓存共享同一个 `Arc`。
pub struct RootSignatureInstance<D: RootSignatureDevice> {
    fingerprint: Fingerprint,
    root_signature: D::RootSignature,
    desc: RootSignatureDesc,
    layout: BindingLayout,
    locations: Vec<SlotLocation>,
    is_graphics: bool,
}

impl<D: RootSignatureDevice> RootSignatureInstance<D> {
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// 设备创建的原生根签名
    pub fn root_signature(&self) -> &D::RootSignature {
        &self.root_signature
    }

    pub fn desc(&self) -> &RootSignatureDesc {
        &self.desc
    }

    pub fn layout(&self) -> &BindingLayout {
        &self.layout
    }

    pub fn bindings(&self) -> &[RootBinding] {
        self.layout.bindings()
    }

    pub fn slot_map(&self) -> &HashMap<String, Vec<usize>> {
        self.layout.slot_map()
    }

    pub fn slot_indices(&self, name: &str) -> &[usize] {
        self.layout.slot_indices(name)
    }

    /// 绑定下标对应的根参数位置
    pub fn location(&self, binding_index: usize) -> Option<SlotLocation> {
        self.locations.get(binding_index).copied()
    }

    /// 名字对应的全部根参数位置
    pub fn slot_locations(&self, name: &str) -> Vec<SlotLocation> {
        self.slot_indices(name)
            .iter()
            .filter_map(|&i| self.location(i))
            .collect()
    }

    /// 原始根描述符所在的根参数下标
    pub fn raw_parameter_index(&self) -> Option<u32> {
        self.desc.root_descriptor_index()
    }

    pub fn is_graphics(&self) -> bool {
        self.is_graphics
    }
}

impl<D: RootSignatureDevice> fmt::Debug for RootSignatureInstance<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootSignatureInstance")
            .field("fingerprint", &format_args!("{}", self.fingerprint))
            .field("bindings", &self.layout.len())
            .field("parameters", &self.desc.parameters.len())
            .field("is_graphics", &self.is_graphics)
            .finish()
    }
}

/// 缓存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootSignatureCacheStats {
    /// 当前缓存的实例数
    pub live_instances: usize,
    /// 所有实例的引用计数之和
    pub total_references: u64,
    pub hits: u64,
    pub misses: u64,
    /// 反射、合并或原生创建失败的次数
    pub failed_builds: u64,
}

struct CacheEntry<D: RootSignatureDevice> {
    instance: Arc<RootSignatureInstance<D>>,
    reference_count: u32,
}

struct CacheState<D: RootSignatureDevice> {
    entries: HashMap<Fingerprint, CacheEntry<D>>,
    hits: u64,
    misses: u64,
    failed_builds: u64,
}

/// 管理器与句柄共享的状态
pub(crate) struct ManagerShared<D: RootSignatureDevice> {
    device: D,
    reflector: Box<dyn ShaderReflector>,
    config: RootSignatureConfig,
    state: Mutex<CacheState<D>>,
}

impl<D: RootSignatureDevice> ManagerShared<D> {
    fn lock(&self) -> MutexGuard<'_, CacheState<D>> {
        // 计数操作不会在中途 panic，中毒后的状态仍然一致
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 为已有实例增加一次引用
    ///
    /// 条目不存在或已被另一个实例替换时返回 `false`。
    pub(crate) fn retain(&self, fingerprint: Fingerprint, instance: &Arc<RootSignatureInstance<D>>) -> bool {
        let mut state = self.lock();
        match state.entries.get_mut(&fingerprint) {
            Some(entry) if Arc::ptr_eq(&entry.instance, instance) => {
                entry.reference_count += 1;
                true
            }
            _ => false,
        }
    }

    /// 释放一次引用，计数归零时移除条目
    pub(crate) fn release(&self, fingerprint: Fingerprint, instance: &Arc<RootSignatureInstance<D>>) {
        let removed = {
            let mut state = self.lock();
            let remaining = match state.entries.get_mut(&fingerprint) {
                Some(entry) if Arc::ptr_eq(&entry.instance, instance) => {
                    entry.reference_count = entry.reference_count.saturating_sub(1);
                    entry.reference_count
                }
                _ => {
                    crate::cache_trace!(fingerprint = %fingerprint, "Release of stale handle ignored");
                    return;
                }
            };

            if remaining == 0 {
                state.entries.remove(&fingerprint)
            } else {
                crate::cache_trace!(
                    fingerprint = %fingerprint,
                    references = remaining,
                    "Root signature reference released"
                );
                None
            }
        };

        // 原生对象在锁外析构
        if removed.is_some() {
            crate::cache_debug!(fingerprint = %fingerprint, "Root signature destroyed");
        }
    }

    pub(crate) fn reference_count_of(
        &self,
        fingerprint: Fingerprint,
        instance: &Arc<RootSignatureInstance<D>>,
    ) -> Option<u32> {
        let state = self.lock();
        state
            .entries
            .get(&fingerprint)
            .filter(|entry| Arc::ptr_eq(&entry.instance, instance))
            .map(|entry| entry.reference_count)
    }

    fn build_instance(
        &self,
        fingerprint: Fingerprint,
        create_desc: &RootSignatureCreateDesc<'_>,
    ) -> Result<RootSignatureInstance<D>> {
        let layout = create_desc.build_layout(self.reflector.as_ref())?;
        let is_graphics = create_desc.is_graphics();
        let (desc, locations) = layout.to_root_signature_desc(is_graphics, &self.config);
        let root_signature = self.device.create_root_signature(&desc)?;

        crate::cache_debug!(
            fingerprint = %fingerprint,
            device = self.device.name(),
            bindings = layout.len(),
            parameters = desc.parameters.len(),
            cost = desc.cost(),
            is_graphics,
            "Root signature built"
        );

        Ok(RootSignatureInstance {
            fingerprint,
            root_signature,
            desc,
            layout,
            locations,
            is_graphics,
        })
    }
}

/// 根签名缓存管理器
///
/// 管理器由调用方显式创建和持有，可以同时存在多个互不相干的缓存。
/// 丢弃管理器等同于调用 `destroy`。
pub struct RootSignatureManager<D: RootSignatureDevice> {
    shared: Arc<ManagerShared<D>>,
}

impl<D: RootSignatureDevice> RootSignatureManager<D> {
    /// 创建管理器
    ///
    /// # 参数
    ///
    /// * `device` - 创建原生根签名的设备
    /// * `reflector` - 着色器反射实现
    /// * `config` - 根签名生成选项
    pub fn new(device: D, reflector: impl ShaderReflector + 'static, config: RootSignatureConfig) -> Self {
        crate::cache_debug!(
            device = device.name(),
            raw_binding = config.raw_binding,
            "Root signature manager created"
        );

        Self {
            shared: Arc::new(ManagerShared {
                device,
                reflector: Box::new(reflector),
                config,
                state: Mutex::new(CacheState {
                    entries: HashMap::new(),
                    hits: 0,
                    misses: 0,
                    failed_builds: 0,
                }),
            }),
        }
    }

    /// 获取或创建根签名
    ///
    /// 先计算指纹；命中时只增加引用计数，不重新反射。
    /// 未命中时反射、合并并创建原生对象，成功后以计数 1 插入。
    /// 任何一步失败都不会修改缓存内容。
    pub fn create_root_signature(
        &self,
        create_desc: &RootSignatureCreateDesc<'_>,
    ) -> Result<RootSignatureHandle<D>> {
        let fingerprint = create_desc.fingerprint();
        let mut state = self.shared.lock();

        if let Some(entry) = state.entries.get_mut(&fingerprint) {
            entry.reference_count += 1;
            let references = entry.reference_count;
            let instance = entry.instance.clone();
            state.hits += 1;

            crate::cache_debug!(fingerprint = %fingerprint, references, "Root signature cache hit");
            return Ok(RootSignatureHandle::new(&self.shared, fingerprint, instance));
        }

        state.misses += 1;
        crate::cache_debug!(fingerprint = %fingerprint, "Root signature cache miss");

        let instance = match self.shared.build_instance(fingerprint, create_desc) {
            Ok(instance) => Arc::new(instance),
            Err(err) => {
                state.failed_builds += 1;
                crate::cache_debug!(fingerprint = %fingerprint, error = %err, "Root signature build failed");
                return Err(err);
            }
        };

        state.entries.insert(
            fingerprint,
            CacheEntry {
                instance: instance.clone(),
                reference_count: 1,
            },
        );
        Ok(RootSignatureHandle::new(&self.shared, fingerprint, instance))
    }

    /// 当前缓存的实例数
    pub fn len(&self) -> usize {
        self.shared.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.shared.lock().entries.contains_key(&fingerprint)
    }

    /// 指纹对应实例的引用计数，不存在时为 `None`
    pub fn reference_count(&self, fingerprint: Fingerprint) -> Option<u32> {
        self.shared
            .lock()
            .entries
            .get(&fingerprint)
            .map(|entry| entry.reference_count)
    }

    pub fn stats(&self) -> RootSignatureCacheStats {
        let state = self.shared.lock();
        RootSignatureCacheStats {
            live_instances: state.entries.len(),
            total_references: state
                .entries
                .values()
                .map(|entry| u64::from(entry.reference_count))
                .sum(),
            hits: state.hits,
            misses: state.misses,
            failed_builds: state.failed_builds,
        }
    }

    pub fn device(&self) -> &D {
        &self.shared.device
    }

    pub fn config(&self) -> &RootSignatureConfig {
        &self.shared.config
    }

    /// 清空缓存
    ///
    /// 无论引用计数如何都移除全部条目。仍在外部的句柄变为过期句柄：
    /// 它们继续持有各自的实例直到被丢弃，但释放不再影响缓存，
    /// 也不会影响之后以相同指纹重新创建的实例。
    ///
    /// 缓存只释放自己持有的那一份实例。被过期句柄引用的原生根签名不会在这里销毁，
    /// 而是在最后一个引用它的句柄被丢弃时才释放。
    pub fn destroy(&self) {
        let entries = {
            let mut state = self.shared.lock();
            std::mem::take(&mut state.entries)
        };

        if entries.is_empty() {
            return;
        }

        let outstanding: u64 = entries
            .values()
            .map(|entry| u64::from(entry.reference_count))
            .sum();
        if outstanding > 0 {
            crate::cache_warn!(
                instances = entries.len(),
                outstanding,
                "Root signature cache destroyed with outstanding references"
            );
        } else {
            crate::cache_debug!(instances = entries.len(), "Root signature cache destroyed");
        }
    }
}

impl<D: RootSignatureDevice> Drop for RootSignatureManager<D> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<D: RootSignatureDevice> fmt::Debug for RootSignatureManager<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootSignatureManager")
            .field("device", &self.shared.device.name())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::core::error::{NativeCreationError, RootSigError};
    use crate::root_signature::desc::{ParameterVisibility, RootParameter};
    use crate::root_signature::device::HeadlessDevice;
    use crate::root_signature::layout::GraphicsShaders;
    use crate::shader::reflect::{SIT_CBUFFER, SIT_SAMPLER, SIT_TEXTURE};
    use crate::shader::{BindingKind, DxbcReflector, Shader, ShaderStage};
    use crate::test_util::{CountingReflector, DxbcBuilder, RdefResource};

    fn manager() -> RootSignatureManager<HeadlessDevice> {
        RootSignatureManager::new(HeadlessDevice::new(), DxbcReflector, RootSignatureConfig::default())
    }

    fn vertex_shader() -> Shader {
        let bytecode = DxbcBuilder::new()
            .resource(RdefResource::new("PerFrame", SIT_CBUFFER, 0))
            .code(b"vertex main")
            .build();
        Shader::from_bytecode(ShaderStage::Vertex, bytecode)
    }

    fn pixel_shader() -> Shader {
        let bytecode = DxbcBuilder::new()
            .resource(RdefResource::new("PerFrame", SIT_CBUFFER, 0))
            .resource(RdefResource::new("gAlbedo", SIT_TEXTURE, 0))
            .resource(RdefResource::new("gLinear", SIT_SAMPLER, 0))
            .code(b"pixel main")
            .build();
        Shader::from_bytecode(ShaderStage::Pixel, bytecode)
    }

    #[test]
    fn test_dedup_same_instance() {
        let manager = manager();
        let vs = vertex_shader();
        let ps = pixel_shader();

        // 字节码相同但对象不同
        let vs_copy = Shader::from_bytecode(ShaderStage::Vertex, vs.bytecode().to_vec());

        let a = manager
            .create_root_signature(&GraphicsShaders::new(&vs).pixel(&ps).into())
            .unwrap();
        let b = manager
            .create_root_signature(&GraphicsShaders::new(&vs_copy).pixel(&ps).into())
            .unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert!(Arc::ptr_eq(a.instance().unwrap(), b.instance().unwrap()));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.device().live_objects(), 1);
        assert_eq!(a.reference_count(), Some(2));
    }

    #[test]
    fn test_acquire_release_scenario() {
        let manager = manager();
        let vs = vertex_shader();
        let ps = pixel_shader();
        let desc: RootSignatureCreateDesc<'_> = GraphicsShaders::new(&vs).pixel(&ps).into();

        let mut first = manager.create_root_signature(&desc).unwrap();
        let mut second = manager.create_root_signature(&desc).unwrap();
        let fingerprint = desc.fingerprint();
        assert_eq!(manager.reference_count(fingerprint), Some(2));

        first.invalidate();
        assert!(!first.is_valid());
        assert_eq!(manager.reference_count(fingerprint), Some(1));
        assert_eq!(manager.device().live_objects(), 1);

        second.invalidate();
        assert!(!manager.contains(fingerprint));
        assert!(manager.is_empty());
        assert_eq!(manager.device().live_objects(), 0);

        // 重复释放无效果
        second.invalidate();
        assert!(manager.is_empty());
    }

    #[test]
    fn test_n_acquires_and_releases() {
        let manager = manager();
        let cs = Shader::from_bytecode(
            ShaderStage::Compute,
            DxbcBuilder::new()
                .resource(RdefResource::new("gInput", SIT_TEXTURE, 0))
                .build(),
        );
        let desc = RootSignatureCreateDesc::compute(&cs);
        let n = 5;

        let mut handles: Vec<_> = (0..n)
            .map(|_| manager.create_root_signature(&desc).unwrap())
            .collect();
        assert_eq!(manager.reference_count(desc.fingerprint()), Some(n));

        handles.truncate(1);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.reference_count(desc.fingerprint()), Some(1));

        handles.clear();
        assert!(manager.is_empty());

        let stats = manager.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, u64::from(n) - 1);
    }

    #[test]
    fn test_clone_increments_and_drop_releases() {
        let manager = manager();
        let cs = Shader::from_bytecode(ShaderStage::Compute, DxbcBuilder::new().build());
        let desc = RootSignatureCreateDesc::compute(&cs);

        let handle = manager.create_root_signature(&desc).unwrap();
        let cloned = handle.clone();
        assert_eq!(manager.reference_count(desc.fingerprint()), Some(2));
        assert_eq!(manager.stats().total_references, 2);

        drop(handle);
        assert_eq!(cloned.reference_count(), Some(1));
        drop(cloned);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_corrupt_bytecode_leaves_cache_empty() {
        let manager = manager();
        let mut bytecode = DxbcBuilder::new().build();
        bytecode[0] = b'X';
        let cs = Shader::from_bytecode(ShaderStage::Compute, bytecode);

        assert_eq!(manager.len(), 0);
        let result = manager.create_root_signature(&RootSignatureCreateDesc::compute(&cs));
        assert!(matches!(result, Err(RootSigError::Reflection(_))));
        assert_eq!(manager.len(), 0);
        assert_eq!(manager.stats().failed_builds, 1);
        assert_eq!(manager.device().created_objects(), 0);
    }

    #[test]
    fn test_layout_conflict_leaves_cache_unchanged() {
        let manager = manager();
        let cs = Shader::from_bytecode(ShaderStage::Compute, DxbcBuilder::new().build());
        let _existing = manager
            .create_root_signature(&RootSignatureCreateDesc::compute(&cs))
            .unwrap();

        let vs = Shader::from_bytecode(
            ShaderStage::Vertex,
            DxbcBuilder::new()
                .resource(RdefResource::new("Foo", SIT_CBUFFER, 0))
                .build(),
        );
        let ps = Shader::from_bytecode(
            ShaderStage::Pixel,
            DxbcBuilder::new()
                .resource(RdefResource::new("Foo", SIT_TEXTURE, 0))
                .code(b"different")
                .build(),
        );

        let result = manager.create_root_signature(&GraphicsShaders::new(&vs).pixel(&ps).into());
        match result {
            Err(RootSigError::LayoutConflict(err)) => {
                assert_eq!(err.existing, BindingKind::ConstantBuffer);
                assert_eq!(err.conflicting, BindingKind::ReadOnlyResource);
            }
            other => panic!("expected layout conflict, got {:?}", other.map(|h| h.fingerprint())),
        }
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.device().live_objects(), 1);
    }

    #[test]
    fn test_native_failure_leaves_cache_unchanged() {
        // 原始绑定与着色器的 t0 space0 冲突
        let config = RootSignatureConfig {
            raw_space: 0,
            ..RootSignatureConfig::default()
        };
        let manager = RootSignatureManager::new(HeadlessDevice::new(), DxbcReflector, config);
        let cs = Shader::from_bytecode(
            ShaderStage::Compute,
            DxbcBuilder::new()
                .resource(RdefResource::new("gInput", SIT_TEXTURE, 0))
                .build(),
        );

        let result = manager.create_root_signature(&RootSignatureCreateDesc::compute(&cs));
        assert!(matches!(
            result,
            Err(RootSigError::NativeCreation(NativeCreationError::OverlappingRegisters { .. }))
        ));
        assert!(manager.is_empty());
        assert_eq!(manager.stats().failed_builds, 1);
    }

    #[test]
    fn test_cache_hit_skips_reflection() {
        let (reflector, calls) = CountingReflector::new();
        let manager =
            RootSignatureManager::new(HeadlessDevice::new(), reflector, RootSignatureConfig::default());
        let vs = vertex_shader();
        let ps = pixel_shader();
        let desc: RootSignatureCreateDesc<'_> = GraphicsShaders::new(&vs).pixel(&ps).into();

        let _a = manager.create_root_signature(&desc).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let _b = manager.create_root_signature(&desc).unwrap();
        let _c = manager.create_root_signature(&desc).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(manager.stats().hits, 2);
    }

    #[test]
    fn test_destroy_with_stale_handles() {
        let manager = manager();
        let cs = Shader::from_bytecode(ShaderStage::Compute, DxbcBuilder::new().build());
        let desc = RootSignatureCreateDesc::compute(&cs);

        let stale = manager.create_root_signature(&desc).unwrap();
        let stale_clone = stale.clone();
        manager.destroy();
        assert!(manager.is_empty());

        let fresh = manager.create_root_signature(&desc).unwrap();
        assert_eq!(fresh.fingerprint(), stale.fingerprint());
        assert!(!Arc::ptr_eq(fresh.instance().unwrap(), stale.instance().unwrap()));

        // 过期句柄的克隆和释放都不影响新实例
        let stale_again = stale.clone();
        assert_eq!(stale_again.reference_count(), None);
        drop(stale);
        drop(stale_clone);
        drop(stale_again);
        assert_eq!(manager.reference_count(desc.fingerprint()), Some(1));
        assert_eq!(fresh.reference_count(), Some(1));
    }

    #[test]
    fn test_destroy_defers_native_release_to_stale_handles() {
        let manager = manager();
        let cs = Shader::from_bytecode(ShaderStage::Compute, DxbcBuilder::new().build());
        let stale = manager
            .create_root_signature(&RootSignatureCreateDesc::compute(&cs))
            .unwrap();
        let stale_clone = stale.clone();

        manager.destroy();
        assert!(manager.is_empty());
        assert_eq!(manager.device().live_objects(), 1);

        drop(stale);
        assert_eq!(manager.device().live_objects(), 1);
        drop(stale_clone);
        assert_eq!(manager.device().live_objects(), 0);
    }

    #[test]
    fn test_handles_outlive_manager() {
        let manager = manager();
        let cs = Shader::from_bytecode(ShaderStage::Compute, DxbcBuilder::new().build());
        let handle = manager
            .create_root_signature(&RootSignatureCreateDesc::compute(&cs))
            .unwrap();

        drop(manager);
        assert!(handle.is_valid());
        assert_eq!(handle.reference_count(), None);
        assert!(handle.root_signature().is_some());
    }

    #[test]
    fn test_concurrent_misses_build_once() {
        let manager = Arc::new(manager());
        let bytecode = DxbcBuilder::new()
            .resource(RdefResource::new("gInput", SIT_TEXTURE, 0))
            .build();

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                let bytecode = bytecode.clone();
                std::thread::spawn(move || {
                    let cs = Shader::from_bytecode(ShaderStage::Compute, bytecode);
                    manager
                        .create_root_signature(&RootSignatureCreateDesc::compute(&cs))
                        .unwrap()
                })
            })
            .collect();

        let handles: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        let stats = manager.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 7);
        assert_eq!(manager.device().created_objects(), 1);
        assert_eq!(manager.reference_count(handles[0].fingerprint()), Some(8));

        drop(handles);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_slot_locations_through_handle() {
        let manager = manager();
        let vs = vertex_shader();
        let ps = pixel_shader();
        let handle = manager
            .create_root_signature(&GraphicsShaders::new(&vs).pixel(&ps).into())
            .unwrap();

        assert_eq!(handle.slot_indices("gAlbedo"), &[1]);
        let locations = handle.slot_locations("gAlbedo");
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].parameter_index, 1);
        assert!(handle.is_graphics());

        let instance = handle.instance().unwrap();
        // CBV, SRV, Sampler, 根描述符
        assert_eq!(instance.desc().parameters.len(), 4);
        assert_eq!(instance.raw_parameter_index(), Some(3));
    }

    #[test]
    fn test_stages_reuse_register_with_different_names() {
        let manager = manager();
        let vs = Shader::from_bytecode(
            ShaderStage::Vertex,
            DxbcBuilder::new()
                .resource(RdefResource::new("VSConst", SIT_CBUFFER, 0))
                .code(b"skinned vertex main")
                .build(),
        );
        let ps = Shader::from_bytecode(
            ShaderStage::Pixel,
            DxbcBuilder::new()
                .resource(RdefResource::new("PSConst", SIT_CBUFFER, 0))
                .resource(RdefResource::new("gAlbedo", SIT_TEXTURE, 0))
                .code(b"lit pixel main")
                .build(),
        );

        let handle = manager
            .create_root_signature(&GraphicsShaders::new(&vs).pixel(&ps).into())
            .unwrap();
        assert_eq!(manager.device().live_objects(), 1);

        let instance = handle.instance().unwrap();
        let table_of = |name: &str| {
            let locations = handle.slot_locations(name);
            assert_eq!(locations.len(), 1, "{}", name);
            let index = locations[0].parameter_index;
            match &instance.desc().parameters[index as usize] {
                RootParameter::DescriptorTable { kind, visibility, .. } => (index, *kind, *visibility),
                other => panic!("{} mapped to {:?}", name, other),
            }
        };

        let (vs_index, vs_kind, vs_visibility) = table_of("VSConst");
        let (ps_index, ps_kind, ps_visibility) = table_of("PSConst");
        let (_, albedo_kind, albedo_visibility) = table_of("gAlbedo");

        assert_ne!(vs_index, ps_index);
        assert_eq!(vs_kind, BindingKind::ConstantBuffer);
        assert_eq!(vs_visibility, ParameterVisibility::Vertex);
        assert_eq!(ps_kind, BindingKind::ConstantBuffer);
        assert_eq!(ps_visibility, ParameterVisibility::Pixel);
        assert_eq!(albedo_kind, BindingKind::ReadOnlyResource);
        assert_eq!(albedo_visibility, ParameterVisibility::Pixel);
    }
}
