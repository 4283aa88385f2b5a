//! 根签名句柄
//!
//! 句柄是调用方持有的引用：克隆增加缓存中的引用计数，
//! `invalidate` 或丢弃时减少，计数归零时实例从缓存移除。
//!
//! 句柄只弱引用管理器。管理器销毁或清空后，句柄成为过期句柄，
//! 仍可访问自己的实例，但克隆和释放不再影响任何缓存条目。

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use super::device::RootSignatureDevice;
use super::fingerprint::Fingerprint;
use super::layout::{RootBinding, SlotLocation};
use super::manager::{ManagerShared, RootSignatureInstance};

/// 根签名句柄
pub struct RootSignatureHandle<D: RootSignatureDevice> {
    manager: Weak<ManagerShared<D>>,
    fingerprint: Fingerprint,
    instance: Option<Arc<RootSignatureInstance<D>>>,
}

impl<D: RootSignatureDevice> RootSignatureHandle<D> {
    /// 由管理器创建，调用前引用计数已经加一
    pub(crate) fn new(
        manager: &Arc<ManagerShared<D>>,
        fingerprint: Fingerprint,
        instance: Arc<RootSignatureInstance<D>>,
    ) -> Self {
        Self {
            manager: Arc::downgrade(manager),
            fingerprint,
            instance: Some(instance),
        }
    }

    /// 不引用任何实例的空句柄
    pub fn invalid() -> Self {
        Self {
            manager: Weak::new(),
            fingerprint: Fingerprint::default(),
            instance: None,
        }
    }

    /// 句柄是否持有实例
    pub fn is_valid(&self) -> bool {
        self.instance.is_some()
    }

    /// 释放引用并清空句柄，可重复调用
    pub fn invalidate(&mut self) {
        if let Some(instance) = self.instance.take() {
            if let Some(manager) = self.manager.upgrade() {
                manager.release(self.fingerprint, &instance);
            }
        }
        self.manager = Weak::new();
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn instance(&self) -> Option<&Arc<RootSignatureInstance<D>>> {
        self.instance.as_ref()
    }

    /// 原生根签名
    pub fn root_signature(&self) -> Option<&D::RootSignature> {
        self.instance.as_deref().map(RootSignatureInstance::root_signature)
    }

    pub fn slot_map(&self) -> Option<&HashMap<String, Vec<usize>>> {
        self.instance.as_deref().map(RootSignatureInstance::slot_map)
    }

    /// 名字对应的绑定下标，空句柄返回空切片
    pub fn slot_indices(&self, name: &str) -> &[usize] {
        match self.instance.as_deref() {
            Some(instance) => instance.slot_indices(name),
            None => &[],
        }
    }

    pub fn slot_locations(&self, name: &str) -> Vec<SlotLocation> {
        self.instance
            .as_deref()
            .map(|instance| instance.slot_locations(name))
            .unwrap_or_default()
    }

    pub fn bindings(&self) -> &[RootBinding] {
        match self.instance.as_deref() {
            Some(instance) => instance.bindings(),
            None => &[],
        }
    }

    pub fn is_graphics(&self) -> bool {
        self.instance.as_deref().is_some_and(RootSignatureInstance::is_graphics)
    }

    /// 缓存中该实例的当前引用计数
    ///
    /// 空句柄、过期句柄或管理器已销毁时为 `None`。
    pub fn reference_count(&self) -> Option<u32> {
        let instance = self.instance.as_ref()?;
        let manager = self.manager.upgrade()?;
        manager.reference_count_of(self.fingerprint, instance)
    }
}

impl<D: RootSignatureDevice> Clone for RootSignatureHandle<D> {
    fn clone(&self) -> Self {
        let Some(instance) = self.instance.clone() else {
            return Self::invalid();
        };

        let retained = self
            .manager
            .upgrade()
            .is_some_and(|manager| manager.retain(self.fingerprint, &instance));

        Self {
            // 过期句柄的克隆同样过期，释放时不会触及缓存
            manager: if retained { self.manager.clone() } else { Weak::new() },
            fingerprint: self.fingerprint,
            instance: Some(instance),
        }
    }
}

impl<D: RootSignatureDevice> Drop for RootSignatureHandle<D> {
    fn drop(&mut self) {
        self.invalidate();
    }
}

impl<D: RootSignatureDevice> Default for RootSignatureHandle<D> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<D: RootSignatureDevice> fmt::Debug for RootSignatureHandle<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootSignatureHandle")
            .field("fingerprint", &format_args!("{}", self.fingerprint))
            .field("valid", &self.is_valid())
            .field("bindings", &self.bindings().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root_signature::device::HeadlessDevice;

    #[test]
    fn test_invalid_handle() {
        let mut handle: RootSignatureHandle<HeadlessDevice> = RootSignatureHandle::default();
        assert!(!handle.is_valid());
        assert!(handle.root_signature().is_none());
        assert!(handle.slot_map().is_none());
        assert!(handle.slot_indices("anything").is_empty());
        assert!(handle.bindings().is_empty());
        assert!(!handle.is_graphics());
        assert_eq!(handle.reference_count(), None);

        let cloned = handle.clone();
        assert!(!cloned.is_valid());

        handle.invalidate();
        assert!(!handle.is_valid());
    }
}
