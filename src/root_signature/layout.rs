//! 绑定布局
//!
//! 将一组着色器阶段的反射结果合并为单一的绑定列表，
//! 再把列表转换为根签名描述。
//!
//! 合并规则（按名字匹配）：
//!
//! - 名字首次出现：追加新绑定
//! - 已存在同名绑定且类型不同：`LayoutConflictError`
//! - 已存在同名同类型且寄存器和空间相同的绑定：合并可见性
//! - 同名同类型但寄存器不同：追加为另一个绑定，名字映射到多个下标

use std::collections::HashMap;

use crate::core::config::RootSignatureConfig;
use crate::core::error::{LayoutConflictError, Result};
use crate::shader::{
    BindingKind, Shader, ShaderInputBinding, ShaderReflector, ShaderStage, ShaderVisibility,
};

use super::desc::{
    DescriptorRange, ParameterVisibility, RootParameter, RootSignatureDesc, RootSignatureFlags,
};
use super::fingerprint::Fingerprint;

/// 合并后的单个绑定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootBinding {
    pub name: String,
    pub kind: BindingKind,
    pub register: u32,
    pub space: u32,
    pub count: u32,
    /// 使用该绑定的阶段
    pub visibility: ShaderVisibility,
}

/// 绑定在根签名中的位置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SlotLocation {
    /// 根参数下标
    pub parameter_index: u32,
    /// 在描述符表中的描述符偏移
    pub offset_in_table: u32,
}

/// 合并完成的绑定布局
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingLayout {
    bindings: Vec<RootBinding>,
    slot_map: HashMap<String, Vec<usize>>,
    stages: ShaderVisibility,
}

impl BindingLayout {
    pub fn bindings(&self) -> &[RootBinding] {
        &self.bindings
    }

    /// 名字到绑定下标的映射
    pub fn slot_map(&self) -> &HashMap<String, Vec<usize>> {
        &self.slot_map
    }

    /// 名字对应的全部绑定下标，按加入顺序排列
    pub fn slot_indices(&self, name: &str) -> &[usize] {
        self.slot_map.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 参与布局的阶段
    pub fn stages(&self) -> ShaderVisibility {
        self.stages
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// 转换为根签名描述
    ///
    /// 绑定按 (类型, 可见性) 分组，每组生成一个描述符表，表内每个绑定一个范围。
    /// 类型按 `BindingKind::TABLE_ORDER`、可见性按 `ParameterVisibility::TABLE_ORDER` 排列，
    /// 因此不同阶段各自在同一寄存器上声明的绑定落在互不可见的表中。
    /// 启用原始绑定时在最后追加一个根描述符。
    /// 返回值中的位置列表与 `bindings()` 一一对应。
    pub fn to_root_signature_desc(
        &self,
        is_graphics: bool,
        config: &RootSignatureConfig,
    ) -> (RootSignatureDesc, Vec<SlotLocation>) {
        let mut parameters = Vec::new();
        let mut locations = vec![SlotLocation::default(); self.bindings.len()];

        for kind in BindingKind::TABLE_ORDER {
            for visibility in ParameterVisibility::TABLE_ORDER {
                let parameter_index = parameters.len() as u32;
                let mut ranges = Vec::new();
                let mut offset = 0u32;

                for (index, binding) in self.bindings.iter().enumerate() {
                    if binding.kind != kind
                        || ParameterVisibility::from_stages(binding.visibility) != visibility
                    {
                        continue;
                    }
                    locations[index] = SlotLocation {
                        parameter_index,
                        offset_in_table: offset,
                    };
                    offset = offset.saturating_add(binding.count);
                    ranges.push(DescriptorRange {
                        kind,
                        base_register: binding.register,
                        space: binding.space,
                        count: binding.count,
                        binding_index: index,
                    });
                }

                if !ranges.is_empty() {
                    parameters.push(RootParameter::DescriptorTable {
                        kind,
                        ranges,
                        visibility,
                    });
                }
            }
        }

        if config.raw_binding {
            parameters.push(RootParameter::RootDescriptor {
                kind: BindingKind::ReadOnlyResource,
                register: config.raw_register,
                space: config.raw_space,
                visibility: ParameterVisibility::All,
            });
        }

        let mut flags = RootSignatureFlags::empty();
        if is_graphics {
            flags |= RootSignatureFlags::ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT;
            if config.deny_unused_stage_access {
                flags |= deny_flags_for(self.stages);
            }
        }

        (RootSignatureDesc { parameters, flags }, locations)
    }
}

/// 未参与管线的阶段对应的 DENY 标志
fn deny_flags_for(stages: ShaderVisibility) -> RootSignatureFlags {
    let pairs = [
        (ShaderVisibility::VERTEX, RootSignatureFlags::DENY_VERTEX_SHADER_ROOT_ACCESS),
        (ShaderVisibility::PIXEL, RootSignatureFlags::DENY_PIXEL_SHADER_ROOT_ACCESS),
        (ShaderVisibility::GEOMETRY, RootSignatureFlags::DENY_GEOMETRY_SHADER_ROOT_ACCESS),
        (ShaderVisibility::DOMAIN, RootSignatureFlags::DENY_DOMAIN_SHADER_ROOT_ACCESS),
        (ShaderVisibility::HULL, RootSignatureFlags::DENY_HULL_SHADER_ROOT_ACCESS),
    ];

    pairs
        .into_iter()
        .filter(|(stage, _)| !stages.contains(*stage))
        .fold(RootSignatureFlags::empty(), |acc, (_, flag)| acc | flag)
}

/// 布局构建器
///
/// 依次加入各阶段的着色器，任一阶段失败时整个构建失败，
/// 调用方丢弃构建器即可，不会留下部分结果。
pub struct LayoutBuilder<'r> {
    reflector: &'r dyn ShaderReflector,
    layout: BindingLayout,
}

impl<'r> LayoutBuilder<'r> {
    pub fn new(reflector: &'r dyn ShaderReflector) -> Self {
        Self {
            reflector,
            layout: BindingLayout::default(),
        }
    }

    /// 反射一个阶段并合并其绑定
    pub fn add_stage(&mut self, shader: &Shader, stage: ShaderStage) -> Result<()> {
        if shader.stage() != stage {
            crate::cache_warn!(
                declared = shader.stage().name(),
                slot = stage.name(),
                "Shader stage does not match its slot, using slot stage"
            );
        }

        let bindings = self.reflector.reflect(shader.bytecode())?;
        crate::cache_trace!(
            stage = stage.name(),
            bindings = bindings.len(),
            "Reflected shader stage"
        );

        self.layout.stages |= stage.visibility();
        for binding in bindings {
            self.merge(binding, stage)?;
        }
        Ok(())
    }

    /// 按名字合并单个反射绑定
    pub fn merge(
        &mut self,
        binding: ShaderInputBinding,
        stage: ShaderStage,
    ) -> std::result::Result<(), LayoutConflictError> {
        let visibility = stage.visibility();
        let layout = &mut self.layout;

        if let Some(indices) = layout.slot_map.get(&binding.name) {
            if let Some(existing) = indices
                .iter()
                .map(|&i| &layout.bindings[i])
                .find(|b| b.kind != binding.kind)
            {
                return Err(LayoutConflictError {
                    name: binding.name,
                    existing: existing.kind,
                    conflicting: binding.kind,
                    stage,
                });
            }

            let same_slot = indices.iter().copied().find(|&i| {
                let b = &layout.bindings[i];
                b.register == binding.register && b.space == binding.space
            });
            if let Some(index) = same_slot {
                let existing = &mut layout.bindings[index];
                existing.visibility |= visibility;
                existing.count = existing.count.max(binding.count);
                return Ok(());
            }
        }

        let index = layout.bindings.len();
        crate::cache_trace!(
            name = %binding.name,
            kind = binding.kind.name(),
            register = binding.register,
            space = binding.space,
            stage = stage.name(),
            "New binding"
        );
        layout
            .slot_map
            .entry(binding.name.clone())
            .or_default()
            .push(index);
        layout.bindings.push(RootBinding {
            name: binding.name,
            kind: binding.kind,
            register: binding.register,
            space: binding.space,
            count: binding.count,
            visibility,
        });
        Ok(())
    }

    pub fn finish(self) -> BindingLayout {
        self.layout
    }
}

/// 图形管线的着色器组合，VS 必需
#[derive(Debug, Clone, Copy)]
pub struct GraphicsShaders<'a> {
    pub vs: &'a Shader,
    pub ps: Option<&'a Shader>,
    pub gs: Option<&'a Shader>,
    pub ds: Option<&'a Shader>,
    pub hs: Option<&'a Shader>,
}

impl<'a> GraphicsShaders<'a> {
    pub fn new(vs: &'a Shader) -> Self {
        Self {
            vs,
            ps: None,
            gs: None,
            ds: None,
            hs: None,
        }
    }

    pub fn pixel(mut self, ps: &'a Shader) -> Self {
        self.ps = Some(ps);
        self
    }

    pub fn geometry(mut self, gs: &'a Shader) -> Self {
        self.gs = Some(gs);
        self
    }

    pub fn domain(mut self, ds: &'a Shader) -> Self {
        self.ds = Some(ds);
        self
    }

    pub fn hull(mut self, hs: &'a Shader) -> Self {
        self.hs = Some(hs);
        self
    }

    /// 按 `ShaderStage::GRAPHICS_ORDER` 排列的阶段槽位
    fn slots(&self) -> [Option<&'a Shader>; 5] {
        [Some(self.vs), self.ps, self.gs, self.ds, self.hs]
    }
}

/// 根签名创建描述：计算着色器或图形管线着色器组合
#[derive(Debug, Clone, Copy)]
pub enum RootSignatureCreateDesc<'a> {
    Compute(&'a Shader),
    Graphics(GraphicsShaders<'a>),
}

impl<'a> RootSignatureCreateDesc<'a> {
    pub fn compute(cs: &'a Shader) -> Self {
        RootSignatureCreateDesc::Compute(cs)
    }

    pub fn graphics(shaders: GraphicsShaders<'a>) -> Self {
        RootSignatureCreateDesc::Graphics(shaders)
    }

    pub fn is_graphics(&self) -> bool {
        matches!(self, RootSignatureCreateDesc::Graphics(_))
    }

    /// 缓存键，不需要反射
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            RootSignatureCreateDesc::Compute(cs) => Fingerprint::of_compute(cs.bytecode()),
            RootSignatureCreateDesc::Graphics(shaders) => {
                Fingerprint::of_graphics(shaders.slots().map(|s| s.map(Shader::bytecode)))
            }
        }
    }

    /// 存在的阶段，按固定顺序
    pub fn stages(&self) -> Vec<(ShaderStage, &'a Shader)> {
        match self {
            RootSignatureCreateDesc::Compute(cs) => vec![(ShaderStage::Compute, *cs)],
            RootSignatureCreateDesc::Graphics(shaders) => ShaderStage::GRAPHICS_ORDER
                .into_iter()
                .zip(shaders.slots())
                .filter_map(|(stage, shader)| shader.map(|s| (stage, s)))
                .collect(),
        }
    }

    /// 反射全部阶段并构建布局
    pub fn build_layout(&self, reflector: &dyn ShaderReflector) -> Result<BindingLayout> {
        let mut builder = LayoutBuilder::new(reflector);
        for (stage, shader) in self.stages() {
            builder.add_stage(shader, stage)?;
        }
        Ok(builder.finish())
    }
}

impl<'a> From<GraphicsShaders<'a>> for RootSignatureCreateDesc<'a> {
    fn from(shaders: GraphicsShaders<'a>) -> Self {
        RootSignatureCreateDesc::Graphics(shaders)
    }
}
