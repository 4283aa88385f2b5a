//! dist_rootsig - 根签名检查工具
//!
//! 读取已编译的着色器，生成根签名并打印绑定布局。
//!
//! # 使用方法
//!
//! ```bash
//! # 图形管线
//! dist_rootsig vs=basic_vs.cso ps=basic_ps.cso
//!
//! # 计算着色器，使用 DirectX 12 设备（仅 Windows）
//! dist_rootsig --dx12 cs=blur_cs.cso
//!
//! # 指定配置文件和日志级别
//! dist_rootsig --config tools.toml --log-level debug vs=a.cso
//! ```
//!
//! # 命令行参数
//!
//! - `<stage>=<path>`：着色器文件，stage 为 `vs`/`ps`/`gs`/`ds`/`hs`/`cs`
//! - `--config <path>`：配置文件，默认 `config.toml`
//! - 其余参数见 `Config::apply_args`

use anyhow::{anyhow, bail, Context};

use dist_rootsig::core::{log, Config, DeviceBackend, RootSignatureConfig};
use dist_rootsig::root_signature::{
    GraphicsShaders, HeadlessDevice, RootParameter, RootSignatureCreateDesc, RootSignatureDevice,
    RootSignatureManager,
};
use dist_rootsig::shader::{DxbcReflector, Shader, ShaderReflector, ShaderStage};
use dist_rootsig::{app_error, app_info};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // 1. 加载配置（在初始化日志之前）
    let config_path = value_after(&args, "--config").unwrap_or("config.toml");
    let mut config = Config::from_file_or_default(config_path);

    // 2. 应用命令行参数
    config.apply_args(&args);

    // 3. 验证配置
    config.validate().context("Invalid configuration")?;

    // 4. 初始化日志系统
    let log_file = if config.logging.file_output {
        Some(config.logging.log_file.as_str())
    } else {
        None
    };
    log::init_logger(config.logging.level, config.logging.file_output, log_file)?;
    app_info!(version = env!("CARGO_PKG_VERSION"), backend = config.device.backend.name(), "dist_rootsig starting");

    // 5. 读取着色器
    let shaders = load_shaders(&args)?;
    if shaders.is_empty() {
        bail!("No shaders given, expected <stage>=<path> arguments (stage: vs ps gs ds hs cs)");
    }

    // 6. 在配置的设备上创建根签名
    let result = match config.device.backend {
        DeviceBackend::Headless => inspect(
            HeadlessDevice::new(),
            DxbcReflector,
            &config.root_signature,
            &shaders,
        ),
        #[cfg(target_os = "windows")]
        DeviceBackend::Dx12 => inspect(
            dist_rootsig::gfx::Dx12Device::create_default()?,
            dist_rootsig::gfx::D3dReflector,
            &config.root_signature,
            &shaders,
        ),
        #[cfg(not(target_os = "windows"))]
        DeviceBackend::Dx12 => Err(anyhow!("DX12 backend is only available on Windows")),
    };

    if let Err(e) = &result {
        app_error!(error = %e, "Root signature inspection failed");
    }
    result
}

/// 解析 `<stage>=<path>` 参数并读取文件
fn load_shaders(args: &[String]) -> anyhow::Result<Vec<Shader>> {
    let mut shaders = Vec::new();

    for arg in args.iter().filter(|a| !a.starts_with("--")) {
        let Some((stage, path)) = arg.split_once('=') else {
            continue;
        };
        let stage = ShaderStage::from_short_name(stage)
            .ok_or_else(|| anyhow!("Unknown shader stage '{}' in '{}'", stage, arg))?;
        if shaders.iter().any(|s: &Shader| s.stage() == stage) {
            bail!("Shader stage '{}' given more than once", stage.name());
        }

        let shader = Shader::from_file(stage, path)
            .with_context(|| format!("Failed to read {} shader '{}'", stage.name(), path))?;
        app_info!(stage = stage.name(), path, size = shader.bytecode().len(), "Shader loaded");
        shaders.push(shader);
    }

    Ok(shaders)
}

/// 按阶段组装创建描述
fn create_desc(shaders: &[Shader]) -> anyhow::Result<RootSignatureCreateDesc<'_>> {
    let find = |stage| shaders.iter().find(|s| s.stage() == stage);

    if let Some(cs) = find(ShaderStage::Compute) {
        if shaders.len() > 1 {
            bail!("A compute shader cannot be combined with graphics stages");
        }
        return Ok(RootSignatureCreateDesc::compute(cs));
    }

    let vs = find(ShaderStage::Vertex)
        .ok_or_else(|| anyhow!("Graphics pipelines require a vertex shader (vs=<path>)"))?;
    let mut graphics = GraphicsShaders::new(vs);
    graphics.ps = find(ShaderStage::Pixel);
    graphics.gs = find(ShaderStage::Geometry);
    graphics.ds = find(ShaderStage::Domain);
    graphics.hs = find(ShaderStage::Hull);
    Ok(RootSignatureCreateDesc::graphics(graphics))
}

fn inspect<D: RootSignatureDevice>(
    device: D,
    reflector: impl ShaderReflector + 'static,
    config: &RootSignatureConfig,
    shaders: &[Shader],
) -> anyhow::Result<()> {
    let desc = create_desc(shaders)?;
    let manager = RootSignatureManager::new(device, reflector, config.clone());

    let mut handle = manager
        .create_root_signature(&desc)
        .context("Failed to create root signature")?;
    let instance = handle
        .instance()
        .cloned()
        .ok_or_else(|| anyhow!("Root signature handle is empty"))?;

    println!("fingerprint: {}", handle.fingerprint());
    println!("pipeline:    {}", if handle.is_graphics() { "graphics" } else { "compute" });
    println!("cost:        {} DWORD", instance.desc().cost());
    println!("flags:       {:?}", instance.desc().flags);

    println!();
    println!("bindings:");
    for (index, binding) in handle.bindings().iter().enumerate() {
        let location = instance.location(index).unwrap_or_default();
        println!(
            "  [{}] {:<24} {:<7} {}{} space{} x{}  visibility={:?}  -> param {} offset {}",
            index,
            binding.name,
            binding.kind.name(),
            binding.kind.register_class(),
            binding.register,
            binding.space,
            binding.count,
            binding.visibility,
            location.parameter_index,
            location.offset_in_table,
        );
    }

    println!();
    println!("slot map:");
    let mut names: Vec<_> = instance.slot_map().iter().collect();
    names.sort();
    for (name, indices) in names {
        println!("  {:<24} {:?}", name, indices);
    }

    println!();
    println!("root parameters:");
    for (index, parameter) in instance.desc().parameters.iter().enumerate() {
        match parameter {
            RootParameter::DescriptorTable { kind, ranges, visibility } => {
                println!("  [{}] table {} ({:?}, {} ranges)", index, kind.name(), visibility, ranges.len());
                for range in ranges {
                    println!(
                        "        {}{}..{}{} space{}",
                        range.kind.register_class(),
                        range.base_register,
                        range.kind.register_class(),
                        range.last_register(),
                        range.space,
                    );
                }
            }
            RootParameter::RootDescriptor { kind, register, space, visibility } => {
                println!(
                    "  [{}] root {} {}{} space{} ({:?})",
                    index,
                    kind.name(),
                    kind.register_class(),
                    register,
                    space,
                    visibility,
                );
            }
        }
    }

    drop(instance);
    handle.invalidate();
    app_info!(cached = manager.len(), "Root signature released");
    manager.destroy();
    Ok(())
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}
