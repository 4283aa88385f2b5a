//! 测试辅助：DXBC 字节码构造器与假反射器

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::error::ReflectionError;
use crate::shader::{DxbcReflector, ShaderInputBinding, ShaderReflector};

/// RDEF 中的一条资源记录
#[derive(Debug, Clone)]
pub(crate) struct RdefResource {
    name: String,
    input_type: u32,
    register: u32,
    space: u32,
    count: u32,
}

impl RdefResource {
    pub(crate) fn new(name: &str, input_type: u32, register: u32) -> Self {
        Self {
            name: name.to_string(),
            input_type,
            register,
            space: 0,
            count: 1,
        }
    }

    pub(crate) fn space(mut self, space: u32) -> Self {
        self.space = space;
        self
    }

    pub(crate) fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }
}

/// 构造最小但格式正确的 DXBC 容器：一个 RDEF 块加一个 SHEX 块
pub(crate) struct DxbcBuilder {
    program_type: u16,
    target_version: u16,
    resources: Vec<RdefResource>,
    code: Vec<u8>,
    with_rdef: bool,
}

impl DxbcBuilder {
    pub(crate) fn new() -> Self {
        Self {
            // 0xFFFE = 顶点着色器
            program_type: 0xFFFE,
            target_version: 0x0500,
            resources: Vec::new(),
            code: vec![0xAB; 16],
            with_rdef: true,
        }
    }

    pub(crate) fn target_version(mut self, version: u16) -> Self {
        self.target_version = version;
        self
    }

    pub(crate) fn resource(mut self, resource: RdefResource) -> Self {
        self.resources.push(resource);
        self
    }

    /// 指令块内容，用于得到绑定相同但字节码不同的着色器
    pub(crate) fn code(mut self, code: &[u8]) -> Self {
        self.code = code.to_vec();
        self
    }

    pub(crate) fn without_rdef(mut self) -> Self {
        self.with_rdef = false;
        self
    }

    fn build_rdef(&self) -> Vec<u8> {
        let sm51 = self.target_version >= 0x0501;
        let record_size = if sm51 { 40 } else { 32 };
        // SM5 的 RD11 扩展头
        let header_size = 28 + 32;
        let resource_offset = header_size;
        let strings_offset = resource_offset + self.resources.len() * record_size;

        let mut strings = Vec::new();
        let mut name_offsets = Vec::new();
        for resource in &self.resources {
            name_offsets.push((strings_offset + strings.len()) as u32);
            strings.extend_from_slice(resource.name.as_bytes());
            strings.push(0);
        }
        let creator_offset = (strings_offset + strings.len()) as u32;
        strings.extend_from_slice(b"dist_rootsig test\0");

        let target = ((self.program_type as u32) << 16) | self.target_version as u32;

        let mut out = Vec::new();
        let put = |out: &mut Vec<u8>, v: u32| out.extend_from_slice(&v.to_le_bytes());
        put(&mut out, 0);
        put(&mut out, 0);
        put(&mut out, self.resources.len() as u32);
        put(&mut out, resource_offset as u32);
        put(&mut out, target);
        put(&mut out, 0);
        put(&mut out, creator_offset);
        out.extend_from_slice(b"RD11");
        for _ in 0..7 {
            put(&mut out, 0);
        }
        debug_assert_eq!(out.len(), header_size);

        for (resource, name_offset) in self.resources.iter().zip(name_offsets) {
            put(&mut out, name_offset);
            put(&mut out, resource.input_type);
            put(&mut out, 0);
            put(&mut out, 0);
            put(&mut out, 0);
            put(&mut out, resource.register);
            put(&mut out, resource.count);
            put(&mut out, 0);
            if sm51 {
                put(&mut out, resource.space);
                put(&mut out, 0);
            }
        }
        out.extend_from_slice(&strings);
        out
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut chunks: Vec<([u8; 4], Vec<u8>)> = Vec::new();
        if self.with_rdef {
            chunks.push((*b"RDEF", self.build_rdef()));
        }
        chunks.push((*b"SHEX", self.code.clone()));

        let header_size = 32 + 4 * chunks.len();
        let mut offsets = Vec::new();
        let mut body = Vec::new();
        for (fourcc, data) in &chunks {
            offsets.push((header_size + body.len()) as u32);
            body.extend_from_slice(fourcc);
            body.extend_from_slice(&(data.len() as u32).to_le_bytes());
            body.extend_from_slice(data);
        }

        let total_size = header_size + body.len();
        let mut out = Vec::with_capacity(total_size);
        out.extend_from_slice(b"DXBC");
        out.extend_from_slice(&[0u8; 16]);
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&(total_size as u32).to_le_bytes());
        out.extend_from_slice(&(chunks.len() as u32).to_le_bytes());
        for offset in offsets {
            out.extend_from_slice(&offset.to_le_bytes());
        }
        out.extend_from_slice(&body);
        out
    }
}

/// 统计调用次数的 DXBC 反射器
pub(crate) struct CountingReflector {
    calls: Arc<AtomicUsize>,
}

impl CountingReflector {
    pub(crate) fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { calls: calls.clone() }, calls)
    }
}

impl ShaderReflector for CountingReflector {
    fn reflect(&self, bytecode: &[u8]) -> Result<Vec<ShaderInputBinding>, ReflectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        DxbcReflector.reflect(bytecode)
    }
}

/// 按字节码返回预设绑定列表的反射器
#[derive(Default)]
pub(crate) struct CannedReflector {
    table: HashMap<Vec<u8>, Vec<ShaderInputBinding>>,
}

impl CannedReflector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, bytecode: &[u8], bindings: Vec<ShaderInputBinding>) -> Self {
        self.table.insert(bytecode.to_vec(), bindings);
        self
    }
}

impl ShaderReflector for CannedReflector {
    fn reflect(&self, bytecode: &[u8]) -> Result<Vec<ShaderInputBinding>, ReflectionError> {
        self.table
            .get(bytecode)
            .cloned()
            .ok_or_else(|| ReflectionError::InvalidContainer("unknown test bytecode".to_string()))
    }
}

/// 写入共享缓冲区的日志输出
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 在 TRACE 级别的线程局部订阅者下执行 `f`，返回结果和格式化后的日志文本
pub(crate) fn capture_trace<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_target(true)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let output = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (result, output)
}
