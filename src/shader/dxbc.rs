//! DXBC 容器解析与 RDEF 反射
//!
//! DXBC 是 FXC 输出的着色器容器格式：
//!
//! ```text
//! "DXBC" | checksum[16] | version=1 | total_size | chunk_count | chunk_offsets[chunk_count]
//! chunk: fourcc | size | data[size]
//! ```
//!
//! 资源绑定信息位于 `RDEF` 块：
//!
//! ```text
//! cb_count | cb_offset | resource_count | resource_offset | target | flags | creator_offset
//! resource: name_offset | input_type | return_type | dimension | samples | bind_point | bind_count | flags
//!           [space | id]   (SM 5.1+)
//! ```
//!
//! 所有偏移都相对于块数据起点，字段为小端序。

use crate::core::error::ReflectionError;
use super::reflect::{ShaderInputBinding, ShaderReflector};

const DXBC_MAGIC: [u8; 4] = *b"DXBC";
const CONTAINER_VERSION: u32 = 1;
const CONTAINER_HEADER_SIZE: usize = 32;
const CHUNK_HEADER_SIZE: usize = 8;

pub const FOURCC_RDEF: [u8; 4] = *b"RDEF";

const RDEF_HEADER_SIZE: usize = 28;
const RESOURCE_RECORD_SIZE: usize = 32;
const RESOURCE_RECORD_SIZE_SM51: usize = 40;
const TARGET_VERSION_MASK: u32 = 0xFFFF;
const TARGET_VERSION_5_1: u32 = 0x0501;

type Result<T> = std::result::Result<T, ReflectionError>;

/// 小端序读取器
struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn at(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    fn ensure(&self, n: usize) -> Result<()> {
        match self.offset.checked_add(n) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(ReflectionError::Truncated {
                offset: self.offset,
                needed: n,
                available: self.data.len().saturating_sub(self.offset),
            }),
        }
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        let bytes = [
            self.data[self.offset],
            self.data[self.offset + 1],
            self.data[self.offset + 2],
            self.data[self.offset + 3],
        ];
        self.offset += 4;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_fourcc(&mut self) -> Result<[u8; 4]> {
        self.ensure(4)?;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.data[self.offset..self.offset + 4]);
        self.offset += 4;
        Ok(out)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.offset += n;
        Ok(())
    }
}

/// 读取以 NUL 结尾的字符串
fn read_cstring_at(data: &[u8], offset: usize) -> Result<String> {
    let tail = data.get(offset..).ok_or(ReflectionError::InvalidName { offset })?;
    let len = tail
        .iter()
        .position(|&b| b == 0)
        .ok_or(ReflectionError::InvalidName { offset })?;
    std::str::from_utf8(&tail[..len])
        .map(str::to_owned)
        .map_err(|_| ReflectionError::InvalidName { offset })
}

fn fourcc_str(fourcc: &[u8; 4]) -> String {
    if fourcc.iter().all(|b| b.is_ascii_graphic()) {
        String::from_utf8_lossy(fourcc).into_owned()
    } else {
        format!("0x{:02x}{:02x}{:02x}{:02x}", fourcc[0], fourcc[1], fourcc[2], fourcc[3])
    }
}

/// 已校验的 DXBC 容器
#[derive(Debug)]
pub struct DxbcContainer<'a> {
    data: &'a [u8],
    chunks: Vec<(usize, [u8; 4], usize)>,
}

impl<'a> DxbcContainer<'a> {
    /// 解析并校验容器头和块表
    ///
    /// 不校验头部的 MD5 校验和。
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let mut r = ByteReader::at(data, 0);
        r.ensure(CONTAINER_HEADER_SIZE)?;

        let magic = r.read_fourcc()?;
        if magic != DXBC_MAGIC {
            return Err(ReflectionError::InvalidContainer(format!(
                "bad magic {}",
                fourcc_str(&magic)
            )));
        }
        r.skip(16)?;

        let version = r.read_u32()?;
        if version != CONTAINER_VERSION {
            return Err(ReflectionError::InvalidContainer(format!(
                "unsupported container version {}",
                version
            )));
        }

        let total_size = r.read_u32()? as usize;
        if total_size != data.len() {
            return Err(ReflectionError::InvalidContainer(format!(
                "declared size {} but blob is {} bytes",
                total_size,
                data.len()
            )));
        }

        let chunk_count = r.read_u32()? as usize;
        let mut chunks = Vec::with_capacity(chunk_count.min(64));
        for _ in 0..chunk_count {
            let offset = r.read_u32()? as usize;

            let mut cr = ByteReader::at(data, offset);
            let fourcc = cr.read_fourcc()?;
            let size = cr.read_u32()? as usize;
            cr.ensure(size)?;

            chunks.push((offset + CHUNK_HEADER_SIZE, fourcc, size));
        }

        Ok(Self { data, chunks })
    }

    /// 查找第一个指定类型的块数据
    pub fn find_chunk(&self, fourcc: [u8; 4]) -> Option<&'a [u8]> {
        self.chunks
            .iter()
            .find(|(_, cc, _)| *cc == fourcc)
            .map(|&(start, _, size)| &self.data[start..start + size])
    }

    /// 块数量
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// 解析 RDEF 块中的资源绑定表
pub fn parse_rdef_bindings(rdef: &[u8]) -> Result<Vec<ShaderInputBinding>> {
    let mut r = ByteReader::at(rdef, 0);
    r.ensure(RDEF_HEADER_SIZE)?;

    let _cb_count = r.read_u32()?;
    let _cb_offset = r.read_u32()?;
    let resource_count = r.read_u32()? as usize;
    let resource_offset = r.read_u32()? as usize;
    let target = r.read_u32()?;

    let record_size = if target & TARGET_VERSION_MASK >= TARGET_VERSION_5_1 {
        RESOURCE_RECORD_SIZE_SM51
    } else {
        RESOURCE_RECORD_SIZE
    };

    let table_size = resource_count
        .checked_mul(record_size)
        .ok_or_else(|| ReflectionError::InvalidContainer("resource count overflow".to_string()))?;
    ByteReader::at(rdef, resource_offset).ensure(table_size)?;

    let mut bindings = Vec::with_capacity(resource_count);
    for i in 0..resource_count {
        let mut rr = ByteReader::at(rdef, resource_offset + i * record_size);

        let name_offset = rr.read_u32()? as usize;
        let input_type = rr.read_u32()?;
        let _return_type = rr.read_u32()?;
        let _dimension = rr.read_u32()?;
        let _sample_count = rr.read_u32()?;
        let bind_point = rr.read_u32()?;
        let bind_count = rr.read_u32()?;
        let _flags = rr.read_u32()?;
        let space = if record_size == RESOURCE_RECORD_SIZE_SM51 {
            rr.read_u32()?
        } else {
            0
        };

        let name = read_cstring_at(rdef, name_offset)?;
        crate::cache_trace!(name = %name, input_type, bind_point, space, "RDEF resource");
        bindings.push(ShaderInputBinding::from_raw(
            name, input_type, bind_point, space, bind_count,
        )?);
    }

    Ok(bindings)
}

/// 基于 DXBC RDEF 块的反射器
#[derive(Debug, Clone, Copy, Default)]
pub struct DxbcReflector;

impl DxbcReflector {
    pub fn new() -> Self {
        Self
    }
}

impl ShaderReflector for DxbcReflector {
    fn reflect(&self, bytecode: &[u8]) -> Result<Vec<ShaderInputBinding>> {
        let container = DxbcContainer::parse(bytecode)?;
        let rdef = container
            .find_chunk(FOURCC_RDEF)
            .ok_or(ReflectionError::MissingChunk("RDEF"))?;
        parse_rdef_bindings(rdef)
    }
}
