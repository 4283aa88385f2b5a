//! 根签名缓存键
//!
//! 指纹是参与布局的着色器字节码按固定阶段顺序拼接后的 CRC-32。
//! 图形管线中缺失的可选阶段以单个零字节代替，
//! 这样仅在"哪些阶段存在"上不同的组合也会得到不同的指纹。
//!
//! 指纹碰撞会导致错误的缓存命中，这是已知且接受的风险。

use std::fmt;

use crate::shader::crc::{crc32, crc32_with_seed};

/// 32 位内容指纹
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u32);

impl Fingerprint {
    /// 计算着色器指纹
    pub fn of_compute(cs: &[u8]) -> Self {
        Fingerprint(crc32(cs))
    }

    /// 图形管线指纹，阶段顺序为 VS, PS, GS, DS, HS
    pub fn of_graphics(stages: [Option<&[u8]>; 5]) -> Self {
        const ABSENT: [u8; 1] = [0];

        let crc = stages.iter().fold(0u32, |crc, stage| {
            crc32_with_seed(stage.unwrap_or(&ABSENT), crc)
        });
        Fingerprint(crc)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}
