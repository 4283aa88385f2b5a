//! CRC-32 校验
//!
//! 标准 CRC-32（IEEE 802.3，反射多项式 `0xEDB88320`）。
//! 种子采用 zlib 语义：`crc32_with_seed(b, crc32(a)) == crc32(a ++ b)`，
//! 因此可以按阶段依次链式计算指纹。

/// CRC-32 查找表
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let polynomial: u32 = 0xEDB8_8320;
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ polynomial;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// 计算 `data` 的 CRC-32
#[inline]
pub fn crc32(data: &[u8]) -> u32 {
    crc32_with_seed(data, 0)
}

/// 以上一次的校验值为种子继续计算
pub fn crc32_with_seed(data: &[u8], seed: u32) -> u32 {
    let mut crc = !seed;
    for &byte in data {
        let index = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}
