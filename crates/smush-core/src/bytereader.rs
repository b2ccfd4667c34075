//! 字节切片读取器.
//!
//! 编解码器在已读入内存的块负载上按字节解析数据, 支持定长整数 (大端/小端) 读取.
//! 所有读取都做边界检查, 越界读取视为块内容超出声明大小.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::{SmushError, SmushResult};

/// 字节切片读取器
///
/// # 示例
/// ```
/// use smush_core::ByteReader;
///
/// let data = [0x2F, 0x00, 0x12, 0x34];
/// let mut br = ByteReader::new(&data);
/// assert_eq!(br.read_u16_le().unwrap(), 47);
/// assert_eq!(br.read_u16_be().unwrap(), 0x1234);
/// assert!(br.is_empty());
/// ```
pub struct ByteReader<'a> {
    /// 源数据
    data: &'a [u8],
    /// 当前读取位置
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// 创建新的字节读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// 当前读取位置 (相对于切片起点)
    pub fn position(&self) -> usize {
        self.pos
    }

    /// 剩余可读字节数
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// 是否已读完
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// 读取指定数量的字节, 返回借用的子切片
    pub fn read_bytes(&mut self, count: usize) -> SmushResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(SmushError::SizeMismatch(format!(
                "读取越界: 位置 {}, 需要 {} 字节, 剩余 {} 字节",
                self.pos,
                count,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// 读取定长数组
    pub fn read_array<const N: usize>(&mut self) -> SmushResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// 跳过指定字节数
    pub fn skip(&mut self, count: usize) -> SmushResult<()> {
        self.read_bytes(count).map(|_| ())
    }

    /// 读取 1 个字节
    pub fn read_u8(&mut self) -> SmushResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// 读取 u16 小端
    pub fn read_u16_le(&mut self) -> SmushResult<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    /// 读取 i16 小端
    pub fn read_i16_le(&mut self) -> SmushResult<i16> {
        Ok(LittleEndian::read_i16(self.read_bytes(2)?))
    }

    /// 读取 u32 小端
    pub fn read_u32_le(&mut self) -> SmushResult<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    /// 读取 u16 大端
    pub fn read_u16_be(&mut self) -> SmushResult<u16> {
        Ok(BigEndian::read_u16(self.read_bytes(2)?))
    }

    /// 读取 u32 大端
    pub fn read_u32_be(&mut self) -> SmushResult<u32> {
        Ok(BigEndian::read_u32(self.read_bytes(4)?))
    }

    /// 获取尚未读取的全部数据 (不移动位置)
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}
