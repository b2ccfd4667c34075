//! IACT 交错音频重组与解码.
//!
//! IACT 块负载由一串以 2 字节大端长度为前缀的编码块组成, 编码块可能跨越
//! 多个 IACT 块. 不完整的编码块暂存在携带缓冲区中, 下一个 IACT 块到来时继续拼接.
//!
//! 每个完整编码块解码为固定 4096 字节的 16 位小端立体声 PCM:
//! 首字节的高/低半字节分别是两个声道的移位量, 之后每个控制字节要么是
//! 转义值 0x80 (其后 2 字节为现成的 16 位采样, 交换字节序输出),
//! 要么是有符号 8 位增量, 左移对应移位量后输出.

use log::{debug, trace};
use smush_core::{ByteReader, SmushError, SmushResult};

/// 解码输出块字节数 (也是携带缓冲区容量)
pub const IACT_BLOCK_SIZE: usize = 4096;

/// 每块的循环次数, 每次产生两个采样
const ITERATIONS: usize = 1024;

/// 转义控制字节
const ESCAPE: u8 = 0x80;

/// IACT 块头部
///
/// 布局 (18 字节, 小端):
/// ```text
/// code u16, flags u16, reserved i16, reserved u16,
/// stream_id u16, position u16, total u16, remaining u32
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IactHeader {
    /// 压缩编码 (固定为 8)
    pub code: u16,
    /// 标志 (固定为 46)
    pub flags: u16,
    /// 流标识
    pub stream_id: u16,
    /// 在音轨中的位置
    pub position: u16,
    /// 音轨总长度
    pub total: u16,
    /// 声明的剩余字节数
    pub remaining: u32,
}

impl IactHeader {
    /// 头部字节数
    pub const SIZE: usize = 18;
    /// 期望的压缩编码
    pub const EXPECTED_CODE: u16 = 8;
    /// 期望的标志
    pub const EXPECTED_FLAGS: u16 = 46;

    /// 解析并校验头部签名
    pub fn parse(reader: &mut ByteReader<'_>) -> SmushResult<Self> {
        if reader.remaining() < Self::SIZE {
            return Err(SmushError::MalformedHeader(format!(
                "IACT 头部不足 {} 字节 (剩余 {})",
                Self::SIZE,
                reader.remaining()
            )));
        }
        let code = reader.read_u16_le()?;
        let flags = reader.read_u16_le()?;
        let reserved1 = reader.read_i16_le()?;
        let reserved2 = reader.read_u16_le()?;
        let stream_id = reader.read_u16_le()?;
        let position = reader.read_u16_le()?;
        let total = reader.read_u16_le()?;
        let remaining = reader.read_u32_le()?;

        if code != Self::EXPECTED_CODE
            || flags != Self::EXPECTED_FLAGS
            || reserved1 != 0
            || reserved2 != 0
        {
            return Err(SmushError::MalformedHeader(format!(
                "IACT 签名不匹配: code={}, flags={}, reserved=({}, {})",
                code, flags, reserved1, reserved2
            )));
        }
        Ok(Self {
            code,
            flags,
            stream_id,
            position,
            total,
            remaining,
        })
    }
}

/// 跨块音频重组器
pub struct IactReassembler {
    /// 携带缓冲区 (含 2 字节长度前缀)
    carry: Box<[u8; IACT_BLOCK_SIZE]>,
    /// 携带缓冲区已填充字节数
    fill: usize,
    /// 解码输出
    output: Box<[u8; IACT_BLOCK_SIZE]>,
}

impl Default for IactReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl IactReassembler {
    /// 创建空的重组器
    pub fn new() -> Self {
        Self {
            carry: Box::new([0; IACT_BLOCK_SIZE]),
            fill: 0,
            output: Box::new([0; IACT_BLOCK_SIZE]),
        }
    }

    /// 携带缓冲区中暂存的字节数
    pub fn pending(&self) -> usize {
        self.fill
    }

    /// 推入一段 IACT 负载, 每拼出一个完整编码块就解码并调用 `emit`
    ///
    /// 返回本次发出的音频块数.
    pub fn push<F>(&mut self, mut data: &[u8], mut emit: F) -> SmushResult<usize>
    where
        F: FnMut(&[u8; IACT_BLOCK_SIZE]),
    {
        let mut emitted = 0;
        while !data.is_empty() {
            if self.fill < 2 {
                self.carry[self.fill] = data[0];
                self.fill += 1;
                data = &data[1..];
                continue;
            }

            let total = usize::from(u16::from_be_bytes([self.carry[0], self.carry[1]])) + 2;
            if total > IACT_BLOCK_SIZE {
                return Err(SmushError::SizeMismatch(format!(
                    "IACT 编码块 {} 字节超出缓冲区 {} 字节",
                    total, IACT_BLOCK_SIZE
                )));
            }
            let need = total - self.fill;
            if data.len() < need {
                self.carry[self.fill..self.fill + data.len()].copy_from_slice(data);
                self.fill += data.len();
                trace!("IACT: 暂存 {}/{} 字节", self.fill, total);
                break;
            }

            self.carry[self.fill..total].copy_from_slice(&data[..need]);
            data = &data[need..];
            decode_block(&self.carry[2..total], &mut self.output);
            emit(&self.output);
            emitted += 1;
            self.fill = 0;
        }
        if emitted > 0 {
            debug!("IACT: 发出 {} 个音频块", emitted);
        }
        Ok(emitted)
    }
}

/// 解码一个编码块 (不含长度前缀), 输出恒为 4096 字节
///
/// 超出编码块末尾的读取按 0 处理.
pub fn decode_block(block: &[u8], out: &mut [u8; IACT_BLOCK_SIZE]) {
    let mut src = block.iter().copied().chain(std::iter::repeat(0));
    let mut next = move || src.next().unwrap_or(0);

    let shifts = next();
    let shift_first = u32::from(shifts >> 4);
    let shift_second = u32::from(shifts & 0x0F);

    for (i, sample) in out.chunks_exact_mut(2).take(ITERATIONS * 2).enumerate() {
        let shift = if i % 2 == 0 { shift_first } else { shift_second };
        let value = next();
        let bytes = if value == ESCAPE {
            let b0 = next();
            let b1 = next();
            [b1, b0]
        } else {
            let delta = i32::from(value as i8);
            ((delta << shift) as i16).to_le_bytes()
        };
        sample.copy_from_slice(&bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(code: u16, flags: u16, reserved: i16) -> Vec<u8> {
        let mut buf = Vec::new();
        for v in [code, flags, reserved as u16, 0, 1, 2, 3] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&100u32.to_le_bytes());
        buf
    }

    fn encoded_block(body: &[u8]) -> Vec<u8> {
        let mut out = (body.len() as u16).to_be_bytes().to_vec();
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_解析头部() {
        let data = header_bytes(8, 46, 0);
        let h = IactHeader::parse(&mut ByteReader::new(&data)).unwrap();
        assert_eq!(h.stream_id, 1);
        assert_eq!(h.position, 2);
        assert_eq!(h.total, 3);
        assert_eq!(h.remaining, 100);
    }

    #[test]
    fn test_签名不匹配() {
        for data in [
            header_bytes(7, 46, 0),
            header_bytes(8, 45, 0),
            header_bytes(8, 46, -1),
        ] {
            let err = IactHeader::parse(&mut ByteReader::new(&data)).unwrap_err();
            assert!(matches!(err, SmushError::MalformedHeader(_)));
        }
    }

    #[test]
    fn test_解码输出固定4096字节() {
        // 无论编码块长短, 输出缓冲区都被完整覆盖
        for len in [0usize, 5, 100, 3000, 4094] {
            let block = vec![0u8; len];
            let mut out = [0xAAu8; IACT_BLOCK_SIZE];
            decode_block(&block, &mut out);
            assert!(out.iter().all(|&b| b == 0), "len={len}");
        }
        // 长度 1: 只有移位字节, 所有采样为 0
        let mut out = [0xAAu8; IACT_BLOCK_SIZE];
        decode_block(&[0x21], &mut out);
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_增量左移与声道移位交替() {
        // 第一声道移 2 位, 第二声道移 1 位
        let block = [0x21, 0x01, 0xFF, 0x03, 0x7F];
        let mut out = [0u8; IACT_BLOCK_SIZE];
        decode_block(&block, &mut out);
        assert_eq!(i16::from_le_bytes([out[0], out[1]]), 4);
        assert_eq!(i16::from_le_bytes([out[2], out[3]]), -2);
        assert_eq!(i16::from_le_bytes([out[4], out[5]]), 12);
        assert_eq!(i16::from_le_bytes([out[6], out[7]]), 254);
    }

    #[test]
    fn test_转义值输出交换字节() {
        let block = [0x00, ESCAPE, 0x12, 0x34, 0x05];
        let mut out = [0u8; IACT_BLOCK_SIZE];
        decode_block(&block, &mut out);
        assert_eq!(&out[0..2], &[0x34, 0x12]);
        assert_eq!(&out[2..4], &[0x05, 0x00]);
    }

    #[test]
    fn test_单块完整发出() {
        let mut r = IactReassembler::new();
        let mut blocks = Vec::new();
        let n = r
            .push(&encoded_block(&[0x00, 0x01, 0x02]), |b| blocks.push(*b))
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(r.pending(), 0);
        assert_eq!(&blocks[0][0..4], &[1, 0, 2, 0]);
    }

    #[test]
    fn test_跨块拼接() {
        let first = encoded_block(&[0x00, 0x05, 0x06]);
        let second = encoded_block(&[0x00, 0x07]);
        let mut stream = first.clone();
        stream.extend_from_slice(&second);

        let mut whole = Vec::new();
        IactReassembler::new()
            .push(&stream, |b| whole.push(*b))
            .unwrap();

        // 在每个位置切开, 结果应与一次推入相同
        for cut in 0..=stream.len() {
            let mut r = IactReassembler::new();
            let mut parts = Vec::new();
            r.push(&stream[..cut], |b| parts.push(*b)).unwrap();
            r.push(&stream[cut..], |b| parts.push(*b)).unwrap();
            assert_eq!(parts.len(), 2, "cut={cut}");
            assert!(parts == whole, "cut={cut}");
            assert_eq!(r.pending(), 0);
        }
    }

    #[test]
    fn test_不完整块暂存() {
        let block = encoded_block(&[0x00; 10]);
        let mut r = IactReassembler::new();
        let n = r.push(&block[..5], |_| panic!("不应发出")).unwrap();
        assert_eq!(n, 0);
        assert_eq!(r.pending(), 5);
    }

    #[test]
    fn test_编码块超长报错() {
        let mut r = IactReassembler::new();
        let err = r.push(&[0xFF, 0xFF, 0x00], |_| {}).unwrap_err();
        assert!(matches!(err, SmushError::SizeMismatch(_)));
    }
}
