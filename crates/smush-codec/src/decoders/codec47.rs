//! codec47 解码器.
//!
//! 每个帧对象负载以 26 字节子头部开始, 随后按压缩模式解码:
//! - 0: 原始像素, 区域内逐行复制
//! - 1: 半分辨率, 每字节复制到 2x2 像素
//! - 2: 8x8 分块递归编码 (运动补偿/字形/填充), 仅在帧序号连续时有效
//! - 3 / 4: 整帧复制历史帧 2 / 历史帧 1
//! - 5: 从区域起点开始的线性游程解码
//!
//! 序号为 0 的帧用子头部中的两个填充字节重置两个历史帧.
//! 只有序号连续时才采纳子头部的轮转请求, 否则轮转码强制为 0.

use log::{debug, trace, warn};
use smush_core::{ByteReader, SmushError, SmushResult};

use crate::codec_id::CodecId;
use crate::decoder::{DecodeOutcome, FrameDecoder, FrameObject};
use crate::frame_buffers::{DecodeTarget, FrameBuffers};
use crate::glyph::GlyphTables;
use crate::rle::decode_rle;
use crate::tables::MOTION_VECTORS;

/// skip 标志置位时跳过的字节数
const SKIP_BYTES: usize = 0x8080;

/// 分块编码的顶层块边长
const TILE_SIZE: usize = 8;

/// codec47 子头部
///
/// 布局 (26 字节, 小端):
/// ```text
/// 0  seq u16
/// 2  compression u8
/// 3  rotate u8
/// 4  skip u8
/// 5  保留 3 字节
/// 8  code_table [u8; 8]   (第 4/5 项兼作历史帧填充字节)
/// 14 decoded_size u32     (与 code_table 末两项重叠)
/// 18 保留 8 字节
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec47Header {
    /// 帧序号
    pub seq: u16,
    /// 压缩模式
    pub compression: u8,
    /// 轮转请求
    pub rotate: u8,
    /// skip 标志
    pub skip: u8,
    /// 填充码表
    pub code_table: [u8; 8],
    /// 模式 5 的解码字节数
    pub decoded_size: u32,
}

impl Codec47Header {
    /// 子头部字节数
    pub const SIZE: usize = 26;

    /// 解析子头部
    pub fn parse(reader: &mut ByteReader<'_>) -> SmushResult<Self> {
        let raw: [u8; Self::SIZE] = reader.read_array().map_err(|_| {
            SmushError::MalformedHeader(format!("codec47 子头部不足 {} 字节", Self::SIZE))
        })?;
        let mut br = ByteReader::new(&raw);
        let seq = br.read_u16_le()?;
        let compression = br.read_u8()?;
        let rotate = br.read_u8()?;
        let skip = br.read_u8()?;
        br.skip(3)?;
        let code_table: [u8; 8] = br.read_array()?;
        let decoded_size = ByteReader::new(&raw[14..18]).read_u32_le()?;
        Ok(Self {
            seq,
            compression,
            rotate,
            skip,
            code_table,
            decoded_size,
        })
    }

    /// 历史帧 1 的填充字节
    pub fn fill1(&self) -> u8 {
        self.code_table[4]
    }

    /// 历史帧 2 的填充字节
    pub fn fill2(&self) -> u8 {
        self.code_table[5]
    }
}

/// codec47 解码器
pub struct Codec47Decoder {
    /// 上一帧序号, -1 表示序列刚重置
    prev_seq: i32,
    /// 字形表
    glyphs: GlyphTables,
}

impl Codec47Decoder {
    /// 创建解码器
    pub fn create() -> Box<dyn FrameDecoder> {
        Box::new(Self::new())
    }

    /// 创建解码器 (具体类型)
    pub fn new() -> Self {
        Self {
            prev_seq: -1,
            glyphs: GlyphTables::new(),
        }
    }
}

impl Default for Codec47Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for Codec47Decoder {
    fn codec_id(&self) -> CodecId {
        CodecId::Codec47
    }

    fn name(&self) -> &str {
        "codec47"
    }

    fn decode(
        &mut self,
        object: &FrameObject,
        payload: &[u8],
        buffers: &mut FrameBuffers,
    ) -> SmushResult<DecodeOutcome> {
        let mut reader = ByteReader::new(payload);
        let header = Codec47Header::parse(&mut reader)?;
        trace!(
            "codec47: seq={}, 模式={}, 轮转={}, skip={}",
            header.seq, header.compression, header.rotate, header.skip
        );

        if header.skip & 1 != 0 {
            reader.skip(SKIP_BYTES)?;
        }
        if header.seq == 0 {
            self.prev_seq = -1;
            buffers.fill_history(header.fill1(), header.fill2());
        }
        let sequential = i32::from(header.seq) == self.prev_seq + 1;

        let region = Region::from_object(object);
        let mut half_resolution = false;
        match header.compression {
            0 => decode_raw(&mut reader, buffers.target(), &region)?,
            1 => {
                decode_half(&mut reader, buffers.target(), &region)?;
                half_resolution = true;
            }
            2 => {
                if sequential {
                    let mut blocks = BlockDecoder {
                        reader: &mut reader,
                        target: buffers.target(),
                        region,
                        code_table: header.code_table,
                        glyphs: &self.glyphs,
                    };
                    blocks.decode_tiles()?;
                } else {
                    debug!(
                        "codec47: 帧序号不连续 ({} -> {}), 跳过块编码",
                        self.prev_seq, header.seq
                    );
                }
            }
            3 => buffers.copy_from_history2(),
            4 => buffers.copy_from_history1(),
            5 => {
                let target = buffers.target();
                let start = region.top * target.stride + region.left;
                let end = start
                    .saturating_add(header.decoded_size as usize)
                    .min(target.current.len());
                if end - start < header.decoded_size as usize {
                    warn!(
                        "codec47: 解码字节数 {} 超出缓冲区, 截断为 {}",
                        header.decoded_size,
                        end - start
                    );
                }
                decode_rle(&mut reader, &mut target.current[start..end])?;
            }
            other => {
                return Err(SmushError::MalformedHeader(format!(
                    "codec47 未知压缩模式: {}",
                    other
                )));
            }
        }

        let rotate = if sequential { header.rotate } else { 0 };
        self.prev_seq = i32::from(header.seq);
        Ok(DecodeOutcome {
            rotate,
            half_resolution,
        })
    }
}

/// 帧对象在画布上的区域 (右/下边界不含)
#[derive(Debug, Clone, Copy)]
struct Region {
    left: usize,
    top: usize,
    right: usize,
    bottom: usize,
}

impl Region {
    fn from_object(object: &FrameObject) -> Self {
        Self {
            left: usize::from(object.left),
            top: usize::from(object.top),
            right: object.right(),
            bottom: object.bottom(),
        }
    }

    fn width(&self) -> usize {
        self.right - self.left
    }

    fn contains(&self, x: usize, y: usize) -> bool {
        x < self.right && y < self.bottom
    }
}

fn decode_raw(
    reader: &mut ByteReader<'_>,
    target: DecodeTarget<'_>,
    region: &Region,
) -> SmushResult<()> {
    let width = region.width();
    for y in region.top..region.bottom {
        let start = y * target.stride + region.left;
        target.current[start..start + width].copy_from_slice(reader.read_bytes(width)?);
    }
    Ok(())
}

fn decode_half(
    reader: &mut ByteReader<'_>,
    target: DecodeTarget<'_>,
    region: &Region,
) -> SmushResult<()> {
    let stride = target.stride;
    for y in (region.top..region.bottom).step_by(2) {
        for x in (region.left..region.right).step_by(2) {
            let value = reader.read_u8()?;
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                if region.contains(x + dx, y + dy) {
                    target.current[(y + dy) * stride + x + dx] = value;
                }
            }
        }
    }
    Ok(())
}

/// 分块递归解码上下文
struct BlockDecoder<'r, 'a, 't> {
    reader: &'r mut ByteReader<'a>,
    target: DecodeTarget<'t>,
    region: Region,
    code_table: [u8; 8],
    glyphs: &'t GlyphTables,
}

impl BlockDecoder<'_, '_, '_> {
    /// 以 8x8 为单位遍历整个区域
    fn decode_tiles(&mut self) -> SmushResult<()> {
        for y in (self.region.top..self.region.bottom).step_by(TILE_SIZE) {
            for x in (self.region.left..self.region.right).step_by(TILE_SIZE) {
                self.process_block(x, y, TILE_SIZE)?;
            }
        }
        Ok(())
    }

    /// 写入单个像素, 区域外的写入被丢弃
    fn put(&mut self, x: usize, y: usize, value: u8) {
        if self.region.contains(x, y) {
            self.target.current[y * self.target.stride + x] = value;
        }
    }

    fn fill(&mut self, x: usize, y: usize, side: usize, value: u8) {
        for j in 0..side {
            for i in 0..side {
                self.put(x + i, y + j, value);
            }
        }
    }

    /// 解码边长为 `side` 的方块, 左上角位于画布坐标 (x, y)
    fn process_block(&mut self, x: usize, y: usize, side: usize) -> SmushResult<()> {
        let code = self.reader.read_u8()?;
        match code {
            0xFF if side == 2 => {
                let px: [u8; 4] = self.reader.read_array()?;
                self.put(x, y, px[0]);
                self.put(x + 1, y, px[1]);
                self.put(x, y + 1, px[2]);
                self.put(x + 1, y + 1, px[3]);
            }
            0xFF => {
                let half = side / 2;
                self.process_block(x, y, half)?;
                self.process_block(x + half, y, half)?;
                self.process_block(x, y + half, half)?;
                self.process_block(x + half, y + half, half)?;
            }
            0xFE => {
                let value = self.reader.read_u8()?;
                self.fill(x, y, side, value);
            }
            0xFD if side == 2 => {
                // 2x2 没有对应字形, 退化为码表填充
                self.fill(x, y, side, self.code_table[usize::from(code & 7)]);
            }
            0xFD => {
                let index = self.reader.read_u8()?;
                let colors: [u8; 2] = self.reader.read_array()?;
                let glyphs = self.glyphs;
                for j in 0..side {
                    for i in 0..side {
                        let color = if glyphs.select(side, index, i, j) {
                            colors[0]
                        } else {
                            colors[1]
                        };
                        self.put(x + i, y + j, color);
                    }
                }
            }
            0xFC => {
                let stride = self.target.stride;
                for j in 0..side {
                    for i in 0..side {
                        let offset = (y + j) * stride + x + i;
                        if let Some(&value) = self.target.history1.get(offset) {
                            self.put(x + i, y + j, value);
                        }
                    }
                }
            }
            0xF8..=0xFB => {
                self.fill(x, y, side, self.code_table[usize::from(code & 7)]);
            }
            _ => {
                let [dx, dy] = MOTION_VECTORS[usize::from(code)];
                let stride = self.target.stride as isize;
                let shift = isize::from(dx) + isize::from(dy) * stride;
                for j in 0..side {
                    for i in 0..side {
                        let offset = ((y + j) * self.target.stride + x + i) as isize + shift;
                        // 源位置越界的像素保持原值
                        let value = usize::try_from(offset)
                            .ok()
                            .and_then(|o| self.target.history2.get(o).copied());
                        if let Some(value) = value {
                            self.put(x + i, y + j, value);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
