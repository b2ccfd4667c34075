//! 帧解码器 trait 定义.
//!
//! 容器状态机把帧对象 (FOBJ) 的头部解析为 [`FrameObject`], 负载原样交给对应的
//! [`FrameDecoder`], 解码结果直接写入共享的 [`FrameBuffers`].

use smush_core::{ByteReader, SmushError, SmushResult};

use crate::codec_id::CodecId;
use crate::frame_buffers::FrameBuffers;

/// 帧对象头部
///
/// 布局 (14 字节, 小端):
/// ```text
/// codec u16, left u16, top u16, width u16, height u16, reserved u16, reserved u16
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameObject {
    /// 编解码器
    pub codec: CodecId,
    /// 区域左边界
    pub left: u16,
    /// 区域上边界
    pub top: u16,
    /// 区域宽度
    pub width: u16,
    /// 区域高度
    pub height: u16,
}

impl FrameObject {
    /// 头部字节数
    pub const HEADER_SIZE: usize = 14;

    /// 解析帧对象头部
    pub fn parse(reader: &mut ByteReader<'_>) -> SmushResult<Self> {
        let raw_codec = reader.read_u16_le()?;
        let left = reader.read_u16_le()?;
        let top = reader.read_u16_le()?;
        let width = reader.read_u16_le()?;
        let height = reader.read_u16_le()?;
        reader.skip(4)?;
        let codec = CodecId::from_raw(raw_codec).ok_or(SmushError::UnsupportedCodec(raw_codec))?;
        Ok(Self {
            codec,
            left,
            top,
            width,
            height,
        })
    }

    /// 区域右边界 (不含)
    pub fn right(&self) -> usize {
        usize::from(self.left) + usize::from(self.width)
    }

    /// 区域下边界 (不含)
    pub fn bottom(&self) -> usize {
        usize::from(self.top) + usize::from(self.height)
    }

    /// 区域是否为空
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// 单帧解码结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// 帧输出后的缓冲区轮转码 (0 = 不轮转)
    pub rotate: u8,
    /// 是否为半分辨率帧
    pub half_resolution: bool,
}

/// 帧解码器 trait
///
/// 解码器只在调用方提供的缓冲区上工作, 不持有像素内存.
pub trait FrameDecoder: Send {
    /// 获取解码器标识
    fn codec_id(&self) -> CodecId;

    /// 获取解码器名称
    fn name(&self) -> &str;

    /// 解码一个帧对象的负载到当前缓冲区
    ///
    /// 调用前缓冲区已保证覆盖 `object` 描述的区域.
    fn decode(
        &mut self,
        object: &FrameObject,
        payload: &[u8],
        buffers: &mut FrameBuffers,
    ) -> SmushResult<DecodeOutcome>;
}
