//! 解码输出接收端.
//!
//! 解码器通过 [`OutputSink`] 把视频帧与音频块交给调用方. 两者都是借用视图,
//! 只在回调执行期间有效.

use smush_codec::{AudioBlock, VideoFrame};
use smush_core::{ByteReader, SmushResult};

/// 文本资源 (TRES 块)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextResource {
    /// 显示位置 x
    pub x: u16,
    /// 显示位置 y
    pub y: u16,
    /// 对齐/样式标志
    pub flags: u16,
    /// 裁剪区域左边界
    pub clip_left: u16,
    /// 裁剪区域上边界
    pub clip_top: u16,
    /// 裁剪区域宽度
    pub clip_width: u16,
    /// 裁剪区域高度
    pub clip_height: u16,
    /// 保留
    pub reserved: u16,
    /// 字符串编号
    pub string_id: u16,
}

impl TextResource {
    /// 字段总字节数
    pub const SIZE: usize = 18;

    /// 解析文本资源, 数据不足 18 字节时返回 None
    pub fn parse(data: &[u8]) -> SmushResult<Option<Self>> {
        if data.len() < Self::SIZE {
            return Ok(None);
        }
        let mut br = ByteReader::new(data);
        Ok(Some(Self {
            x: br.read_u16_le()?,
            y: br.read_u16_le()?,
            flags: br.read_u16_le()?,
            clip_left: br.read_u16_le()?,
            clip_top: br.read_u16_le()?,
            clip_width: br.read_u16_le()?,
            clip_height: br.read_u16_le()?,
            reserved: br.read_u16_le()?,
            string_id: br.read_u16_le()?,
        }))
    }
}

/// 解码输出接收端 trait
pub trait OutputSink {
    /// 一帧视频解码完成 (每帧恰好一次)
    fn video_frame(&mut self, frame: &VideoFrame<'_>);

    /// 一个音频块解码完成 (每帧零次或多次, 按码流顺序)
    fn audio_block(&mut self, block: &AudioBlock<'_>);

    /// 遇到文本资源
    fn subtitle(&mut self, _text: &TextResource) {}
}

/// 由两个闭包组成的接收端
pub struct CallbackSink<V, A> {
    video: V,
    audio: A,
}

impl<V, A> CallbackSink<V, A>
where
    V: FnMut(&VideoFrame<'_>),
    A: FnMut(&AudioBlock<'_>),
{
    /// 用视频与音频回调创建
    pub fn new(video: V, audio: A) -> Self {
        Self { video, audio }
    }
}

impl<V, A> OutputSink for CallbackSink<V, A>
where
    V: FnMut(&VideoFrame<'_>),
    A: FnMut(&AudioBlock<'_>),
{
    fn video_frame(&mut self, frame: &VideoFrame<'_>) {
        (self.video)(frame)
    }

    fn audio_block(&mut self, block: &AudioBlock<'_>) {
        (self.audio)(block)
    }
}
