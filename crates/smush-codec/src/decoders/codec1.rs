//! codec1 / codec3 解码器.
//!
//! 逐行 RLE: 每行以一个 u16le 行长度开头, 后跟该行的游程数据.
//! 行长度只用于对齐码流, 行内解码到区域宽度为止, 多余字节跳过.
//! 两种编码都按不透明处理, 索引 0 与其他颜色一样写入.
//! 本编码不使用历史帧, 轮转码恒为 0.

use log::trace;
use smush_core::{ByteReader, SmushResult};

use crate::codec_id::CodecId;
use crate::decoder::{DecodeOutcome, FrameDecoder, FrameObject};
use crate::frame_buffers::FrameBuffers;
use crate::rle::decode_rle;

/// codec1 / codec3 解码器
pub struct Codec1Decoder {
    codec: CodecId,
}

impl Codec1Decoder {
    /// 创建解码器 (codec1 与 codec3 共用同一实现)
    pub fn create(codec: CodecId) -> Box<dyn FrameDecoder> {
        Box::new(Self { codec })
    }
}

impl FrameDecoder for Codec1Decoder {
    fn codec_id(&self) -> CodecId {
        self.codec
    }

    fn name(&self) -> &str {
        self.codec.name()
    }

    fn decode(
        &mut self,
        object: &FrameObject,
        payload: &[u8],
        buffers: &mut FrameBuffers,
    ) -> SmushResult<DecodeOutcome> {
        let stride = buffers.width();
        let left = usize::from(object.left);
        let top = usize::from(object.top);
        let width = usize::from(object.width);
        let current = buffers.current_mut();

        let mut reader = ByteReader::new(payload);
        for row in 0..usize::from(object.height) {
            let line_size = usize::from(reader.read_u16_le()?);
            let mut line = ByteReader::new(reader.read_bytes(line_size)?);
            let start = (top + row) * stride + left;
            decode_rle(&mut line, &mut current[start..start + width])?;
            if !line.is_empty() {
                trace!("{}: 第 {} 行剩余 {} 字节未用", self.codec, row, line.remaining());
            }
        }
        Ok(DecodeOutcome::default())
    }
}
