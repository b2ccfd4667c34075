//! 解码器实现模块.

pub mod codec1;
pub mod codec47;
pub mod iact;

use crate::codec_id::CodecId;
use crate::decoder::FrameDecoder;

/// 按编解码器标识创建视频解码器
pub fn create_decoder(codec: CodecId) -> Box<dyn FrameDecoder> {
    match codec {
        CodecId::Codec1 | CodecId::Codec3 => codec1::Codec1Decoder::create(codec),
        CodecId::Codec47 => codec47::Codec47Decoder::create(),
    }
}
