//! # smush-codec
//!
//! SMUSH 动画解码框架编解码器库, 提供帧对象解码器与交错音频重组.
//!
//! ## 支持的编解码器
//!
//! - **视频**: codec1 / codec3 (逐行 RLE), codec47 (可变块运动补偿 + 双色字形)
//! - **音频**: IACT (跨块重组的 8 位增量编码, 输出 16 位立体声 PCM)
//!
//! 视频解码器在四缓冲区 [`FrameBuffers`] 上工作: 当前帧、两个历史帧与一个存取辅助帧.
//! 帧间轮转只交换缓冲区所有权, 不复制像素.

pub mod codec_id;
pub mod decoder;
pub mod decoders;
pub mod frame;
pub mod frame_buffers;
pub mod glyph;
pub mod rle;
pub mod tables;

// 重导出常用类型
pub use codec_id::CodecId;
pub use decoder::{DecodeOutcome, FrameDecoder, FrameObject};
pub use decoders::codec1::Codec1Decoder;
pub use decoders::codec47::{Codec47Decoder, Codec47Header};
pub use decoders::create_decoder;
pub use decoders::iact::{IACT_BLOCK_SIZE, IactHeader, IactReassembler};
pub use frame::{AudioBlock, VideoFrame};
pub use frame_buffers::{DecodeTarget, FrameBuffers};
pub use glyph::GlyphTables;
