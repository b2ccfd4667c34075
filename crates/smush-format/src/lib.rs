//! # smush-format
//!
//! SMUSH 动画解码框架容器库.
//!
//! 解析 `ANIM` 顶层块与 `AHDR` 全局头部, 逐个处理 `FRME` 帧块中的子块,
//! 把帧对象交给 `smush-codec` 中的视频解码器, 把交错音频交给 IACT 重组器,
//! 并通过 [`OutputSink`] 把视频帧与音频块交付给调用方.
//!
//! 数据只按码流顺序向前读取, 由宿主提供的 [`ReadSource`] 驱动.

pub mod chunk;
pub mod config;
pub mod decoder;
pub mod header;
pub mod io;
pub mod probe;
pub mod sink;

// 重导出常用类型
pub use chunk::{ChunkHeader, Tag};
pub use config::DecoderConfig;
pub use decoder::{AnimDecoder, FrameFlags, FrameInfo};
pub use header::AnimHeader;
pub use io::{ByteCursor, CallbackSource, FileSource, MemorySource, ReadSource, ReaderSource};
pub use probe::{ProbeScore, SCORE_EXTENSION, SCORE_MAX, probe};
pub use sink::{CallbackSink, OutputSink, TextResource};
