//! # smush
//!
//! 纯 Rust 实现的 SMUSH (ANIM/SAN) 动画解码框架.
//!
//! 解码器按码流顺序读取 `ANIM` 容器, 每调用一次解码一个 `FRME` 帧块:
//! - **视频**: codec47 (分块运动补偿) 与 codec1/codec3 (逐行 RLE), 输出 8 位索引色画面
//! - **音频**: IACT 交错音频重组为固定 4096 字节的 16 位立体声 PCM 块
//! - **调色板**: NPAL 整表替换与 XPAL 增量渐变
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use smush::format::CallbackSink;
//!
//! let mut decoder = smush::open_file("intro.san").unwrap();
//! println!("帧率: {} fps", decoder.frame_rate());
//!
//! let mut frames = 0;
//! let mut sink = CallbackSink::new(|_video| frames += 1, |_audio| {});
//! while decoder.decode_next_frame(&mut sink).is_ok() {}
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `smush-core` | 错误类型、字节读取器、调色板 |
//! | `smush-codec` | 帧解码器、字形表、IACT 音频重组 |
//! | `smush-format` | ANIM 容器状态机、数据源、输出接收端 |

/// 核心类型与工具
pub use smush_core as core;

/// 帧解码器与音频重组
pub use smush_codec as codec;

/// 容器状态机
pub use smush_format as format;

pub use smush_core::{SmushError, SmushResult};
pub use smush_format::{AnimDecoder, DecoderConfig, OutputSink};

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 以默认配置打开文件并解析全局头部
pub fn open_file(path: impl AsRef<std::path::Path>) -> SmushResult<AnimDecoder> {
    AnimDecoder::open_file(path, DecoderConfig::default())
}
