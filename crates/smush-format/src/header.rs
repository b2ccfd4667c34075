//! AHDR 全局头部.
//!
//! 布局 (小端):
//! ```text
//! version u16, frame_count u16, reserved u16, palette [u8; 768]
//! 可选: frame_rate u32, max_frame_size u32, sample_rate u32, reserved u32, reserved u32
//! ```
//! 可选字段只在块内剩余不少于 4 字节时读取.

use log::debug;
use smush_core::{Palette, SmushError, SmushResult};

use crate::io::ByteCursor;

/// 全局头部
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimHeader {
    /// 格式版本
    pub version: u16,
    /// 声明的帧数
    pub frame_count: u16,
    /// 初始调色板
    pub palette: Palette,
    /// 帧率 (头部未携带时为 None)
    pub frame_rate: Option<u32>,
    /// 最大帧字节数
    pub max_frame_size: Option<u32>,
    /// 音频采样率
    pub sample_rate: Option<u32>,
}

impl AnimHeader {
    /// 头部最小字节数 (固定字段 + 调色板)
    pub const MIN_SIZE: u32 = 6 + 768;

    /// 在已开始跟踪的 AHDR 块内解析头部
    ///
    /// `size` 为块声明大小; 未读完的字节由调用方排空.
    pub fn read(cursor: &mut ByteCursor, size: u32) -> SmushResult<Self> {
        if size < Self::MIN_SIZE {
            return Err(SmushError::MalformedHeader(format!(
                "AHDR 大小 {} 小于最小值 {}",
                size,
                Self::MIN_SIZE
            )));
        }
        let version = cursor.read_u16_le()?;
        let frame_count = cursor.read_u16_le()?;
        let _reserved = cursor.read_u16_le()?;
        let rgb: [u8; 768] = cursor.read_array()?;
        let palette = Palette::from_rgb(&rgb);

        let mut optional = [None; 5];
        for slot in optional.iter_mut() {
            if cursor.remaining_in_chunk().unwrap_or(0) < 4 {
                break;
            }
            *slot = Some(cursor.read_u32_le()?);
        }
        let [frame_rate, max_frame_size, sample_rate, _, _] = optional;

        debug!(
            "AHDR: 版本={}, 帧数={}, 帧率={:?}, 最大帧={:?}, 采样率={:?}",
            version, frame_count, frame_rate, max_frame_size, sample_rate
        );
        Ok(Self {
            version,
            frame_count,
            palette,
            frame_rate,
            max_frame_size,
            sample_rate,
        })
    }
}
