//! 解码输出视图.
//!
//! 视频帧与音频块都以借用形式交给调用方, 只在回调执行期间有效.
//! 回调返回后解码器可能改写或轮转底层缓冲区, 需要保留数据的调用方应自行复制.

use smush_core::Palette;

use crate::decoders::iact::IACT_BLOCK_SIZE;

/// 视频帧视图 (8 位索引色)
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
    /// 像素数据, 每像素 1 字节, 行跨度等于宽度
    pub data: &'a [u8],
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// 当前调色板快照
    pub palette: &'a Palette,
    /// 子图像标识 (1 = 半分辨率帧, 0 = 常规帧)
    pub sub_image: u16,
}

impl VideoFrame<'_> {
    /// 缓冲区字节数
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 读取指定坐标的调色板索引
    pub fn index_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }

    /// 读取指定坐标的 RGB 颜色
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        self.index_at(x, y).map(|i| self.palette.rgb(i))
    }
}

/// 音频块视图 (16 位小端交错立体声 PCM)
#[derive(Debug, Clone, Copy)]
pub struct AudioBlock<'a> {
    /// PCM 数据, 固定 4096 字节
    pub data: &'a [u8; IACT_BLOCK_SIZE],
    /// 采样率 (Hz)
    pub sample_rate: u32,
}

impl AudioBlock<'_> {
    /// 声道数
    pub const CHANNELS: u32 = 2;

    /// 每声道采样数
    pub fn nb_samples(&self) -> u32 {
        (IACT_BLOCK_SIZE / 2) as u32 / Self::CHANNELS
    }

    /// 逐个读取交错采样
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_视频帧坐标访问() {
        let mut rgb = vec![0u8; 768];
        rgb[9..12].copy_from_slice(&[1, 2, 3]);
        let palette = Palette::from_rgb(&rgb);
        let data = [0u8, 1, 2, 3, 4, 5];
        let frame = VideoFrame {
            data: &data,
            width: 3,
            height: 2,
            palette: &palette,
            sub_image: 0,
        };
        assert_eq!(frame.size(), 6);
        assert_eq!(frame.index_at(0, 1), Some(3));
        assert_eq!(frame.rgb_at(0, 1), Some([1, 2, 3]));
        assert_eq!(frame.index_at(3, 0), None);
    }

    #[test]
    fn test_音频块采样() {
        let mut data = [0u8; IACT_BLOCK_SIZE];
        data[0..2].copy_from_slice(&(-2i16).to_le_bytes());
        let block = AudioBlock {
            data: &data,
            sample_rate: 22050,
        };
        assert_eq!(block.nb_samples(), 1024);
        assert_eq!(block.samples().count(), 2048);
        assert_eq!(block.samples().next(), Some(-2));
    }
}
