//! 解码器配置.

/// 动画解码器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// 画布最大宽度, 超出时报分配失败
    pub max_width: u32,
    /// 画布最大高度
    pub max_height: u32,
    /// 头部未携带帧率时使用的默认帧率
    pub default_frame_rate: u32,
    /// 头部未携带采样率时使用的默认采样率
    pub default_sample_rate: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_width: 4096,
            max_height: 4096,
            default_frame_rate: 15,
            default_sample_rate: 22050,
        }
    }
}

impl DecoderConfig {
    /// 设置画布尺寸上限
    pub fn with_max_canvas(mut self, width: u32, height: u32) -> Self {
        self.max_width = width;
        self.max_height = height;
        self
    }

    /// 设置默认帧率
    pub fn with_default_frame_rate(mut self, fps: u32) -> Self {
        self.default_frame_rate = fps;
        self
    }

    /// 设置默认采样率
    pub fn with_default_sample_rate(mut self, rate: u32) -> Self {
        self.default_sample_rate = rate;
        self
    }
}
