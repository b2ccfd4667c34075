//! 编解码器标识符.
//!
//! 帧对象 (FOBJ) 头部携带一个 16 位编解码器编号, 本模块将其映射为强类型枚举.

use std::fmt;

/// 编解码器标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    /// codec1: 逐行 RLE
    Codec1,
    /// codec3: 与 codec1 相同的逐行 RLE
    Codec3,
    /// codec47: 可变块运动补偿/字形编码
    Codec47,
}

impl CodecId {
    /// 从码流中的编号解析, 不支持的编号返回 None
    pub const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            1 => Some(Self::Codec1),
            3 => Some(Self::Codec3),
            47 => Some(Self::Codec47),
            _ => None,
        }
    }

    /// 码流中的编号
    pub const fn raw(&self) -> u16 {
        match self {
            Self::Codec1 => 1,
            Self::Codec3 => 3,
            Self::Codec47 => 47,
        }
    }

    /// 获取编解码器的人类可读名称
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Codec1 => "codec1",
            Self::Codec3 => "codec3",
            Self::Codec47 => "codec47",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
