//! 块标签与块头部.
//!
//! 每个块以 8 字节头部开始: 4 字节 ASCII 标签 + 4 字节大端大小.
//! 块在流中按偶数字节对齐, 奇数大小的块后跟 1 个填充字节.

use std::fmt;

use smush_core::SmushResult;

use crate::io::ByteCursor;

/// 4 字节块标签
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    /// 顶层动画容器
    pub const ANIM: Tag = Tag(*b"ANIM");
    /// 全局头部
    pub const AHDR: Tag = Tag(*b"AHDR");
    /// 帧
    pub const FRME: Tag = Tag(*b"FRME");
    /// 整表调色板
    pub const NPAL: Tag = Tag(*b"NPAL");
    /// 增量调色板
    pub const XPAL: Tag = Tag(*b"XPAL");
    /// 帧对象 (视频)
    pub const FOBJ: Tag = Tag(*b"FOBJ");
    /// 交错音频
    pub const IACT: Tag = Tag(*b"IACT");
    /// 字幕/文本资源
    pub const TRES: Tag = Tag(*b"TRES");
    /// 保存当前帧到辅助缓冲区
    pub const STOR: Tag = Tag(*b"STOR");
    /// 从辅助缓冲区恢复当前帧
    pub const FTCH: Tag = Tag(*b"FTCH");

    /// 标签的可读形式
    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.as_str())
    }
}

/// 块头部
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// 标签
    pub tag: Tag,
    /// 声明的负载大小 (不含头部与填充)
    pub size: u32,
}

impl ChunkHeader {
    /// 头部字节数
    pub const SIZE: u64 = 8;

    /// 读取块头部
    pub fn read(cursor: &mut ByteCursor) -> SmushResult<Self> {
        let tag = Tag(cursor.read_tag()?);
        let size = cursor.read_u32_be()?;
        Ok(Self { tag, size })
    }

    /// 读取块头部, 流在头部开始处结束时返回 None
    pub fn try_read(cursor: &mut ByteCursor) -> SmushResult<Option<Self>> {
        let mut raw = [0u8; 8];
        if !cursor.try_read_exact(&mut raw)? {
            return Ok(None);
        }
        let tag = Tag([raw[0], raw[1], raw[2], raw[3]]);
        let size = u32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]);
        Ok(Some(Self { tag, size }))
    }

    /// 负载大小加上对齐填充
    pub fn padded_size(&self) -> u64 {
        u64::from(self.size) + u64::from(self.size & 1)
    }
}
