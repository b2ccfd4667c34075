//! 调色板.
//!
//! 固定 256 项颜色表, 每项打包为 32 位 `0xAARRGGBB`, Alpha 恒为不透明.
//! 支持整表替换 (NPAL) 与基于暂存增量表的平滑渐变 (XPAL).

use log::trace;

/// 调色板项数
pub const PALETTE_SIZE: usize = 256;

/// 增量暂存表长度 (每项 3 个通道)
pub const DELTA_TABLE_SIZE: usize = PALETTE_SIZE * 3;

/// 不透明 Alpha
const OPAQUE: u32 = 0xFF00_0000;

/// 将 RGB 打包为不透明的 32 位颜色
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    OPAQUE | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// 饱和到 [0, 255]
pub fn clip_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// 256 项颜色表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [u32; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    /// 创建全黑 (不透明) 调色板
    pub fn new() -> Self {
        Self {
            entries: [OPAQUE; PALETTE_SIZE],
        }
    }

    /// 从 RGB 三元组数据创建
    pub fn from_rgb(rgb: &[u8]) -> Self {
        let mut pal = Self::new();
        pal.set_from_rgb(rgb);
        pal
    }

    /// 用 RGB 三元组整表替换
    ///
    /// 取 `rgb.len() / 3` 个三元组 (最多 256 个), 余下的不足一组的字节忽略.
    /// 未覆盖的表项置为黑色.
    pub fn set_from_rgb(&mut self, rgb: &[u8]) {
        let count = (rgb.len() / 3).min(PALETTE_SIZE);
        if count < PALETTE_SIZE {
            trace!("调色板部分更新: {} 项, 其余置黑", count);
        }
        for (i, entry) in self.entries.iter_mut().enumerate() {
            *entry = if i < count {
                pack_rgb(rgb[i * 3], rgb[i * 3 + 1], rgb[i * 3 + 2])
            } else {
                OPAQUE
            };
        }
    }

    /// 全部置为黑色
    pub fn clear(&mut self) {
        self.entries = [OPAQUE; PALETTE_SIZE];
    }

    /// 应用暂存增量: `clip_u8((c * 129 + delta) >> 7)`
    pub fn apply_delta(&mut self, delta: &[i16; DELTA_TABLE_SIZE]) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            let [r, g, b] = unpack(*entry);
            let step = |c: u8, d: i16| clip_u8((i32::from(c) * 129 + i32::from(d)) >> 7);
            *entry = pack_rgb(
                step(r, delta[i * 3]),
                step(g, delta[i * 3 + 1]),
                step(b, delta[i * 3 + 2]),
            );
        }
    }

    /// 获取全部表项
    pub fn entries(&self) -> &[u32; PALETTE_SIZE] {
        &self.entries
    }

    /// 获取指定表项的 RGB 分量
    pub fn rgb(&self, index: u8) -> [u8; 3] {
        unpack(self.entries[usize::from(index)])
    }
}

fn unpack(entry: u32) -> [u8; 3] {
    [(entry >> 16) as u8, (entry >> 8) as u8, entry as u8]
}
