//! 四缓冲区画布.
//!
//! 画布由四个等大的 8 位像素缓冲区组成:
//! - `current`: 当前正在解码/输出的帧
//! - `history1` / `history2`: 历史帧, codec47 以身份 (而非内容) 引用它们
//! - `aux`: STOR/FTCH 使用的存取缓冲区
//!
//! 轮转只交换 `Vec` 句柄, 不复制像素. 扩容时四个缓冲区一起重新分配,
//! 旧内容按新的行跨度逐行搬入左上角, 同一帧内先解码的帧对象不会丢失.

use std::mem;

use log::debug;
use smush_core::{SmushError, SmushResult};

/// codec47 解码时使用的缓冲区视图
pub struct DecodeTarget<'a> {
    /// 当前帧 (可写)
    pub current: &'a mut [u8],
    /// 历史帧 1 (只读)
    pub history1: &'a [u8],
    /// 历史帧 2 (只读)
    pub history2: &'a [u8],
    /// 行跨度 (等于画布宽度)
    pub stride: usize,
}

/// 四缓冲区画布
#[derive(Debug)]
pub struct FrameBuffers {
    current: Vec<u8>,
    history1: Vec<u8>,
    history2: Vec<u8>,
    aux: Vec<u8>,
    width: usize,
    height: usize,
    max_width: usize,
    max_height: usize,
}

impl Default for FrameBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffers {
    /// 创建空画布 (不分配像素内存, 尺寸不设上限)
    pub fn new() -> Self {
        Self::with_limits(usize::MAX, usize::MAX)
    }

    /// 创建带尺寸上限的空画布
    pub fn with_limits(max_width: usize, max_height: usize) -> Self {
        Self {
            current: Vec::new(),
            history1: Vec::new(),
            history2: Vec::new(),
            aux: Vec::new(),
            width: 0,
            height: 0,
            max_width,
            max_height,
        }
    }

    /// 画布宽度
    pub fn width(&self) -> usize {
        self.width
    }

    /// 画布高度
    pub fn height(&self) -> usize {
        self.height
    }

    /// 每个缓冲区的字节数
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// 是否尚未分配
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// 确保画布至少为 `width x height`
    ///
    /// 需要扩容时按分量取最大值, 四个缓冲区一起重新分配, 旧像素逐行搬入,
    /// 新增区域为 0. 返回是否发生了重新分配.
    pub fn ensure_size(&mut self, width: usize, height: usize) -> SmushResult<bool> {
        if width <= self.width && height <= self.height {
            return Ok(false);
        }
        let new_width = width.max(self.width);
        let new_height = height.max(self.height);
        if new_width > self.max_width || new_height > self.max_height {
            return Err(SmushError::AllocationFailure(format!(
                "画布 {}x{} 超出上限 {}x{}",
                new_width, new_height, self.max_width, self.max_height
            )));
        }
        let len = new_width.checked_mul(new_height).ok_or_else(|| {
            SmushError::AllocationFailure(format!("画布 {}x{} 尺寸溢出", new_width, new_height))
        })?;

        // 先全部分配成功再替换, 失败时旧画布保持不变
        let mut planes = [
            alloc_plane(len)?,
            alloc_plane(len)?,
            alloc_plane(len)?,
            alloc_plane(len)?,
        ];
        let old = [&self.current, &self.history1, &self.history2, &self.aux];
        for (plane, old) in planes.iter_mut().zip(old) {
            relayout(old, self.width, plane, new_width);
        }
        let [current, history1, history2, aux] = planes;
        self.current = current;
        self.history1 = history1;
        self.history2 = history2;
        self.aux = aux;
        self.width = new_width;
        self.height = new_height;

        debug!("画布扩容: {}x{} ({} 字节 x 4)", new_width, new_height, len);
        Ok(true)
    }

    /// 当前帧
    pub fn current(&self) -> &[u8] {
        &self.current
    }

    /// 当前帧 (可写)
    pub fn current_mut(&mut self) -> &mut [u8] {
        &mut self.current
    }

    /// 历史帧 1
    pub fn history1(&self) -> &[u8] {
        &self.history1
    }

    /// 历史帧 2
    pub fn history2(&self) -> &[u8] {
        &self.history2
    }

    /// 存取辅助帧
    pub fn aux(&self) -> &[u8] {
        &self.aux
    }

    /// 同时借出当前帧 (可写) 与两个历史帧 (只读)
    pub fn target(&mut self) -> DecodeTarget<'_> {
        DecodeTarget {
            current: &mut self.current,
            history1: &self.history1,
            history2: &self.history2,
            stride: self.width,
        }
    }

    /// 用两个字节分别填充两个历史帧
    pub fn fill_history(&mut self, value1: u8, value2: u8) {
        self.history1.fill(value1);
        self.history2.fill(value2);
    }

    /// 整帧复制历史帧 1 到当前帧
    pub fn copy_from_history1(&mut self) {
        self.current.copy_from_slice(&self.history1);
    }

    /// 整帧复制历史帧 2 到当前帧
    pub fn copy_from_history2(&mut self) {
        self.current.copy_from_slice(&self.history2);
    }

    /// 把当前帧快照到辅助帧 (STOR)
    pub fn store(&mut self) {
        self.aux.copy_from_slice(&self.current);
    }

    /// 从辅助帧恢复当前帧 (FTCH)
    pub fn fetch(&mut self) {
        self.current.copy_from_slice(&self.aux);
    }

    /// 帧输出后的缓冲区轮转
    ///
    /// - 1: 交换历史帧 2 与当前帧
    /// - 2: 先交换两个历史帧, 再交换历史帧 2 与当前帧
    /// - 其他: 不轮转
    pub fn rotate(&mut self, code: u8) {
        match code {
            1 => mem::swap(&mut self.history2, &mut self.current),
            2 => {
                mem::swap(&mut self.history1, &mut self.history2);
                mem::swap(&mut self.history2, &mut self.current);
            }
            _ => {}
        }
    }
}

/// 把行跨度为 `old_width` 的旧平面逐行复制到行跨度为 `new_width` 的新平面
fn relayout(old: &[u8], old_width: usize, new: &mut [u8], new_width: usize) {
    if old_width == 0 {
        return;
    }
    for (y, row) in old.chunks_exact(old_width).enumerate() {
        let start = y * new_width;
        new[start..start + old_width].copy_from_slice(row);
    }
}

fn alloc_plane(len: usize) -> SmushResult<Vec<u8>> {
    let mut plane = Vec::new();
    plane
        .try_reserve_exact(len)
        .map_err(|e| SmushError::AllocationFailure(format!("无法分配 {} 字节像素缓冲: {}", len, e)))?;
    plane.resize(len, 0);
    Ok(plane)
}
