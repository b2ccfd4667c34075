//! 双色字形模板表.
//!
//! 对 4x4 与 8x8 两种尺寸, 各取 16 个边界点两两组合 (共 256 个字形):
//! 判断两个端点所在的边, 由边的组合决定填充方向, 沿两点连线插值,
//! 再从每个插值点出发按方向填满整行或整列.
//! 生成过程与输入无关, 每个解码器只构建一次.

use crate::tables::{GLYPH4_X, GLYPH4_Y, GLYPH8_X, GLYPH8_Y};

/// 字形数量 (16 x 16 个端点组合)
pub const GLYPH_COUNT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Left,
    Top,
    Right,
    Bottom,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Up,
    Right,
    Down,
    None,
}

fn which_edge(x: i32, y: i32, side: i32) -> Edge {
    let max = side - 1;
    if y == 0 {
        Edge::Bottom
    } else if y == max {
        Edge::Top
    } else if x == 0 {
        Edge::Left
    } else if x == max {
        Edge::Right
    } else {
        Edge::None
    }
}

fn which_direction(e0: Edge, e1: Edge) -> Direction {
    use Edge::*;
    if (e0 == Left && e1 == Right)
        || (e1 == Left && e0 == Right)
        || (e0 == Bottom && e1 != Top)
        || (e1 == Bottom && e0 != Top)
    {
        Direction::Up
    } else if (e0 == Top && e1 != Bottom) || (e1 == Top && e0 != Bottom) {
        Direction::Down
    } else if (e0 == Left && e1 != Right) || (e1 == Left && e0 != Right) {
        Direction::Left
    } else if (e0 == Top && e1 == Bottom)
        || (e1 == Top && e0 == Bottom)
        || (e0 == Right && e1 != Left)
        || (e1 == Right && e0 != Left)
    {
        Direction::Right
    } else {
        Direction::None
    }
}

/// 两点连线上的第 `pos` 个插值点 (共 `npoints + 1` 个, 从终点走向起点)
fn interp_point(p0: (i32, i32), p1: (i32, i32), pos: i32, npoints: i32) -> (i32, i32) {
    if npoints == 0 {
        return p0;
    }
    let half = npoints >> 1;
    (
        (p0.0 * pos + p1.0 * (npoints - pos) + half) / npoints,
        (p0.1 * pos + p1.1 * (npoints - pos) + half) / npoints,
    )
}

fn make_glyphs<const N: usize>(xs: &[u8; 16], ys: &[u8; 16], side: usize) -> Vec<[u8; N]> {
    debug_assert_eq!(side * side, N);
    let s = side as i32;
    let mut glyphs = Vec::with_capacity(GLYPH_COUNT);
    for i in 0..16 {
        let p0 = (i32::from(xs[i]), i32::from(ys[i]));
        let e0 = which_edge(p0.0, p0.1, s);
        for j in 0..16 {
            let p1 = (i32::from(xs[j]), i32::from(ys[j]));
            let e1 = which_edge(p1.0, p1.1, s);
            let dir = which_direction(e0, e1);
            let npoints = (p1.0 - p0.0).abs().max((p1.1 - p0.1).abs());

            let mut glyph = [0u8; N];
            for pos in 0..=npoints {
                let (px, py) = interp_point(p0, p1, pos, npoints);
                let (px, py) = (px as usize, py as usize);
                match dir {
                    Direction::Up => (0..=py).for_each(|row| glyph[px + row * side] = 1),
                    Direction::Down => (py..side).for_each(|row| glyph[px + row * side] = 1),
                    Direction::Left => (0..=px).for_each(|col| glyph[col + py * side] = 1),
                    Direction::Right => (px..side).for_each(|col| glyph[col + py * side] = 1),
                    Direction::None => {}
                }
            }
            glyphs.push(glyph);
        }
    }
    glyphs
}

/// 4x4 与 8x8 字形表
///
/// 每个字形按行优先存储, 值为 1 的像素取第一种颜色, 0 取第二种.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphTables {
    small: Vec<[u8; 16]>,
    big: Vec<[u8; 64]>,
}

impl Default for GlyphTables {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphTables {
    /// 生成两张字形表
    pub fn new() -> Self {
        Self {
            small: make_glyphs(&GLYPH4_X, &GLYPH4_Y, 4),
            big: make_glyphs(&GLYPH8_X, &GLYPH8_Y, 8),
        }
    }

    /// 4x4 字形
    pub fn glyph4(&self, index: u8) -> &[u8; 16] {
        &self.small[usize::from(index)]
    }

    /// 8x8 字形
    pub fn glyph8(&self, index: u8) -> &[u8; 64] {
        &self.big[usize::from(index)]
    }

    /// 按块边长取字形中 (x, y) 处的选择位
    ///
    /// 边长 4 用 4x4 表, 其余用 8x8 表做最近邻缩放.
    pub fn select(&self, side: usize, index: u8, x: usize, y: usize) -> bool {
        match side {
            4 => self.glyph4(index)[y * 4 + x] != 0,
            8 => self.glyph8(index)[y * 8 + x] != 0,
            _ => {
                let gx = x * 8 / side;
                let gy = y * 8 / side;
                self.glyph8(index)[gy * 8 + gx] != 0
            }
        }
    }
}
