//! 只进数据源与字节游标.
//!
//! 解码器从不定位 (seek), 只按码流顺序向前读取. 宿主通过 [`ReadSource`]
//! 提供数据, 支持 "丢弃 N 字节而不复制" 的操作.
//! [`ByteCursor`] 在数据源之上跟踪当前块的剩余字节数, 并提供定长整数读取.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use log::trace;
use smush_core::{SmushError, SmushResult};

/// 丢弃数据时使用的临时缓冲区大小
const DISCARD_CHUNK: usize = 4096;

/// 读取大块负载时每次扩容的字节数
pub const READ_STEP: usize = 64 * 1024;

/// 只进数据源 trait
///
/// 实现此 trait 以支持不同的数据来源 (内存、文件、宿主回调等).
pub trait ReadSource: Send {
    /// 读取数据到 `buf`, 返回实际读取的字节数 (0 表示流结束)
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// 丢弃 `count` 字节, 返回实际丢弃的字节数
    ///
    /// 默认实现逐块读入临时缓冲区后丢弃.
    fn discard(&mut self, count: usize) -> io::Result<usize> {
        let mut scratch = [0u8; DISCARD_CHUNK];
        let mut done = 0;
        while done < count {
            let want = (count - done).min(DISCARD_CHUNK);
            let n = self.read(&mut scratch[..want])?;
            if n == 0 {
                break;
            }
            done += n;
        }
        Ok(done)
    }
}

/// 内存数据源
///
/// 用于测试和已载入内存的文件.
pub struct MemorySource {
    /// 数据缓冲区
    data: Vec<u8>,
    /// 当前位置
    pos: usize,
}

impl MemorySource {
    /// 从已有数据创建
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// 剩余未读字节数
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl ReadSource for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn discard(&mut self, count: usize) -> io::Result<usize> {
        let n = count.min(self.remaining());
        self.pos += n;
        Ok(n)
    }
}

/// 基于 [`std::io::Read`] 的数据源 (文件、标准输入等)
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: Read + Send> ReaderSource<R> {
    /// 包装一个读取器
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read + Send> ReadSource for ReaderSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // 底层读取器可能分多次返回, 循环直到读满或遇到流结束
        let mut total = 0;
        while total < buf.len() {
            match self.inner.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}

/// 文件数据源
pub type FileSource = ReaderSource<BufReader<File>>;

impl FileSource {
    /// 以只读方式打开文件
    pub fn open(path: impl AsRef<Path>) -> SmushResult<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

/// 宿主回调数据源
///
/// 回调形如 `read(destination, byte_count) -> bytes_read`, 其中
/// `destination` 为 `None` 表示丢弃 `byte_count` 字节而不复制.
pub struct CallbackSource<F> {
    callback: F,
}

impl<F> CallbackSource<F>
where
    F: FnMut(Option<&mut [u8]>, usize) -> usize + Send,
{
    /// 包装宿主回调
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ReadSource for CallbackSource<F>
where
    F: FnMut(Option<&mut [u8]>, usize) -> usize + Send,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        Ok((self.callback)(Some(buf), len).min(len))
    }

    fn discard(&mut self, count: usize) -> io::Result<usize> {
        Ok((self.callback)(None, count).min(count))
    }
}

/// 字节游标
///
/// 包装数据源, 记录流位置与当前块剩余字节数. 块内读取超出声明大小时
/// 返回 [`SmushError::SizeMismatch`]; 数据源提前结束时返回
/// [`SmushError::Truncated`].
pub struct ByteCursor {
    /// 底层数据源
    source: Box<dyn ReadSource>,
    /// 已消耗的字节数
    position: u64,
    /// 当前块剩余字节数 (None 表示不在块内)
    chunk_remaining: Option<u64>,
}

impl ByteCursor {
    /// 从数据源创建游标
    pub fn new(source: Box<dyn ReadSource>) -> Self {
        Self {
            source,
            position: 0,
            chunk_remaining: None,
        }
    }

    /// 从内存数据创建游标
    pub fn from_memory(data: Vec<u8>) -> Self {
        Self::new(Box::new(MemorySource::new(data)))
    }

    /// 已消耗的字节数
    pub fn position(&self) -> u64 {
        self.position
    }

    /// 开始跟踪一个声明大小为 `size` 的块
    pub fn begin_chunk(&mut self, size: u64) {
        self.chunk_remaining = Some(size);
    }

    /// 当前块剩余字节数
    pub fn remaining_in_chunk(&self) -> Option<u64> {
        self.chunk_remaining
    }

    /// 跳过当前块的剩余字节并结束块跟踪, 返回跳过的字节数
    pub fn drain_chunk(&mut self) -> SmushResult<u64> {
        let left = self.chunk_remaining.unwrap_or(0);
        if left > 0 {
            trace!("块剩余 {} 字节未消耗, 跳过", left);
            self.discard(left as usize)?;
        }
        self.chunk_remaining = None;
        Ok(left)
    }

    /// 检查块预算并扣除
    fn charge(&mut self, count: usize) -> SmushResult<()> {
        if let Some(left) = self.chunk_remaining {
            if count as u64 > left {
                return Err(SmushError::SizeMismatch(format!(
                    "块内读取越界: 需要 {} 字节, 块内剩余 {} 字节 (位置 {})",
                    count, left, self.position
                )));
            }
            self.chunk_remaining = Some(left - count as u64);
        }
        Ok(())
    }

    /// 从数据源读取, 返回实际读到的字节数
    fn fill(&mut self, buf: &mut [u8]) -> SmushResult<usize> {
        let mut total = 0;
        while total < buf.len() {
            let n = self.source.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        self.position += total as u64;
        Ok(total)
    }

    /// 读满 `buf`
    pub fn read_exact(&mut self, buf: &mut [u8]) -> SmushResult<()> {
        self.charge(buf.len())?;
        let n = self.fill(buf)?;
        if n < buf.len() {
            return Err(SmushError::Truncated {
                expected: buf.len(),
                actual: n,
            });
        }
        Ok(())
    }

    /// 尝试读满 `buf`
    ///
    /// 数据源在读到任何字节之前就已结束时返回 `Ok(false)`, 用于在块边界处检测流结束.
    pub fn try_read_exact(&mut self, buf: &mut [u8]) -> SmushResult<bool> {
        self.charge(buf.len())?;
        let n = self.fill(buf)?;
        match n {
            0 if !buf.is_empty() => Ok(false),
            n if n < buf.len() => Err(SmushError::Truncated {
                expected: buf.len(),
                actual: n,
            }),
            _ => Ok(true),
        }
    }

    /// 读取 `count` 字节到可复用的缓冲区 (覆盖原内容)
    ///
    /// 按 [`READ_STEP`] 分段扩容, 声明大小只有在数据源确实交付时才会被分配.
    pub fn read_into(&mut self, buf: &mut Vec<u8>, count: usize) -> SmushResult<()> {
        buf.clear();
        self.charge(count)?;
        while buf.len() < count {
            let start = buf.len();
            let step = (count - start).min(READ_STEP);
            buf.try_reserve(step).map_err(|e| {
                SmushError::AllocationFailure(format!("无法分配 {} 字节块缓冲: {}", count, e))
            })?;
            buf.resize(start + step, 0);
            let n = self.fill(&mut buf[start..])?;
            if n < step {
                buf.truncate(start + n);
                return Err(SmushError::Truncated {
                    expected: count,
                    actual: buf.len(),
                });
            }
        }
        Ok(())
    }

    /// 读取指定数量的字节
    pub fn read_bytes(&mut self, count: usize) -> SmushResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_into(&mut buf, count)?;
        Ok(buf)
    }

    /// 读取定长数组
    pub fn read_array<const N: usize>(&mut self) -> SmushResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// 读取 1 个字节
    pub fn read_u8(&mut self) -> SmushResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// 读取 u16 小端
    pub fn read_u16_le(&mut self) -> SmushResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// 读取 i16 小端
    pub fn read_i16_le(&mut self) -> SmushResult<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    /// 读取 u32 小端
    pub fn read_u32_le(&mut self) -> SmushResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// 读取 u16 大端
    pub fn read_u16_be(&mut self) -> SmushResult<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// 读取 u32 大端
    pub fn read_u32_be(&mut self) -> SmushResult<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// 读取 4 字节标签 (FourCC)
    pub fn read_tag(&mut self) -> SmushResult<[u8; 4]> {
        self.read_array()
    }

    /// 丢弃指定字节数 (不复制数据)
    pub fn discard(&mut self, count: usize) -> SmushResult<()> {
        self.charge(count)?;
        let n = self.source.discard(count)?;
        self.position += n as u64;
        if n < count {
            return Err(SmushError::Truncated {
                expected: count,
                actual: n,
            });
        }
        Ok(())
    }
}
