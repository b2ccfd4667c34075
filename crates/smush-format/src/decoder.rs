//! 动画解码器 (容器状态机).
//!
//! 生命周期: 创建 -> [`AnimDecoder::open`] 解析 ANIM/AHDR -> 反复调用
//! [`AnimDecoder::decode_next_frame`] 逐帧解码, 直到返回 [`SmushError::Eof`].
//!
//! 每个 FRME 块由若干子块组成 (NPAL/XPAL/FOBJ/IACT/TRES/STOR/FTCH),
//! 子块大小按偶数对齐累加后不得超出帧块声明的大小. 子块处理器未读完的字节
//! 会被跳过以重新同步. 所有子块处理完毕后输出视频帧, 再执行 STOR 快照与缓冲区轮转.

use std::path::Path;

use bitflags::bitflags;
use log::{debug, trace, warn};
use smush_codec::{
    AudioBlock, CodecId, FrameBuffers, FrameDecoder, FrameObject, IactHeader, IactReassembler,
    VideoFrame, create_decoder,
};
use smush_core::{ByteReader, DELTA_TABLE_SIZE, Palette, SmushError, SmushResult};

use crate::chunk::{ChunkHeader, Tag};
use crate::config::DecoderConfig;
use crate::header::AnimHeader;
use crate::io::{ByteCursor, FileSource, ReadSource};
use crate::sink::{OutputSink, TextResource};

bitflags! {
    /// 一帧内出现过的子块种类
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameFlags: u16 {
        /// 整表调色板 (NPAL)
        const PALETTE         = 1 << 0;
        /// 增量调色板 (XPAL)
        const PALETTE_DELTA   = 1 << 1;
        /// 帧对象 (FOBJ)
        const VIDEO           = 1 << 2;
        /// 交错音频 (IACT)
        const AUDIO           = 1 << 3;
        /// 文本资源 (TRES)
        const TEXT            = 1 << 4;
        /// 保存到辅助缓冲区 (STOR)
        const STORE           = 1 << 5;
        /// 从辅助缓冲区恢复 (FTCH)
        const FETCH           = 1 << 6;
        /// 半分辨率帧
        const HALF_RESOLUTION = 1 << 7;
    }
}

/// 单帧解码摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameInfo {
    /// 帧序号 (从 0 开始)
    pub index: u32,
    /// 出现过的子块种类
    pub flags: FrameFlags,
    /// 本帧发出的音频块数
    pub audio_blocks: u32,
    /// 最后一个帧对象使用的编解码器
    pub codec: Option<CodecId>,
    /// 输出宽度
    pub width: u32,
    /// 输出高度
    pub height: u32,
    /// 帧末尾被跳过的多余字节数
    pub trailing_bytes: u64,
}

/// SMUSH 动画解码器
pub struct AnimDecoder {
    /// 字节游标
    cursor: ByteCursor,
    /// 配置
    config: DecoderConfig,
    /// 全局头部 (open 之后才有)
    header: Option<AnimHeader>,
    /// ANIM 块剩余字节数
    anim_remaining: u64,
    /// 四缓冲区画布
    buffers: FrameBuffers,
    /// 当前调色板
    palette: Palette,
    /// XPAL 增量暂存表
    delta: Box<[i16; DELTA_TABLE_SIZE]>,
    /// 音频重组器
    iact: IactReassembler,
    /// 已创建的视频解码器
    decoders: Vec<Box<dyn FrameDecoder>>,
    /// 本帧输出后执行的轮转码
    rotate: u8,
    /// 本帧输出后是否快照到辅助缓冲区
    store_pending: bool,
    /// 已成功输出的帧数
    frame_index: u32,
    /// 子块负载缓冲区 (跨帧复用)
    scratch: Vec<u8>,
}

impl AnimDecoder {
    /// 从数据源创建解码器 (尚未解析头部)
    pub fn new(source: Box<dyn ReadSource>, config: DecoderConfig) -> Self {
        let buffers =
            FrameBuffers::with_limits(config.max_width as usize, config.max_height as usize);
        Self {
            cursor: ByteCursor::new(source),
            config,
            header: None,
            anim_remaining: 0,
            buffers,
            palette: Palette::new(),
            delta: Box::new([0; DELTA_TABLE_SIZE]),
            iact: IactReassembler::new(),
            decoders: Vec::new(),
            rotate: 0,
            store_pending: false,
            frame_index: 0,
            scratch: Vec::new(),
        }
    }

    /// 从内存数据创建解码器
    pub fn from_memory(data: Vec<u8>, config: DecoderConfig) -> Self {
        Self::new(Box::new(crate::io::MemorySource::new(data)), config)
    }

    /// 打开文件并解析头部
    pub fn open_file(path: impl AsRef<Path>, config: DecoderConfig) -> SmushResult<Self> {
        let path = path.as_ref();
        debug!("打开文件: {}", path.display());
        let mut decoder = Self::new(Box::new(FileSource::open(path)?), config);
        decoder.open()?;
        Ok(decoder)
    }

    /// 解析 ANIM 与 AHDR 块
    pub fn open(&mut self) -> SmushResult<&AnimHeader> {
        if self.header.is_some() {
            return Err(SmushError::InvalidArgument("解码器已经打开".into()));
        }

        let anim = ChunkHeader::read(&mut self.cursor)?;
        if anim.tag != Tag::ANIM {
            return Err(SmushError::MalformedHeader(format!(
                "缺少 ANIM 标签, 实际为 '{}'",
                anim.tag
            )));
        }
        self.anim_remaining = u64::from(anim.size);

        let ahdr = self.read_top_level_header()?;
        if ahdr.tag != Tag::AHDR {
            return Err(SmushError::MalformedHeader(format!(
                "ANIM 的第一个子块应为 AHDR, 实际为 '{}'",
                ahdr.tag
            )));
        }
        self.cursor.begin_chunk(u64::from(ahdr.size));
        let header = AnimHeader::read(&mut self.cursor, ahdr.size)?;
        let drained = self.cursor.drain_chunk()?;
        if drained > 0 {
            trace!("AHDR: 跳过 {} 字节扩展数据", drained);
        }
        self.anim_remaining -= u64::from(ahdr.size);
        self.skip_padding(&ahdr)?;

        self.palette = header.palette.clone();
        debug!(
            "打开 SMUSH 动画: ANIM 大小={}, 版本={}, 帧数={}",
            anim.size, header.version, header.frame_count
        );
        Ok(self.header.insert(header))
    }

    /// 读取 ANIM 内的顶层块头部并扣除预算
    fn read_top_level_header(&mut self) -> SmushResult<ChunkHeader> {
        if self.anim_remaining < ChunkHeader::SIZE {
            return Err(SmushError::SizeMismatch(format!(
                "ANIM 剩余 {} 字节, 不足一个块头部",
                self.anim_remaining
            )));
        }
        let chunk = ChunkHeader::read(&mut self.cursor)?;
        self.anim_remaining -= ChunkHeader::SIZE;
        if u64::from(chunk.size) > self.anim_remaining {
            return Err(SmushError::SizeMismatch(format!(
                "'{}' 块大小 {} 超出 ANIM 剩余 {} 字节",
                chunk.tag, chunk.size, self.anim_remaining
            )));
        }
        Ok(chunk)
    }

    /// 奇数大小的顶层块后跳过填充字节 (预算允许时)
    fn skip_padding(&mut self, chunk: &ChunkHeader) -> SmushResult<()> {
        let padding = (chunk.padded_size() - u64::from(chunk.size)).min(self.anim_remaining);
        if padding > 0 {
            self.cursor.discard(padding as usize)?;
            self.anim_remaining -= padding;
        }
        Ok(())
    }

    /// 解码下一帧
    ///
    /// 视频帧与音频块通过 `sink` 同步交付. 在帧边界处到达流末尾时返回
    /// [`SmushError::Eof`].
    pub fn decode_next_frame(&mut self, sink: &mut dyn OutputSink) -> SmushResult<FrameInfo> {
        if self.header.is_none() {
            return Err(SmushError::InvalidArgument("请先调用 open()".into()));
        }
        if self.anim_remaining == 0 {
            return Err(SmushError::Eof);
        }
        if self.anim_remaining < ChunkHeader::SIZE {
            warn!("ANIM 末尾剩余 {} 字节, 不足一个块头部", self.anim_remaining);
            return Err(SmushError::Eof);
        }
        let Some(frame) = ChunkHeader::try_read(&mut self.cursor)? else {
            return Err(SmushError::Eof);
        };
        self.anim_remaining -= ChunkHeader::SIZE;
        if frame.tag != Tag::FRME {
            return Err(SmushError::MalformedHeader(format!(
                "期望 FRME 块, 实际为 '{}'",
                frame.tag
            )));
        }
        if u64::from(frame.size) > self.anim_remaining {
            return Err(SmushError::SizeMismatch(format!(
                "FRME 大小 {} 超出 ANIM 剩余 {} 字节",
                frame.size, self.anim_remaining
            )));
        }
        debug!("FRME #{}: 大小={}", self.frame_index, frame.size);

        let mut info = FrameInfo {
            index: self.frame_index,
            ..FrameInfo::default()
        };
        let mut sub_image = 0u16;
        let mut frame_remaining = u64::from(frame.size);

        while frame_remaining >= ChunkHeader::SIZE {
            let sub = ChunkHeader::read(&mut self.cursor)?;
            frame_remaining -= ChunkHeader::SIZE;
            if u64::from(sub.size) > frame_remaining {
                return Err(SmushError::SizeMismatch(format!(
                    "子块 '{}' 大小 {} 超出帧剩余 {} 字节",
                    sub.tag, sub.size, frame_remaining
                )));
            }
            trace!("子块 '{}': 大小={}", sub.tag, sub.size);

            self.cursor.begin_chunk(u64::from(sub.size));
            if let Some(half) = self.handle_sub_chunk(&sub, sink, &mut info)? {
                sub_image = u16::from(half);
            }
            self.cursor.drain_chunk()?;
            frame_remaining -= u64::from(sub.size);
            let padding = (sub.padded_size() - u64::from(sub.size)).min(frame_remaining);
            if padding > 0 {
                self.cursor.discard(padding as usize)?;
                frame_remaining -= padding;
            }
        }

        let (width, height) = self.canvas_size();
        info.width = width;
        info.height = height;
        sink.video_frame(&VideoFrame {
            data: self.buffers.current(),
            width,
            height,
            palette: &self.palette,
            sub_image,
        });

        if frame_remaining > 0 {
            warn!(
                "FRME #{}: 末尾 {} 字节不足一个子块, 跳过",
                self.frame_index, frame_remaining
            );
            self.cursor.discard(frame_remaining as usize)?;
            info.trailing_bytes = frame_remaining;
        }
        if self.store_pending {
            self.buffers.store();
            self.store_pending = false;
        }
        self.buffers.rotate(self.rotate);
        self.rotate = 0;

        self.anim_remaining -= u64::from(frame.size);
        self.skip_padding(&frame)?;
        self.frame_index += 1;
        Ok(info)
    }

    /// 处理一个子块, 帧对象返回是否为半分辨率帧
    fn handle_sub_chunk(
        &mut self,
        sub: &ChunkHeader,
        sink: &mut dyn OutputSink,
        info: &mut FrameInfo,
    ) -> SmushResult<Option<bool>> {
        let size = sub.size as usize;
        match sub.tag {
            Tag::NPAL => {
                info.flags |= FrameFlags::PALETTE;
                self.cursor
                    .read_into(&mut self.scratch, size.min(DELTA_TABLE_SIZE))?;
                self.palette.set_from_rgb(&self.scratch);
            }
            Tag::XPAL => {
                info.flags |= FrameFlags::PALETTE_DELTA;
                self.handle_xpal(size)?;
            }
            Tag::FOBJ => {
                info.flags |= FrameFlags::VIDEO;
                return self.handle_fobj(size, info).map(Some);
            }
            Tag::IACT => {
                info.flags |= FrameFlags::AUDIO;
                info.audio_blocks += self.handle_iact(size, sink)?;
            }
            Tag::TRES => {
                info.flags |= FrameFlags::TEXT;
                self.cursor.read_into(&mut self.scratch, size)?;
                if let Some(text) = TextResource::parse(&self.scratch)? {
                    trace!("TRES: 字符串 #{} @ ({}, {})", text.string_id, text.x, text.y);
                    sink.subtitle(&text);
                }
            }
            Tag::STOR => {
                info.flags |= FrameFlags::STORE;
                self.store_pending = true;
            }
            Tag::FTCH => {
                info.flags |= FrameFlags::FETCH;
                self.buffers.fetch();
            }
            other => {
                return Err(SmushError::UnknownChunk(other.as_str()));
            }
        }
        Ok(None)
    }

    fn handle_xpal(&mut self, size: usize) -> SmushResult<()> {
        self.cursor.discard(size.min(4))?;
        if size == 4 || size == 6 {
            self.palette.apply_delta(&self.delta);
            return Ok(());
        }
        for d in self.delta.iter_mut() {
            *d = self.cursor.read_i16_le()?;
        }
        if self.cursor.remaining_in_chunk().unwrap_or(0) >= DELTA_TABLE_SIZE as u64 {
            self.cursor.read_into(&mut self.scratch, DELTA_TABLE_SIZE)?;
            self.palette.set_from_rgb(&self.scratch);
        } else {
            self.palette.clear();
        }
        Ok(())
    }

    fn handle_fobj(&mut self, size: usize, info: &mut FrameInfo) -> SmushResult<bool> {
        if size < FrameObject::HEADER_SIZE {
            return Err(SmushError::MalformedHeader(format!(
                "FOBJ 大小 {} 小于头部 {} 字节",
                size,
                FrameObject::HEADER_SIZE
            )));
        }
        self.cursor.read_into(&mut self.scratch, size)?;
        let mut reader = ByteReader::new(&self.scratch);
        let object = FrameObject::parse(&mut reader)?;
        info.codec = Some(object.codec);
        trace!(
            "FOBJ: {} ({}, {}) {}x{}",
            object.codec, object.left, object.top, object.width, object.height
        );
        if object.is_empty() {
            return Ok(false);
        }

        self.buffers.ensure_size(object.right(), object.bottom())?;
        let decoder = match self
            .decoders
            .iter()
            .position(|d| d.codec_id() == object.codec)
        {
            Some(i) => &mut self.decoders[i],
            None => {
                self.decoders.push(create_decoder(object.codec));
                let last = self.decoders.len() - 1;
                &mut self.decoders[last]
            }
        };
        let outcome = decoder.decode(&object, reader.rest(), &mut self.buffers)?;
        self.rotate = outcome.rotate;
        if outcome.half_resolution {
            info.flags |= FrameFlags::HALF_RESOLUTION;
        }
        Ok(outcome.half_resolution)
    }

    fn handle_iact(&mut self, size: usize, sink: &mut dyn OutputSink) -> SmushResult<u32> {
        self.cursor.read_into(&mut self.scratch, size)?;
        let mut reader = ByteReader::new(&self.scratch);
        let header = IactHeader::parse(&mut reader)?;
        trace!(
            "IACT: 流={}, 位置={}/{}, 剩余={}",
            header.stream_id, header.position, header.total, header.remaining
        );
        let sample_rate = self.sample_rate();
        let emitted = self.iact.push(reader.rest(), |data| {
            sink.audio_block(&AudioBlock { data, sample_rate });
        })?;
        if self.iact.pending() > 0 {
            trace!("IACT: {} 字节留待下一块拼接", self.iact.pending());
        }
        Ok(emitted as u32)
    }

    /// 全局头部 (open 之前为 None)
    pub fn header(&self) -> Option<&AnimHeader> {
        self.header.as_ref()
    }

    /// 帧率
    pub fn frame_rate(&self) -> u32 {
        self.header
            .as_ref()
            .and_then(|h| h.frame_rate)
            .filter(|&r| r > 0)
            .unwrap_or(self.config.default_frame_rate)
    }

    /// 音频采样率
    pub fn sample_rate(&self) -> u32 {
        self.header
            .as_ref()
            .and_then(|h| h.sample_rate)
            .filter(|&r| r > 0)
            .unwrap_or(self.config.default_sample_rate)
    }

    /// 声明的总帧数
    pub fn frame_count(&self) -> u32 {
        self.header.as_ref().map_or(0, |h| u32::from(h.frame_count))
    }

    /// 已解码的帧数 (即下一帧的序号)
    pub fn current_frame(&self) -> u32 {
        self.frame_index
    }

    /// 格式版本
    pub fn version(&self) -> u16 {
        self.header.as_ref().map_or(0, |h| h.version)
    }

    /// 当前画布尺寸
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.buffers.width() as u32, self.buffers.height() as u32)
    }

    /// 当前调色板
    pub fn palette(&self) -> &Palette {
        &self.palette
    }
}
