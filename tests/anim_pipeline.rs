//! 端到端集成测试: SMUSH 动画的完整解码管线.
//!
//! 测试流程: 构造 ANIM 码流 → 打开 → 逐帧解码 → 校验视频/音频回调.

use std::sync::{Arc, Mutex};

use smush::codec::{AudioBlock, VideoFrame};
use smush::format::{AnimDecoder, CallbackSource, DecoderConfig, FrameFlags, OutputSink};
use smush::SmushError;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 构造块: 标签 + 大端大小 + 负载 (奇数大小补 1 字节)
fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// 全局头部负载, `extra` 依次为帧率、最大帧大小、采样率
fn ahdr_payload(frame_count: u16, extra: &[u32]) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend_from_slice(&2u16.to_le_bytes());
    p.extend_from_slice(&frame_count.to_le_bytes());
    p.extend_from_slice(&0u16.to_le_bytes());
    for i in 0..256u32 {
        p.extend_from_slice(&[i as u8, (i / 2) as u8, 255 - i as u8]);
    }
    for v in extra {
        p.extend_from_slice(&v.to_le_bytes());
    }
    p
}

fn anim(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut body = chunk(b"AHDR", &ahdr_payload(frames.len() as u16, &[15]));
    for f in frames {
        body.extend_from_slice(f);
    }
    chunk(b"ANIM", &body)
}

fn frame(subs: &[Vec<u8>]) -> Vec<u8> {
    chunk(b"FRME", &subs.concat())
}

fn fobj(codec: u16, w: u16, h: u16, payload: &[u8]) -> Vec<u8> {
    fobj_at(codec, (0, 0), w, h, payload)
}

fn fobj_at(codec: u16, (left, top): (u16, u16), w: u16, h: u16, payload: &[u8]) -> Vec<u8> {
    let mut p = Vec::new();
    for v in [codec, left, top, w, h, 0, 0] {
        p.extend_from_slice(&v.to_le_bytes());
    }
    p.extend_from_slice(payload);
    chunk(b"FOBJ", &p)
}

/// codec47 子头部 + 负载
fn codec47(seq: u16, mode: u8, rotate: u8, fills: (u8, u8), body: &[u8]) -> Vec<u8> {
    let mut h = vec![0u8; 26];
    h[0..2].copy_from_slice(&seq.to_le_bytes());
    h[2] = mode;
    h[3] = rotate;
    h[12] = fills.0;
    h[13] = fills.1;
    h.extend_from_slice(body);
    h
}

/// codec1 负载: 每行用单个重复游程填满 `w` 像素
fn codec1_solid(w: u16, h: u16, value: u8) -> Vec<u8> {
    let mut p = Vec::new();
    for _ in 0..h {
        p.extend_from_slice(&2u16.to_le_bytes());
        p.extend_from_slice(&[((w as u8 - 1) << 1) | 1, value]);
    }
    p
}

fn iact(body: &[u8]) -> Vec<u8> {
    let mut p = Vec::new();
    for v in [8u16, 46, 0, 0, 0, 0, 0] {
        p.extend_from_slice(&v.to_le_bytes());
    }
    p.extend_from_slice(&0u32.to_le_bytes());
    p.extend_from_slice(body);
    chunk(b"IACT", &p)
}

#[derive(Default)]
struct Collect {
    videos: Vec<(Vec<u8>, u32, u32, u16)>,
    audio: Vec<(Vec<u8>, u32)>,
}

impl OutputSink for Collect {
    fn video_frame(&mut self, frame: &VideoFrame<'_>) {
        self.videos
            .push((frame.data.to_vec(), frame.width, frame.height, frame.sub_image));
    }

    fn audio_block(&mut self, block: &AudioBlock<'_>) {
        self.audio.push((block.data.to_vec(), block.sample_rate));
    }
}

fn open(data: Vec<u8>) -> AnimDecoder {
    init_logger();
    let mut dec = AnimDecoder::from_memory(data, DecoderConfig::default());
    dec.open().unwrap();
    dec
}

fn decode_all(dec: &mut AnimDecoder, sink: &mut Collect) -> Result<u32, SmushError> {
    let mut n = 0;
    loop {
        match dec.decode_next_frame(sink) {
            Ok(_) => n += 1,
            Err(SmushError::Eof) => return Ok(n),
            Err(e) => return Err(e),
        }
    }
}

#[test]
fn test_codec47_原始像素单帧() {
    let pixels: Vec<u8> = (0..16).collect();
    let data = anim(&[frame(&[fobj(47, 4, 4, &codec47(0, 0, 0, (0, 0), &pixels))])]);
    let mut dec = open(data);
    assert_eq!(dec.frame_rate(), 15);

    let mut sink = Collect::default();
    let info = dec.decode_next_frame(&mut sink).unwrap();
    assert_eq!(info.flags, FrameFlags::VIDEO);
    assert_eq!((info.width, info.height), (4, 4));
    assert_eq!(sink.videos.len(), 1);
    assert_eq!(sink.videos[0], (pixels, 4, 4, 0));
    assert!(sink.audio.is_empty());

    assert!(matches!(dec.decode_next_frame(&mut sink), Err(SmushError::Eof)));
    assert_eq!(sink.videos.len(), 1);
}

#[test]
fn test_codec47_轮转后整帧复制() {
    let pixels: Vec<u8> = (100..116).collect();
    let frames = [
        frame(&[fobj(47, 4, 4, &codec47(0, 0, 1, (1, 2), &pixels))]),
        frame(&[fobj(47, 4, 4, &codec47(1, 3, 0, (0, 0), &[]))]),
    ];
    let mut dec = open(anim(&frames));
    let mut sink = Collect::default();
    assert_eq!(decode_all(&mut dec, &mut sink).unwrap(), 2);
    assert_eq!(sink.videos[0].0, pixels);
    assert_eq!(sink.videos[1].0, pixels);
}

#[test]
fn test_codec47_轮转2后历史帧交换() {
    let pixels: Vec<u8> = (40..56).collect();
    let frames = [
        frame(&[fobj(47, 4, 4, &codec47(0, 0, 2, (1, 2), &pixels))]),
        // 历史帧 1 现在是原历史帧 2
        frame(&[fobj(47, 4, 4, &codec47(1, 4, 0, (0, 0), &[]))]),
        // 历史帧 2 现在是第一帧的输出
        frame(&[fobj(47, 4, 4, &codec47(2, 3, 0, (0, 0), &[]))]),
    ];
    let mut dec = open(anim(&frames));
    let mut sink = Collect::default();
    assert_eq!(decode_all(&mut dec, &mut sink).unwrap(), 3);
    assert_eq!(sink.videos[0].0, pixels);
    assert_eq!(sink.videos[1].0, vec![2; 16]);
    assert_eq!(sink.videos[2].0, pixels);
}

#[test]
fn test_codec47_块编码运动补偿() {
    let pixels: Vec<u8> = (0..16).map(|v| v * 3).collect();
    let frames = [
        frame(&[fobj(47, 4, 4, &codec47(0, 0, 1, (0, 0), &pixels))]),
        // 控制字节 0x00: 零运动矢量, 从历史帧 2 复制
        frame(&[fobj(47, 4, 4, &codec47(1, 2, 0, (0, 0), &[0x00]))]),
        // 控制字节 0xFE: 整块填充
        frame(&[fobj(47, 4, 4, &codec47(2, 2, 0, (0, 0), &[0xFE, 0x55]))]),
    ];
    let mut dec = open(anim(&frames));
    let mut sink = Collect::default();
    assert_eq!(decode_all(&mut dec, &mut sink).unwrap(), 3);
    assert_eq!(sink.videos[1].0, pixels);
    assert_eq!(sink.videos[2].0, vec![0x55; 16]);
}

#[test]
fn test_codec47_序号不连续跳过块编码() {
    let frames = [
        frame(&[fobj(47, 4, 4, &codec47(0, 0, 0, (0, 0), &[9; 16]))]),
        frame(&[fobj(47, 4, 4, &codec47(5, 2, 1, (0, 0), &[0xFE, 0x55]))]),
    ];
    let mut dec = open(anim(&frames));
    let mut sink = Collect::default();
    assert_eq!(decode_all(&mut dec, &mut sink).unwrap(), 2);
    assert_eq!(sink.videos[1].0, vec![9; 16]);
}

#[test]
fn test_codec47_半分辨率() {
    let data = anim(&[frame(&[fobj(47, 4, 4, &codec47(0, 1, 0, (0, 0), &[1, 2, 3, 4]))])]);
    let mut dec = open(data);
    let mut sink = Collect::default();
    let info = dec.decode_next_frame(&mut sink).unwrap();
    assert!(info.flags.contains(FrameFlags::HALF_RESOLUTION));
    let (data, _, _, sub_image) = &sink.videos[0];
    assert_eq!(*sub_image, 1);
    assert_eq!(
        data,
        &vec![1, 1, 2, 2, 1, 1, 2, 2, 3, 3, 4, 4, 3, 3, 4, 4]
    );
}

#[test]
fn test_codec1_画布随帧对象扩大() {
    let frames = [
        frame(&[fobj(1, 2, 1, &codec1_solid(2, 1, 7))]),
        frame(&[fobj(3, 4, 2, &codec1_solid(4, 2, 8))]),
    ];
    let mut dec = open(anim(&frames));
    let mut sink = Collect::default();
    assert_eq!(decode_all(&mut dec, &mut sink).unwrap(), 2);
    assert_eq!(sink.videos[0].0, vec![7, 7]);
    assert_eq!((sink.videos[1].1, sink.videos[1].2), (4, 2));
    assert_eq!(sink.videos[1].0, vec![8; 8]);
    assert_eq!(dec.canvas_size(), (4, 2));
}

#[test]
fn test_同帧内画布扩大保留已解码像素() {
    let frames = [
        frame(&[
            fobj_at(1, (0, 0), 2, 1, &codec1_solid(2, 1, 7)),
            fobj_at(1, (2, 0), 2, 1, &codec1_solid(2, 1, 9)),
        ]),
        frame(&[
            fobj_at(1, (0, 0), 2, 1, &codec1_solid(2, 1, 3)),
            fobj_at(1, (4, 1), 2, 1, &codec1_solid(2, 1, 5)),
        ]),
    ];
    let mut dec = open(anim(&frames));
    let mut sink = Collect::default();
    assert_eq!(decode_all(&mut dec, &mut sink).unwrap(), 2);
    assert_eq!(sink.videos[0], (vec![7, 7, 9, 9], 4, 1, 0));
    assert_eq!(
        sink.videos[1],
        (vec![3, 3, 9, 9, 0, 0, 0, 0, 0, 0, 5, 5], 6, 2, 0)
    );
}

#[test]
fn test_保存与恢复辅助帧() {
    let frames = [
        frame(&[fobj(1, 2, 1, &codec1_solid(2, 1, 7)), chunk(b"STOR", &[])]),
        frame(&[fobj(1, 2, 1, &codec1_solid(2, 1, 9)), chunk(b"FTCH", &[])]),
    ];
    let mut dec = open(anim(&frames));
    let mut sink = Collect::default();
    assert_eq!(decode_all(&mut dec, &mut sink).unwrap(), 2);
    assert_eq!(sink.videos[0].0, vec![7, 7]);
    assert_eq!(sink.videos[1].0, vec![7, 7]);
}

#[test]
fn test_iact_跨块重组() {
    // 编码块: 移位字节 0x00, 之后是增量 1, 2 与一个转义采样
    let body = [0x00, 1, 2, 0x80, 0x12, 0x34];
    let mut encoded = (body.len() as u16).to_be_bytes().to_vec();
    encoded.extend_from_slice(&body);
    let (head, tail) = encoded.split_at(3);

    let frames = [frame(&[iact(head)]), frame(&[iact(tail)])];
    let mut dec = open(anim(&frames));
    let mut sink = Collect::default();

    let first = dec.decode_next_frame(&mut sink).unwrap();
    assert!(first.flags.contains(FrameFlags::AUDIO));
    assert_eq!(first.audio_blocks, 0);
    assert!(sink.audio.is_empty());

    let second = dec.decode_next_frame(&mut sink).unwrap();
    assert_eq!(second.audio_blocks, 1);
    assert_eq!(sink.audio.len(), 1);
    let (pcm, rate) = &sink.audio[0];
    assert_eq!(*rate, 22050);
    assert_eq!(pcm.len(), 4096);
    assert_eq!(&pcm[..6], &[1, 0, 2, 0, 0x34, 0x12]);
    assert!(pcm[6..].iter().all(|&b| b == 0));
    // 每帧都有一次视频回调
    assert_eq!(sink.videos.len(), 2);
}

#[test]
fn test_iact_单块多个编码块() {
    let mut payload = Vec::new();
    for _ in 0..3 {
        payload.extend_from_slice(&1u16.to_be_bytes());
        payload.push(0x00);
    }
    let mut dec = open(anim(&[frame(&[iact(&payload)])]));
    let mut sink = Collect::default();
    let info = dec.decode_next_frame(&mut sink).unwrap();
    assert_eq!(info.audio_blocks, 3);
    assert_eq!(sink.audio.len(), 3);
}

#[test]
fn test_iact_签名错误() {
    let mut p = Vec::new();
    for v in [9u16, 46, 0, 0, 0, 0, 0, 0, 0] {
        p.extend_from_slice(&v.to_le_bytes());
    }
    let mut dec = open(anim(&[frame(&[chunk(b"IACT", &p)])]));
    let err = dec.decode_next_frame(&mut Collect::default()).unwrap_err();
    assert!(matches!(err, SmushError::MalformedHeader(_)));
}

#[test]
fn test_整表调色板() {
    let rgb: Vec<u8> = (0..768).map(|i| (i % 251) as u8).collect();
    let mut dec = open(anim(&[frame(&[chunk(b"NPAL", &rgb)])]));
    assert_eq!(dec.palette().rgb(1), [1, 0, 254]);
    dec.decode_next_frame(&mut Collect::default()).unwrap();
    assert_eq!(dec.palette().rgb(1), [3, 4, 5]);
}

#[test]
fn test_全局头部过小() {
    init_logger();
    let body = chunk(b"AHDR", &[0; 100]);
    let mut dec = AnimDecoder::from_memory(chunk(b"ANIM", &body), DecoderConfig::default());
    assert!(matches!(dec.open(), Err(SmushError::MalformedHeader(_))));
}

#[test]
fn test_全局头部可选字段() {
    init_logger();
    let body = chunk(b"AHDR", &ahdr_payload(0, &[12, 4000, 11025]));
    let mut dec = AnimDecoder::from_memory(chunk(b"ANIM", &body), DecoderConfig::default());
    let header = dec.open().unwrap();
    assert_eq!(header.max_frame_size, Some(4000));
    assert_eq!(dec.frame_rate(), 12);
    assert_eq!(dec.sample_rate(), 11025);
}

#[test]
fn test_子块超出帧大小() {
    // 子块声明 100 字节, 帧内只剩 4 字节
    let mut sub = b"NPAL".to_vec();
    sub.extend_from_slice(&100u32.to_be_bytes());
    sub.extend_from_slice(&[0; 4]);
    let mut dec = open(anim(&[chunk(b"FRME", &sub)]));
    let err = dec.decode_next_frame(&mut Collect::default()).unwrap_err();
    assert!(matches!(err, SmushError::SizeMismatch(_)));
}

#[test]
fn test_未知子块() {
    let mut dec = open(anim(&[frame(&[chunk(b"ZZZZ", &[0; 2])])]));
    let err = dec.decode_next_frame(&mut Collect::default()).unwrap_err();
    match err {
        SmushError::UnknownChunk(tag) => assert_eq!(tag, "ZZZZ"),
        other => panic!("意外的错误: {other}"),
    }
}

#[test]
fn test_不支持的编解码器() {
    let mut dec = open(anim(&[frame(&[fobj(37, 4, 4, &[0; 8])])]));
    let err = dec.decode_next_frame(&mut Collect::default()).unwrap_err();
    assert!(matches!(err, SmushError::UnsupportedCodec(37)));
}

#[test]
fn test_码流截断() {
    let mut data = anim(&[frame(&[fobj(47, 4, 4, &codec47(0, 0, 0, (0, 0), &[1; 16]))])]);
    data.truncate(data.len() - 6);
    let mut dec = open(data);
    let err = dec.decode_next_frame(&mut Collect::default()).unwrap_err();
    assert!(matches!(err, SmushError::Truncated { .. }));
}

#[test]
fn test_声明超大帧对象时报截断() {
    let mut body = chunk(b"AHDR", &ahdr_payload(1, &[15]));
    body.extend_from_slice(b"FRME");
    body.extend_from_slice(&0x8000_0010u32.to_be_bytes());
    body.extend_from_slice(b"FOBJ");
    body.extend_from_slice(&0x8000_0000u32.to_be_bytes());
    body.extend_from_slice(&[0; 30]);
    let mut data = b"ANIM".to_vec();
    data.extend_from_slice(&0xFFFF_FF00u32.to_be_bytes());
    data.extend_from_slice(&body);

    let mut dec = open(data);
    let err = dec.decode_next_frame(&mut Collect::default()).unwrap_err();
    assert!(matches!(err, SmushError::Truncated { actual: 30, .. }));
}

#[test]
fn test_宿主回调数据源() {
    init_logger();
    let pixels: Vec<u8> = (0..16).rev().collect();
    let data = anim(&[frame(&[
        chunk(b"XPAL", &[0; 4]),
        fobj(47, 4, 4, &codec47(0, 0, 0, (0, 0), &pixels)),
    ])]);

    let calls = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    let mut pos = 0usize;
    let source = CallbackSource::new(move |dest: Option<&mut [u8]>, count: usize| {
        *counter.lock().unwrap() += 1;
        let n = count.min(data.len() - pos);
        if let Some(buf) = dest {
            buf[..n].copy_from_slice(&data[pos..pos + n]);
        }
        pos += n;
        n
    });

    let mut dec = AnimDecoder::new(Box::new(source), DecoderConfig::default());
    dec.open().unwrap();
    let mut sink = Collect::default();
    assert_eq!(decode_all(&mut dec, &mut sink).unwrap(), 1);
    assert_eq!(sink.videos[0].0, pixels);
    assert!(*calls.lock().unwrap() > 0);
}

#[test]
fn test_从文件解码() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("intro.san");
    let frames = [
        frame(&[fobj(1, 2, 1, &codec1_solid(2, 1, 4))]),
        frame(&[fobj(1, 2, 1, &codec1_solid(2, 1, 5))]),
    ];
    std::fs::write(&path, anim(&frames)).unwrap();

    let mut dec = smush::open_file(&path).unwrap();
    assert_eq!(dec.frame_count(), 2);
    let mut sink = Collect::default();
    assert_eq!(decode_all(&mut dec, &mut sink).unwrap(), 2);
    assert_eq!(sink.videos[1].0, vec![5, 5]);
    assert_eq!(dec.current_frame(), 2);
}
