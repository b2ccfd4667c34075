//! smush-probe - SMUSH 动画信息探测工具.
//!
//! 读取 ANIM/SAN 文件的全局头部, 可选地逐帧解码并统计子块、编解码器与音频块.
//!
//! 用法:
//!   smush-probe intro.san
//!   smush-probe intro.san --frames --json
//!   smush-probe intro.san --frames --max-frames 100 -v

mod logging;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use serde::Serialize;

use smush_codec::{AudioBlock, VideoFrame};
use smush_core::SmushError;
use smush_format::{AnimDecoder, DecoderConfig, FrameFlags, OutputSink, TextResource, probe};

/// 探测时读取的文件头字节数
const PROBE_BYTES: usize = 16;

/// smush-probe 命令行参数
#[derive(Parser)]
#[command(name = "smush-probe", version, about = "SMUSH 动画信息探测工具")]
struct Cli {
    /// 输入文件路径
    input: Option<String>,

    /// 逐帧解码并输出统计信息
    #[arg(short = 'f', long = "frames")]
    show_frames: bool,

    /// 最多解码的帧数
    #[arg(long = "max-frames")]
    max_frames: Option<u32>,

    /// 画布尺寸上限 (宽, 高相同)
    #[arg(long = "max-canvas", default_value_t = 4096)]
    max_canvas: u32,

    /// 以 JSON 格式输出
    #[arg(long = "json")]
    json: bool,

    /// 静默模式 (不输出提示信息)
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// 文件日志详细级别 (-v=debug, -vv=trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

// ============================================================
// 输出结构体
// ============================================================

/// 探测输出 (JSON 根节点)
#[derive(Serialize)]
struct ProbeOutput {
    header: HeaderInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    frames: Option<DecodeSummary>,
}

/// 全局头部信息
#[derive(Serialize)]
struct HeaderInfo {
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    probe_score: Option<u32>,
    version: u16,
    frame_count: u16,
    frame_rate: u32,
    sample_rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_frame_size: Option<u32>,
}

/// 逐帧解码统计
#[derive(Serialize, Default, Debug, PartialEq, Eq)]
struct DecodeSummary {
    decoded_frames: u32,
    audio_blocks: u64,
    subtitles: u64,
    max_width: u32,
    max_height: u32,
    half_resolution_frames: u32,
    trailing_bytes: u64,
    codecs: BTreeMap<String, u32>,
    chunks: BTreeMap<String, u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// 统计用接收端
#[derive(Default)]
struct StatsSink {
    video_frames: u32,
    audio_blocks: u64,
    subtitles: u64,
}

impl OutputSink for StatsSink {
    fn video_frame(&mut self, _frame: &VideoFrame<'_>) {
        self.video_frames += 1;
    }

    fn audio_block(&mut self, _block: &AudioBlock<'_>) {
        self.audio_blocks += 1;
    }

    fn subtitle(&mut self, _text: &TextResource) {
        self.subtitles += 1;
    }
}

// ============================================================
// 主逻辑
// ============================================================

fn main() {
    let cli = Cli::parse();

    let Some(input_path) = cli.input.clone() else {
        print_banner();
        return;
    };

    logging::init("smush-probe", cli.verbose, cli.quiet);

    if let Err(e) = run(&cli, &input_path) {
        eprintln!("错误: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli, input_path: &str) -> Result<()> {
    if !cli.quiet {
        eprintln!(
            "smush-probe 版本 {} -- SMUSH 动画探测工具",
            env!("CARGO_PKG_VERSION")
        );
        eprintln!("输入文件: {input_path}");
    }

    let probe_score = probe_file(input_path)?;
    match probe_score {
        Some(score) => debug!("探测置信度: {score}"),
        None => warn!("文件头不像 SMUSH 动画, 仍尝试解析"),
    }

    let config = DecoderConfig::default().with_max_canvas(cli.max_canvas, cli.max_canvas);
    let mut decoder = AnimDecoder::open_file(input_path, config)
        .with_context(|| format!("无法解析文件头部 '{input_path}'"))?;

    let header = decoder.header().context("解码器未返回全局头部")?;
    let header_info = HeaderInfo {
        filename: input_path.to_string(),
        probe_score,
        version: header.version,
        frame_count: header.frame_count,
        frame_rate: decoder.frame_rate(),
        sample_rate: decoder.sample_rate(),
        max_frame_size: header.max_frame_size,
    };

    let frames = if cli.show_frames {
        Some(collect_stats(&mut decoder, cli.max_frames))
    } else {
        None
    };

    if cli.json {
        let output = ProbeOutput {
            header: header_info,
            frames,
        };
        let json = serde_json::to_string_pretty(&output).context("JSON 序列化失败")?;
        println!("{json}");
    } else {
        print_header_text(&header_info);
        if let Some(ref summary) = frames {
            print_frames_text(summary);
        }
    }
    Ok(())
}

/// 读取文件开头并计算探测置信度
fn probe_file(path: &str) -> Result<Option<u32>> {
    let mut file = File::open(path).with_context(|| format!("无法打开文件 '{path}'"))?;
    let mut head = Vec::with_capacity(PROBE_BYTES);
    file.by_ref()
        .take(PROBE_BYTES as u64)
        .read_to_end(&mut head)
        .with_context(|| format!("读取文件头失败 '{path}'"))?;
    let filename = Path::new(path).file_name().and_then(|n| n.to_str());
    Ok(probe(&head, filename))
}

/// 逐帧解码直到流末尾、出错或达到帧数上限
fn collect_stats(decoder: &mut AnimDecoder, max_frames: Option<u32>) -> DecodeSummary {
    let mut summary = DecodeSummary::default();
    let mut sink = StatsSink::default();

    while max_frames.is_none_or(|limit| summary.decoded_frames < limit) {
        let frame = match decoder.decode_next_frame(&mut sink) {
            Ok(frame) => frame,
            Err(SmushError::Eof) => break,
            Err(e) => {
                warn!("第 {} 帧解码失败: {e}", summary.decoded_frames);
                summary.error = Some(e.to_string());
                break;
            }
        };

        summary.decoded_frames += 1;
        summary.max_width = summary.max_width.max(frame.width);
        summary.max_height = summary.max_height.max(frame.height);
        summary.trailing_bytes += frame.trailing_bytes;
        if frame.flags.contains(FrameFlags::HALF_RESOLUTION) {
            summary.half_resolution_frames += 1;
        }
        if let Some(codec) = frame.codec {
            *summary.codecs.entry(codec.name().to_string()).or_default() += 1;
        }
        for (name, _) in frame.flags.iter_names() {
            *summary.chunks.entry(name.to_string()).or_default() += 1;
        }
    }

    summary.audio_blocks = sink.audio_blocks;
    summary.subtitles = sink.subtitles;
    info!(
        "解码完成: {} 帧 ({} 次视频回调), {} 个音频块",
        summary.decoded_frames, sink.video_frames, summary.audio_blocks
    );
    summary
}

/// 文本输出: 全局头部
fn print_header_text(info: &HeaderInfo) {
    println!("[HEADER]");
    println!("  文件名       : {}", info.filename);
    if let Some(score) = info.probe_score {
        println!("  探测置信度   : {score}");
    }
    println!("  版本         : {}", info.version);
    println!("  帧数         : {}", info.frame_count);
    println!("  帧率         : {} fps", info.frame_rate);
    println!("  采样率       : {} Hz", info.sample_rate);
    if let Some(size) = info.max_frame_size {
        println!("  最大帧大小   : {size} 字节");
    }
    println!("[/HEADER]");
    println!();
}

/// 文本输出: 逐帧统计
fn print_frames_text(summary: &DecodeSummary) {
    println!("[FRAMES]");
    println!("  已解码帧数   : {}", summary.decoded_frames);
    println!("  音频块       : {}", summary.audio_blocks);
    println!("  文本资源     : {}", summary.subtitles);
    println!("  最大画布     : {}x{}", summary.max_width, summary.max_height);
    if summary.half_resolution_frames > 0 {
        println!("  半分辨率帧   : {}", summary.half_resolution_frames);
    }
    if summary.trailing_bytes > 0 {
        println!("  跳过尾部字节 : {}", summary.trailing_bytes);
    }
    for (name, count) in &summary.codecs {
        println!("  编解码器     : {name} x {count}");
    }
    for (name, count) in &summary.chunks {
        println!("  子块         : {name} x {count}");
    }
    if let Some(ref err) = summary.error {
        println!("  错误         : {err}");
    }
    println!("[/FRAMES]");
}

/// 打印 banner
fn print_banner() {
    println!(
        "smush-probe {} - SMUSH 动画信息探测工具",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("用法: smush-probe [选项] <输入文件>");
    println!();
    println!("选项:");
    println!("  -f, --frames          逐帧解码并输出统计信息");
    println!("      --max-frames <N>  最多解码 N 帧");
    println!("      --max-canvas <N>  画布尺寸上限");
    println!("      --json            以 JSON 格式输出");
    println!("  -q, --quiet           静默模式");
    println!("  -v                    提升文件日志详细级别");
    println!("  -h, --help            显示帮助信息");
    println!("  -V, --version         显示版本号");
}
