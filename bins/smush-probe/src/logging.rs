//! 日志初始化模块.
//!
//! 双输出:
//! - console: 彩色, 输出到 stderr, 避免与 JSON 结果混在一起
//! - file: 无色, 默认 info, 可通过 -v/-vv 或 SMUSH_LOG 环境变量调整
//!
//! 日志文件输出到 $cwd/logs/{prefix}.{date}.log. 日志目录不可写时只保留 console 输出.

use chrono::Local;
use std::sync::OnceLock;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, FormatEvent, FormatFields, format::Writer},
    layer::{Layer, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
};

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 文件日志级别环境变量
pub const LOG_ENV: &str = "SMUSH_LOG";

/// 由 -v 次数得到文件日志级别
pub fn file_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// 初始化日志系统
///
/// - `file_prefix`: 日志文件前缀 (如 "smush-probe")
/// - `verbosity`: 0=info, 1=debug, 2+=trace
/// - `quiet`: 为真时 console 只输出 warn 及以上
pub fn init(file_prefix: &str, verbosity: u8, quiet: bool) {
    let console_filter = EnvFilter::new(if quiet { "warn" } else { "info" });
    let console_layer = fmt::Layer::default()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .event_format(LineFormatter { ansi: true })
        .with_filter(console_filter);

    let file_layer = build_file_writer(file_prefix).map(|writer| {
        let file_filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(file_level(verbosity)));
        fmt::Layer::default()
            .with_writer(writer)
            .with_ansi(false)
            .event_format(LineFormatter { ansi: false })
            .with_filter(file_filter)
    });

    let result = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
    if let Err(e) = result {
        eprintln!("警告: 日志系统初始化失败: {e}");
    }
}

fn build_file_writer(file_prefix: &str) -> Option<tracing_appender::non_blocking::NonBlocking> {
    if let Err(e) = std::fs::create_dir_all("logs") {
        eprintln!("警告: 无法创建日志目录: {e}");
        return None;
    }

    let file_appender = match tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(file_prefix)
        .filename_suffix("log")
        .build("logs")
    {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("警告: 创建日志文件失败: {e}");
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();
    Some(non_blocking)
}

/// 单行格式: `[月-日 时:分:秒.毫秒] 级别 模块 > 消息`
///
/// 模块名去掉 `smush_` 前缀, 只保留 crate 内路径 (如 `format::decoder`).
/// `ansi` 为真时级别带颜色.
struct LineFormatter {
    ansi: bool,
}

/// 缩短日志目标: `smush_format::decoder` -> `format::decoder`
fn short_target(target: &str) -> &str {
    target.strip_prefix("smush_").unwrap_or(target)
}

fn level_color(level: tracing::Level) -> &'static str {
    match level {
        tracing::Level::ERROR => "\x1b[31m",
        tracing::Level::WARN => "\x1b[33m",
        tracing::Level::INFO => "\x1b[32m",
        _ => "\x1b[34m",
    }
}

impl<S, N> FormatEvent<S, N> for LineFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = Local::now();
        let meta = event.metadata();
        write!(
            writer,
            "[{}.{:03}] ",
            now.format("%m-%d %H:%M:%S"),
            now.timestamp_subsec_millis()
        )?;
        if self.ansi {
            write!(writer, "{}{:5}\x1b[0m", level_color(*meta.level()), meta.level())?;
        } else {
            write!(writer, "{:5}", meta.level())?;
        }
        write!(writer, " {} > ", short_target(meta.target()))?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
