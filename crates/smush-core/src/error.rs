//! 统一错误类型定义.
//!
//! 所有 smush crate 共用的错误类型, 支持跨模块传播.
//! 任何错误都意味着当前码流不可继续解码, 不做重试.

use thiserror::Error;

/// SMUSH 框架统一错误类型
#[derive(Debug, Error)]
pub enum SmushError {
    /// 数据源返回的字节数少于请求数, 码流此后不可用
    #[error("数据截断: 需要 {expected} 字节, 实际读取 {actual} 字节")]
    Truncated {
        /// 请求的字节数
        expected: usize,
        /// 实际读到的字节数
        actual: usize,
    },

    /// 头部缺失或格式错误 (全局头、帧头、音频子块签名等)
    #[error("头部格式错误: {0}")]
    MalformedHeader(String),

    /// 帧对象的编解码器编号不受支持
    #[error("不支持的编解码器: {0}")]
    UnsupportedCodec(u16),

    /// 帧内出现未知的子块标签
    #[error("未知的块标签: {0}")]
    UnknownChunk(String),

    /// 子块声明的大小超出父块剩余预算, 或块内读取越界
    #[error("块大小不匹配: {0}")]
    SizeMismatch(String),

    /// 像素缓冲区无法扩展
    #[error("内存分配失败: {0}")]
    AllocationFailure(String),

    /// 无效参数 (调用顺序错误等)
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 数据源 I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 在帧边界处到达流末尾
    #[error("已到达流末尾")]
    Eof,
}

/// SMUSH 框架统一 Result 类型
pub type SmushResult<T> = Result<T, SmushError>;
