//! # smush-core
//!
//! SMUSH 动画解码框架核心库, 提供基础类型定义、错误处理和工具函数.
//!
//! 本 crate 为编解码器 (`smush-codec`) 与容器状态机 (`smush-format`) 提供底层基础设施:
//! - 统一错误类型 [`SmushError`]
//! - 字节切片读取器 [`ByteReader`]
//! - 256 项调色板与增量调色板运算 [`Palette`]

pub mod bytereader;
pub mod error;
pub mod palette;

// 重导出常用类型
pub use bytereader::ByteReader;
pub use error::{SmushError, SmushResult};
pub use palette::{DELTA_TABLE_SIZE, Palette, PALETTE_SIZE};
