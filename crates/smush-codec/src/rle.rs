//! 字节游程解码.
//!
//! 每个控制字节: 低位为 1 时重复下一个字节 `(ctrl >> 1) + 1` 次,
//! 低位为 0 时原样复制其后 `(ctrl >> 1) + 1` 个字节. 游程长度截断到剩余输出.

use smush_core::{ByteReader, SmushResult};

/// 把游程数据解码到 `out`, 直到填满为止
///
/// 输入不足时返回 [`smush_core::SmushError::SizeMismatch`].
pub fn decode_rle(reader: &mut ByteReader<'_>, out: &mut [u8]) -> SmushResult<()> {
    let mut pos = 0;
    while pos < out.len() {
        let ctrl = reader.read_u8()?;
        let run = ((usize::from(ctrl) >> 1) + 1).min(out.len() - pos);
        if ctrl & 1 != 0 {
            let value = reader.read_u8()?;
            out[pos..pos + run].fill(value);
        } else {
            out[pos..pos + run].copy_from_slice(reader.read_bytes(run)?);
        }
        pos += run;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smush_core::SmushError;

    #[test]
    fn test_重复与复制混合() {
        // 0x05: 重复 3 次 0xAA; 0x02: 复制 2 字节
        let data = [0x05, 0xAA, 0x02, 0x01, 0x02];
        let mut out = [0u8; 5];
        decode_rle(&mut ByteReader::new(&data), &mut out).unwrap();
        assert_eq!(out, [0xAA, 0xAA, 0xAA, 0x01, 0x02]);
    }

    #[test]
    fn test_游程截断到剩余输出() {
        // 声明重复 128 次, 只剩 4 字节输出
        let data = [0xFF, 0x07, 0x00];
        let mut out = [0u8; 4];
        let mut br = ByteReader::new(&data);
        decode_rle(&mut br, &mut out).unwrap();
        assert_eq!(out, [7; 4]);
        assert_eq!(br.remaining(), 1);
    }

    #[test]
    fn test_输入不足报错() {
        let data = [0x06, 0x01];
        let mut out = [0u8; 4];
        let err = decode_rle(&mut ByteReader::new(&data), &mut out).unwrap_err();
        assert!(matches!(err, SmushError::SizeMismatch(_)));
    }
}
