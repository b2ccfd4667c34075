//! 格式探测.
//!
//! 通过分析文件头部数据和文件扩展名, 判断是否为 SMUSH 动画.

/// 探测置信度
///
/// 数值越高, 表示对格式判断越有信心.
pub type ProbeScore = u32;

/// 最低探测分数 (仅根据扩展名)
pub const SCORE_EXTENSION: ProbeScore = 50;

/// 最高探测分数 (魔数完全匹配)
pub const SCORE_MAX: ProbeScore = 100;

/// 可识别的文件扩展名
const EXTENSIONS: [&str; 2] = [".san", ".anm"];

/// 根据文件头部数据与文件名探测
///
/// # 参数
/// - `data`: 文件开头的若干字节 (至少 12 字节才能匹配魔数)
/// - `filename`: 文件名 (可选, 用于扩展名匹配)
///
/// # 返回
/// - `Some(score)`: 探测成功, 返回置信度
/// - `None`: 不是 SMUSH 动画
pub fn probe(data: &[u8], filename: Option<&str>) -> Option<ProbeScore> {
    // ANIM 块的第一个子块必须是 AHDR
    if data.len() >= 12 && &data[0..4] == b"ANIM" && &data[8..12] == b"AHDR" {
        return Some(SCORE_MAX);
    }

    if let Some(name) = filename {
        let lower = name.to_ascii_lowercase();
        if EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return Some(SCORE_EXTENSION);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_探测_魔数() {
        let mut data = b"ANIM".to_vec();
        data.extend_from_slice(&1000u32.to_be_bytes());
        data.extend_from_slice(b"AHDR");
        assert_eq!(probe(&data, None), Some(SCORE_MAX));
        assert_eq!(probe(&data, Some("intro.bin")), Some(SCORE_MAX));
    }

    #[test]
    fn test_探测_扩展名() {
        assert_eq!(probe(&[], Some("OPENING.SAN")), Some(SCORE_EXTENSION));
        assert_eq!(probe(&[], Some("logo.anm")), Some(SCORE_EXTENSION));
        assert_eq!(probe(&[], Some("movie.avi")), None);
    }

    #[test]
    fn test_探测_非动画数据() {
        assert_eq!(probe(b"RIFF\0\0\0\0WAVE", None), None);
        assert_eq!(probe(b"ANIM", None), None);
    }
}
