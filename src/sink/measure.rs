//! Byte-accurate text measurement
//!
//! 按字节精确的文本度量
//!
//! Offsets in the log file are byte offsets, while trimming works on characters.
//! Every piece of offset arithmetic goes through these helpers so the two never
//! get mixed up under multi-byte UTF-8.
//!
//! 日志文件中的偏移量是字节偏移，而截断按字符进行。
//! 所有偏移计算都经过这些辅助函数，避免在多字节 UTF-8 下混淆两者。

/// Exact UTF-8 encoded length of `text` in bytes
///
/// `text` 的 UTF-8 编码字节长度
///
/// # Examples
///
/// ```
/// use sentinel_log::encoded_len;
///
/// assert_eq!(encoded_len("abc"), 3);
/// assert_eq!(encoded_len("日志"), 6);
/// assert_eq!(encoded_len("🦀"), 4);
/// ```
#[inline]
pub fn encoded_len(text: &str) -> u64 {
    text.len() as u64
}

/// Return at most the first `count` characters of `text`
///
/// 返回 `text` 的前 `count` 个字符（最多）
#[inline]
pub fn prefix_chars(text: &str, count: usize) -> &str {
    match text.char_indices().nth(count) {
        Some((boundary, _)) => &text[..boundary],
        None => text,
    }
}

/// Drop `count` characters from the end of `text`
///
/// 从 `text` 末尾删除 `count` 个字符
///
/// Returns an empty string when `count` is at least the number of characters.
///
/// 当 `count` 不小于字符数时返回空字符串。
#[inline]
pub fn trim_chars_from_end(text: &str, count: usize) -> &str {
    if count == 0 {
        return text;
    }
    match text.char_indices().rev().nth(count - 1) {
        Some((boundary, _)) => &text[..boundary],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_len_multibyte() {
        assert_eq!(encoded_len(""), 0);
        assert_eq!(encoded_len("é"), 2);
        assert_eq!(encoded_len("a日🦀"), 1 + 3 + 4);
    }

    #[test]
    fn test_prefix_chars() {
        assert_eq!(prefix_chars("hello", 3), "hel");
        assert_eq!(prefix_chars("hello", 10), "hello");
        assert_eq!(prefix_chars("日志文件", 2), "日志");
        assert_eq!(prefix_chars("abc", 0), "");
    }

    #[test]
    fn test_trim_chars_from_end() {
        assert_eq!(trim_chars_from_end("hello", 0), "hello");
        assert_eq!(trim_chars_from_end("hello", 2), "hel");
        assert_eq!(trim_chars_from_end("a🦀🦀", 1), "a🦀");
        assert_eq!(trim_chars_from_end("a🦀🦀", 3), "");
        assert_eq!(trim_chars_from_end("ab", 5), "");
    }
}
