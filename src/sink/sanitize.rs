//! Message sanitizer
//!
//! 消息清理器
//!
//! Bounds the encoded size of a caller-supplied message relative to the file's
//! size limit. Truncation is silent and lossy: this is best-effort diagnostics.
//!
//! 根据文件大小上限约束调用方消息的编码大小。
//! 截断是静默且有损的：这是尽力而为的诊断日志。

use super::measure::{encoded_len, prefix_chars, trim_chars_from_end};
use super::SENTINEL;
use std::borrow::Cow;

/// Replacement text for messages larger than the whole file
///
/// 超过整个文件大小的消息的替换文本
pub const OVERSIZE_WARNING: &str = "Message too large to log, truncated: ";

/// Number of leading characters kept after [`OVERSIZE_WARNING`]
///
/// [`OVERSIZE_WARNING`] 之后保留的前导字符数
pub const OVERSIZE_PREVIEW_CHARS: usize = 100;

/// Worst-case UTF-8 bytes per character, used to estimate how much to trim
///
/// 每个字符最坏情况下的 UTF-8 字节数，用于估算截断量
const MAX_BYTES_PER_CHAR: u64 = 4;

/// Replaces the last byte of a message line that would read as a sentinel
///
/// 替换消息中看起来像哨兵的行的最后一个字节
const DEFUSED_MARK: char = '+';

/// Sanitize a message for a file bounded by `size_limit` bytes
///
/// 为大小上限为 `size_limit` 字节的文件清理消息
///
/// 1. A message larger than `size_limit` is replaced by [`OVERSIZE_WARNING`] plus
///    at most its first [`OVERSIZE_PREVIEW_CHARS`] characters.
/// 2. Characters are trimmed from the end until the message encodes to at most
///    `size_limit / 2` bytes, leaving room for at least one more entry.
/// 3. Lines ending with the sentinel literal get their last `*` replaced by `+`.
///
/// 1. 大于 `size_limit` 的消息被替换为 [`OVERSIZE_WARNING`] 加上其前
///    [`OVERSIZE_PREVIEW_CHARS`] 个字符。
/// 2. 从末尾截断字符，直到编码后不超过 `size_limit / 2` 字节，
///    为至少一个后续条目留出空间。
/// 3. 以哨兵字面量结尾的行，其最后一个 `*` 被替换为 `+`。
///
/// # Examples
///
/// ```
/// use sentinel_log::sanitize;
///
/// assert_eq!(sanitize("short", 1024), "short");
/// assert_eq!(sanitize(&"x".repeat(600), 1024).len(), 512);
/// ```
pub fn sanitize(message: &str, size_limit: u64) -> Cow<'_, str> {
    let mut text = if encoded_len(message) > size_limit {
        Cow::Owned(format!(
            "{}{}",
            OVERSIZE_WARNING,
            prefix_chars(message, OVERSIZE_PREVIEW_CHARS)
        ))
    } else {
        Cow::Borrowed(message)
    };

    let limit = size_limit / 2;
    while encoded_len(&text) > limit {
        let overrun = ((encoded_len(&text) - limit) / MAX_BYTES_PER_CHAR).max(1) as usize;
        text = match text {
            Cow::Borrowed(s) => Cow::Borrowed(trim_chars_from_end(s, overrun)),
            Cow::Owned(mut s) => {
                let keep = trim_chars_from_end(&s, overrun).len();
                s.truncate(keep);
                Cow::Owned(s)
            }
        };
    }

    defuse_sentinel_lines(text)
}

/// Rewrite message lines ending with the sentinel literal
///
/// 改写以哨兵字面量结尾的消息行
///
/// A wraparound can cut an old line anywhere, so a line only needs to end with
/// the literal for its tail to be read back as a sentinel later.
///
/// 回绕可能在任意位置截断旧行，因此只要某行以该字面量结尾，其尾部之后就可能被读作哨兵。
fn defuse_sentinel_lines(text: Cow<'_, str>) -> Cow<'_, str> {
    if !text.split('\n').any(ends_with_sentinel) {
        return text;
    }

    let mut out = String::with_capacity(text.len());
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            out.push('\n');
        }
        if ends_with_sentinel(line) {
            // Same length: swap the final '*' and keep any trailing '\r'
            let body = line.strip_suffix('\r').unwrap_or(line);
            out.push_str(&body[..body.len() - 1]);
            out.push(DEFUSED_MARK);
            out.push_str(&line[body.len()..]);
        } else {
            out.push_str(line);
        }
    }
    Cow::Owned(out)
}

fn ends_with_sentinel(line: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line).ends_with(SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_message_untouched() {
        let out = sanitize("hello world", 1024);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, "hello world");
    }

    #[test]
    fn test_message_at_half_limit_is_kept() {
        let message = "a".repeat(512);
        assert_eq!(sanitize(&message, 1024), message);
    }

    #[test]
    fn test_trim_to_half_limit() {
        let message = "b".repeat(900);
        let out = sanitize(&message, 1024);
        assert_eq!(out.len(), 512);
        assert!(message.starts_with(out.as_ref()));
    }

    #[test]
    fn test_trim_multibyte_stays_on_char_boundary() {
        let message = "🦀".repeat(200); // 800 bytes
        let out = sanitize(&message, 1000);
        assert!(encoded_len(&out) <= 500);
        assert!(out.chars().all(|c| c == '🦀'));
        // 500 / 4 = 125 crabs fit exactly
        assert_eq!(out.chars().count(), 125);
    }

    #[test]
    fn test_oversized_message_replaced_with_warning() {
        let message: String = (0..5000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let out = sanitize(&message, 4096);
        assert!(out.starts_with(OVERSIZE_WARNING));
        let preview = &out[OVERSIZE_WARNING.len()..];
        assert_eq!(preview, &message[..OVERSIZE_PREVIEW_CHARS]);
    }

    #[test]
    fn test_oversized_message_with_small_limit_is_still_bounded() {
        let message = "z".repeat(300);
        let out = sanitize(&message, 100);
        assert_eq!(encoded_len(&out), 50);
        assert!(out.starts_with(OVERSIZE_WARNING));
    }

    #[test]
    fn test_embedded_sentinel_line_is_defused() {
        let message = format!("before\n{}\nafter", SENTINEL);
        let out = sanitize(&message, 4096);
        assert_eq!(out, "before\n*********+\nafter");
        assert_eq!(out.len(), message.len());
    }

    #[test]
    fn test_embedded_sentinel_with_carriage_return_is_defused() {
        let message = format!("x\n{}\r\ny", SENTINEL);
        let out = sanitize(&message, 4096);
        assert_eq!(out, "x\n*********+\r\ny");
    }

    #[test]
    fn test_line_ending_with_sentinel_is_defused() {
        assert_eq!(sanitize(SENTINEL, 4096), "*********+");
        assert_eq!(sanitize("done ***********", 4096), "done **********+");
        assert_eq!(sanitize("a**********\nb", 4096), "a*********+\nb");
    }

    #[test]
    fn test_short_star_runs_are_kept() {
        let message = "*********\n** rating **";
        assert_eq!(sanitize(message, 4096), message);
    }

    #[test]
    fn test_trim_cannot_expose_sentinel() {
        // Trimming stops exactly at "head\n**********"
        // 截断恰好停在 "head\n**********"
        let message = format!("head\n{}", "*".repeat(20));
        let out = sanitize(&message, 30);
        assert_eq!(out, "head\n*********+");
    }
}
