//! Cursor locator
//!
//! 游标定位器
//!
//! Finds the start offset of the sentinel line using only persisted bytes. The
//! process-local hint narrows the scan but is never trusted: when it is stale
//! (another process wrote since, or the file wrapped), the scan falls back to
//! the whole file.
//!
//! 仅依据已持久化的字节查找哨兵行的起始偏移。进程内提示用于缩小扫描范围，
//! 但从不被信任：当它过期（其他进程已写入，或文件已回绕）时，扫描退回到整个文件。

use super::SENTINEL;

/// Whether `line` (without its `\n`) is exactly the sentinel literal
///
/// `line`（不含 `\n`）是否恰好是哨兵字面量
///
/// A trailing `\r` is treated as part of the terminator.
///
/// 末尾的 `\r` 视为终止符的一部分。
#[inline]
pub(crate) fn is_sentinel_line(line: &[u8]) -> bool {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line == SENTINEL.as_bytes()
}

/// Locate the sentinel in `content`, starting near `hint` when one is given
///
/// 在 `content` 中定位哨兵，若提供了 `hint` 则从其附近开始
///
/// 1. With a hint, walk backward from `hint - 1` to the previous `\n`; the byte
///    after it (or 0) is where the forward scan starts.
/// 2. Read lines forward, tracking the byte offset of each line start; the first
///    line equal to the sentinel literal is the answer.
/// 3. If the hinted scan reaches the end without a match, rescan from 0.
///
/// 1. 有提示时，从 `hint - 1` 向后查找上一个 `\n`；其后一个字节（或 0）作为正向扫描的起点。
/// 2. 正向逐行读取，记录每行起始的字节偏移；第一个等于哨兵字面量的行即为结果。
/// 3. 若带提示的扫描到达末尾仍未匹配，则从 0 重新扫描。
///
/// Returns `None` for an empty file or a file without a sentinel, which the
/// writer treats as "initialize at offset 0".
///
/// 对于空文件或不含哨兵的文件返回 `None`，写入器将其视为"从偏移 0 初始化"。
///
/// # Examples
///
/// ```
/// use sentinel_log::locate_sentinel;
///
/// let content = b"2024-05-01 12:00:00.000|hello\n**********\nstale tail\n";
/// assert_eq!(locate_sentinel(content, None), Some(30));
///
/// // Any hint still finds the same sentinel
/// // 任意提示都能找到同一个哨兵
/// assert_eq!(locate_sentinel(content, Some(0)), Some(30));
/// assert_eq!(locate_sentinel(content, Some(45)), Some(30));
/// assert_eq!(locate_sentinel(content, Some(10_000)), Some(30));
/// ```
pub fn locate_sentinel(content: &[u8], hint: Option<u64>) -> Option<u64> {
    if let Some(hint) = hint {
        let start = line_start_before(content, hint);
        if let Some(offset) = scan_forward(content, start) {
            return Some(offset);
        }
        if start == 0 {
            // The hinted scan already covered the whole file
            return None;
        }
        tracing::trace!(hint, start, "cursor hint stale, rescanning whole file");
    }

    scan_forward(content, 0)
}

/// Offset of the first byte of the line containing `hint - 1`
///
/// 包含 `hint - 1` 的行的首字节偏移
fn line_start_before(content: &[u8], hint: u64) -> usize {
    let end = hint.min(content.len() as u64) as usize;
    content[..end]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1)
}

fn scan_forward(content: &[u8], start: usize) -> Option<u64> {
    let mut offset = start;
    for line in content[start..].split_inclusive(|&b| b == b'\n') {
        let text = line.strip_suffix(b"\n").unwrap_or(line);
        if is_sentinel_line(text) {
            return Some(offset as u64);
        }
        offset += line.len();
    }
    None
}
