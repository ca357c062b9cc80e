//! Wraparound writer
//!
//! 回绕写入器
//!
//! Writes one entry followed by a fresh sentinel. When the pair would push the
//! file past its size limit, the current sentinel is blanked and the write
//! restarts at offset 0, overwriting the oldest bytes.
//!
//! 写入一个条目并紧跟新的哨兵。当这一对会使文件超过大小上限时，
//! 先抹除当前哨兵，再从偏移 0 重新写入，覆盖最旧的字节。

use super::cursor::is_sentinel_line;
use super::error::{Error, Result};
use super::{LINE_TERMINATOR, SENTINEL, SENTINEL_LINE};
use chrono::{DateTime, TimeZone};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

/// Timestamp format of every entry (millisecond precision)
///
/// 每个条目的时间戳格式（毫秒精度）
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Bytes an entry adds around its message: timestamp, `|` and line terminator
///
/// 条目在消息之外增加的字节数：时间戳、`|` 和行终止符
pub const ENTRY_OVERHEAD: u64 = 23 + 1 + LINE_TERMINATOR.len() as u64;

/// Spaces written over a sentinel left behind by a wraparound
///
/// 回绕时覆盖遗留哨兵的空格
const BLANK: [u8; SENTINEL.len()] = [b' '; SENTINEL.len()];

/// Format `<timestamp>|<message><line-terminator>`
///
/// 格式化 `<时间戳>|<消息><行终止符>`
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use sentinel_log::format_entry;
///
/// let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
/// assert_eq!(format_entry(&at, "ready"), "2024-05-01 12:30:00.000|ready\n");
/// ```
pub fn format_entry<Tz>(at: &DateTime<Tz>, message: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}|{}{}", at.format(TIMESTAMP_FORMAT), message, LINE_TERMINATOR)
}

/// Where an entry and its sentinel ended up
///
/// 条目及其哨兵的写入位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Offset of the entry's first byte
    ///
    /// 条目首字节偏移
    pub entry_offset: u64,

    /// Offset of the new sentinel; the next entry starts here
    ///
    /// 新哨兵的偏移；下一个条目从这里开始
    pub sentinel_offset: u64,

    /// Whether the write wrapped around to offset 0
    ///
    /// 写入是否回绕到了偏移 0
    pub wrapped: bool,
}

/// Write `entry` and a fresh sentinel into `file`
///
/// 将 `entry` 和新的哨兵写入 `file`
///
/// - `cursor == None` (empty or corrupt file): write at offset 0. If the old
///   bytes right after the new sentinel line read as a sentinel line, they are
///   blanked.
/// - `cursor == Some(offset)`: write at `offset`, unless the entry plus the
///   sentinel line would end past `size_limit`. In that case the sentinel
///   characters at `offset` are overwritten with spaces first and the write
///   starts at offset 0.
///
/// - `cursor == None`（空文件或损坏文件）：从偏移 0 写入；若新哨兵行之后的旧字节
///   恰好构成一行哨兵，则将其清空。
/// - `cursor == Some(offset)`：从 `offset` 写入；若条目加哨兵行会超过 `size_limit`，
///   先用空格覆盖 `offset` 处的哨兵字符，再从偏移 0 写入。
///
/// Must be called while the exclusive section is held.
///
/// 必须在持有独占区时调用。
///
/// # Errors
/// - Returns `InvalidSizeLimit` if the entry and sentinel cannot fit even at offset 0
/// - Returns corresponding I/O errors if seeking or writing fails
///
/// # Errors
/// - 如果条目和哨兵即使从偏移 0 开始也放不下，返回 `InvalidSizeLimit` 错误
/// - 如果定位或写入失败，返回相应的 I/O 错误
pub(crate) fn write_entry(
    file: &mut File,
    cursor: Option<u64>,
    entry: &[u8],
    size_limit: u64,
    sync: bool,
) -> Result<WriteOutcome> {
    let unit = entry.len() as u64 + SENTINEL_LINE.len() as u64;
    if unit > size_limit {
        return Err(Error::InvalidSizeLimit {
            limit: size_limit,
            minimum: unit,
        });
    }

    let (entry_offset, wrapped) = match cursor {
        None => (0, false),
        Some(offset) if offset.saturating_add(unit) > size_limit => {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&BLANK)?;
            tracing::trace!(offset, unit, size_limit, "log file full, wrapping to offset 0");
            (0, true)
        }
        Some(offset) => (offset, false),
    };

    file.seek(SeekFrom::Start(entry_offset))?;
    file.write_all(entry)?;
    file.flush()?;

    let sentinel_offset = entry_offset + entry.len() as u64;
    file.write_all(SENTINEL_LINE.as_bytes())?;
    file.flush()?;

    if cursor.is_none() {
        blank_exposed_sentinel(file, sentinel_offset + SENTINEL_LINE.len() as u64)?;
    }

    if sync {
        file.sync_data()?;
    }

    Ok(WriteOutcome {
        entry_offset,
        sentinel_offset,
        wrapped,
    })
}

/// Blank the line starting at `offset` if it reads as a sentinel
///
/// 若从 `offset` 开始的行构成哨兵，则将其清空
///
/// Re-initializing a corrupt file creates exactly one new line start among the
/// old bytes. Every whole line after it already failed the scan.
///
/// 重新初始化损坏文件时，只会在旧字节中产生一个新的行首。其后的完整行都已在扫描中被排除。
fn blank_exposed_sentinel(file: &mut File, offset: u64) -> Result<()> {
    let mut line = Vec::with_capacity(SENTINEL_LINE.len() + 1);
    file.seek(SeekFrom::Start(offset))?;
    std::io::Read::by_ref(file)
        .take(SENTINEL_LINE.len() as u64 + 1)
        .read_to_end(&mut line)?;

    let end = line.iter().position(|&b| b == b'\n').unwrap_or(line.len());
    if is_sentinel_line(&line[..end]) {
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&BLANK)?;
        file.flush()?;
        tracing::trace!(offset, "blanked stale sentinel exposed by re-initialization");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::fs::{self, OpenOptions};
    use tempfile::tempdir;

    fn open(path: &std::path::Path) -> File {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .unwrap()
    }

    #[test]
    fn test_entry_overhead_matches_format() {
        let entry = format_entry(&Utc::now(), "");
        assert_eq!(entry.len() as u64, ENTRY_OVERHEAD);
    }

    #[test]
    fn test_initialize_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("init.log");
        let mut file = open(&path);

        let outcome = write_entry(&mut file, None, b"t|first\n", 100, false).unwrap();
        assert_eq!(
            outcome,
            WriteOutcome { entry_offset: 0, sentinel_offset: 8, wrapped: false }
        );
        assert_eq!(fs::read(&path).unwrap(), b"t|first\n**********\n");
    }

    #[test]
    fn test_write_at_cursor_overwrites_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cursor.log");
        let mut file = open(&path);

        write_entry(&mut file, None, b"t|a\n", 100, false).unwrap();
        let outcome = write_entry(&mut file, Some(4), b"t|bb\n", 100, false).unwrap();

        assert_eq!(outcome.entry_offset, 4);
        assert_eq!(outcome.sentinel_offset, 9);
        assert_eq!(fs::read(&path).unwrap(), b"t|a\nt|bb\n**********\n");
    }

    #[test]
    fn test_wraparound_blanks_old_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wrap.log");
        let mut file = open(&path);

        let first = [b'x'; 20];
        let mut entry = first.to_vec();
        entry.push(b'\n');
        let outcome = write_entry(&mut file, None, &entry, 38, false).unwrap();
        assert_eq!(outcome.sentinel_offset, 21);

        // 21 + 7 + 11 > 38: wrap
        let outcome = write_entry(&mut file, Some(21), b"t|wrap\n", 38, true).unwrap();
        assert!(outcome.wrapped);
        assert_eq!(outcome.entry_offset, 0);
        assert_eq!(outcome.sentinel_offset, 7);

        let content = fs::read(&path).unwrap();
        assert_eq!(content.len(), 32);
        assert_eq!(&content[..18], b"t|wrap\n**********\n");
        assert_eq!(&content[21..31], b"          ");
        assert_eq!(content[31], b'\n');
    }

    #[test]
    fn test_reinitialize_blanks_exposed_sentinel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forged.log");

        // Garbage line whose tail lines up with the end of the new sentinel line
        // 垃圾行的尾部恰好与新哨兵行的末尾对齐
        let mut garbage = vec![b'x'];
        garbage.extend_from_slice(&[b'a'; 29]);
        garbage.extend_from_slice(b"**********\n");
        fs::write(&path, &garbage).unwrap();
        let mut file = open(&path);

        let outcome = write_entry(&mut file, None, b"t|fresh start here\n", 100, false).unwrap();
        assert_eq!(outcome.sentinel_offset, 19);

        let content = fs::read(&path).unwrap();
        assert_eq!(&content[..30], b"t|fresh start here\n**********\n");
        assert_eq!(&content[30..40], b"          ");
        assert_eq!(content[40], b'\n');
    }

    #[test]
    fn test_reinitialize_keeps_other_stale_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stale.log");
        fs::write(&path, b"old garbage line that is long\n").unwrap();
        let mut file = open(&path);

        write_entry(&mut file, None, b"t|a\n", 100, false).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"t|a\n**********\ne that is long\n");
    }

    #[test]
    fn test_entry_larger_than_limit_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reject.log");
        let mut file = open(&path);

        let entry = vec![b'y'; 95];
        let err = write_entry(&mut file, None, &entry, 100, false).unwrap_err();
        assert!(matches!(err, Error::InvalidSizeLimit { limit: 100, minimum: 106 }));
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }
}
