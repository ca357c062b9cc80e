//! Writer context tying the pieces together
//!
//! 将各组件串联起来的写入上下文

use super::config::SinkConfig;
use super::error::Result;
use super::sanitize::sanitize;
use super::section::{open_shared, ExclusiveSection};
use super::view::locate_in_file;
use super::writer::{format_entry, write_entry, WriteOutcome};
use chrono::Local;
use std::fs::OpenOptions;
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-owned handle for writing to a shared, size-bounded log file
///
/// 进程持有的、用于写入共享限长日志文件的句柄
///
/// Holds the two pieces of process state the design needs: the exclusive
/// section handle and the cursor hint. Construct it once and share it (it is
/// `Send + Sync`), or install one process-wide with [`install`](super::install).
///
/// 持有设计所需的两项进程状态：独占区句柄和游标提示。
/// 创建一次后共享（它是 `Send + Sync` 的），或通过 [`install`](super::install) 安装为进程级实例。
///
/// # Features
///
/// - **Bounded**: the file never grows past the configured size limit
/// - **Self-describing**: the write position is recovered from the file on every write
/// - **Multi-process safe**: all writers serialize on one machine-wide lock
/// - **Infallible for callers**: [`log`](Self::log) never returns or surfaces an error
///
/// # 特性
///
/// - **有界**：文件永远不会超过配置的大小上限
/// - **自描述**：每次写入都从文件中恢复写入位置
/// - **多进程安全**：所有写入者在同一个机器范围锁上串行
/// - **对调用方无错误**：[`log`](Self::log) 从不返回或暴露错误
///
/// # Examples
///
/// ```
/// # use sentinel_log::{SinkConfig, TraceSink, Result, SENTINEL};
/// # use tempfile::tempdir;
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// # let path = dir.path().join("trace.log");
/// let sink = TraceSink::open(&path)?;
/// sink.log("hello");
///
/// let content = std::fs::read_to_string(&path)?;
/// let mut lines = content.lines();
/// assert!(lines.next().unwrap().ends_with("|hello"));
/// assert_eq!(lines.next(), Some(SENTINEL));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct TraceSink {
    /// Validated configuration
    ///
    /// 已校验的配置
    config: SinkConfig,

    /// Machine-wide lock guarding read-scan-write
    ///
    /// 保护读取-扫描-写入的机器范围锁
    section: ExclusiveSection,

    /// Last known sentinel offset; advisory only
    ///
    /// 最近已知的哨兵偏移；仅作参考
    hint: Mutex<Option<u64>>,
}

impl TraceSink {
    /// Create a sink from `config`
    ///
    /// 根据 `config` 创建日志汇
    ///
    /// The lock file is created here; the log file itself is created on the
    /// first write.
    ///
    /// 锁文件在此创建；日志文件本身在首次写入时创建。
    ///
    /// # Errors
    /// - Returns `InvalidSizeLimit` if the size limit is too small
    /// - Returns corresponding I/O errors if the lock file cannot be opened
    ///
    /// # Errors
    /// - 如果大小上限太小，返回 `InvalidSizeLimit` 错误
    /// - 如果无法打开锁文件，返回相应的 I/O 错误
    pub fn new(config: SinkConfig) -> Result<Self> {
        config.validate()?;
        let section = ExclusiveSection::open(config.lock_path())?;
        Ok(Self {
            config,
            section,
            hint: Mutex::new(None),
        })
    }

    /// Create a sink for `path` with the default configuration
    ///
    /// 使用默认配置为 `path` 创建日志汇
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::new(SinkConfig::new(path))
    }

    /// Configuration in use
    ///
    /// 当前使用的配置
    #[inline]
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Append `message` as a new entry; never fails
    ///
    /// 将 `message` 作为新条目写入；永不失败
    ///
    /// Any failure (full disk, permission denied, lock timeout) drops the entry.
    /// The error is reported as a debug-level `tracing` event and never reaches
    /// the caller. The exclusive section is released on every path.
    ///
    /// 任何失败（磁盘已满、权限不足、锁超时）都会丢弃该条目。
    /// 错误以 debug 级别的 `tracing` 事件报告，不会传递给调用方。独占区在所有路径上都会被释放。
    ///
    /// Messages are stored as given except that long ones are trimmed (see
    /// [`sanitize`](super::sanitize)) and any line ending in
    /// [`SENTINEL`](super::SENTINEL) has its last `*` stored as `+`, so it can
    /// never be mistaken for the write position.
    ///
    /// 消息按原样存储，但过长的消息会被截断（见 [`sanitize`](super::sanitize)），
    /// 且任何以 [`SENTINEL`](super::SENTINEL) 结尾的行，其最后一个 `*` 会存为 `+`，
    /// 从而不会被误认为写入位置。
    pub fn log(&self, message: &str) {
        if let Err(err) = self.try_log(message) {
            tracing::debug!(
                path = %self.config.path.display(),
                error = %err,
                "dropped trace entry"
            );
        }
    }

    /// Append `message` as a new entry, reporting failures
    ///
    /// 将 `message` 作为新条目写入，并报告失败
    ///
    /// # Errors
    /// - Returns `LockTimeout` if a bounded lock wait expires
    /// - Returns corresponding I/O errors if the log file cannot be written
    ///
    /// # Errors
    /// - 有限等待超时返回 `LockTimeout` 错误
    /// - 无法写入日志文件时返回相应的 I/O 错误
    pub fn try_log(&self, message: &str) -> Result<()> {
        self.write(message).map(|_| ())
    }

    /// Append `message` and report where it landed
    ///
    /// 写入 `message` 并报告其写入位置
    ///
    /// # Examples
    ///
    /// ```
    /// # use sentinel_log::{TraceSink, Result, ENTRY_OVERHEAD};
    /// # use tempfile::tempdir;
    /// # fn main() -> Result<()> {
    /// # let dir = tempdir()?;
    /// let sink = TraceSink::open(dir.path().join("trace.log"))?;
    ///
    /// let outcome = sink.write("ready")?;
    /// assert_eq!(outcome.entry_offset, 0);
    /// assert_eq!(outcome.sentinel_offset, ENTRY_OVERHEAD + 5);
    /// assert!(!outcome.wrapped);
    /// assert_eq!(sink.cursor_hint(), Some(outcome.sentinel_offset));
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Same as [`try_log`](Self::try_log)
    ///
    /// # Errors
    /// 与 [`try_log`](Self::try_log) 相同
    pub fn write(&self, message: &str) -> Result<WriteOutcome> {
        let message = sanitize(message, self.config.size_limit);

        let _section = self.section.acquire(self.config.lock_wait)?;
        let mut hint = self.hint();
        let result = self.write_locked(&message, *hint);

        // A failed write may have left the file anywhere; rescan next time
        *hint = result.as_ref().ok().map(|outcome| outcome.sentinel_offset);
        result
    }

    /// Scan and write; the exclusive section must be held
    ///
    /// 扫描并写入；必须持有独占区
    fn write_locked(&self, message: &str, hint: Option<u64>) -> Result<WriteOutcome> {
        let mut file = open_shared(&self.config.path)?;
        let cursor = locate_in_file(&file, hint)?;
        let entry = format_entry(&Local::now(), message);
        write_entry(
            &mut file,
            cursor,
            entry.as_bytes(),
            self.config.size_limit,
            self.config.sync_writes,
        )
    }

    /// Locate the live sentinel under the exclusive section
    ///
    /// 在独占区内定位当前有效的哨兵
    ///
    /// Returns `None` if the log file does not exist yet or holds no sentinel.
    ///
    /// 如果日志文件尚不存在或不含哨兵，返回 `None`。
    pub fn locate(&self) -> Result<Option<u64>> {
        let _section = self.section.acquire(self.config.lock_wait)?;
        let hint = *self.hint();

        let file = match OpenOptions::new().read(true).open(&self.config.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        locate_in_file(&file, hint)
    }

    /// Cached sentinel offset from this process's last successful write
    ///
    /// 本进程上次成功写入时缓存的哨兵偏移
    #[inline]
    pub fn cursor_hint(&self) -> Option<u64> {
        *self.hint()
    }

    #[cfg(test)]
    pub(crate) fn set_cursor_hint(&self, hint: Option<u64>) {
        *self.hint() = hint;
    }

    fn hint(&self) -> MutexGuard<'_, Option<u64>> {
        self.hint.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
