//! Sink configuration
//!
//! 日志汇配置

use super::error::{Error, Result};
use super::writer::ENTRY_OVERHEAD;
use super::SENTINEL_LINE;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default size limit of the log file: 3 MiB
///
/// 日志文件默认大小上限：3 MiB
pub const DEFAULT_SIZE_LIMIT: u64 = 3 * 1024 * 1024;

/// Smallest accepted size limit
///
/// 可接受的最小大小上限
///
/// A sanitized message may take half the limit; the other half must still hold
/// the entry prefix, its terminator and the sentinel line.
///
/// 清理后的消息最多占用一半上限；另一半必须能容纳条目前缀、行终止符和哨兵行。
pub const MIN_SIZE_LIMIT: u64 = 2 * (ENTRY_OVERHEAD + SENTINEL_LINE.len() as u64);

/// How long a writer waits for the exclusive section
///
/// 写入者等待独占区的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LockWait {
    /// Block until the section is free
    ///
    /// 阻塞直到独占区可用
    ///
    /// The OS releases the lock when its holder exits, so a crashed writer does
    /// not wedge the others.
    ///
    /// 持有者退出时操作系统会释放锁，因此崩溃的写入者不会卡住其他写入者。
    #[default]
    Unbounded,

    /// Give up and drop the entry after the given duration
    ///
    /// 超过给定时长后放弃并丢弃该条目
    Bounded(Duration),
}

/// Configuration of a [`TraceSink`](super::TraceSink)
///
/// [`TraceSink`](super::TraceSink) 的配置
///
/// # Examples
///
/// ```
/// use sentinel_log::{LockWait, SinkConfig, DEFAULT_SIZE_LIMIT};
/// use std::time::Duration;
///
/// let config = SinkConfig::new("/var/tmp/app-trace.log")
///     .with_lock_wait(LockWait::Bounded(Duration::from_secs(2)));
///
/// assert_eq!(config.size_limit, DEFAULT_SIZE_LIMIT);
/// assert_eq!(config.lock_path().to_str(), Some("/var/tmp/app-trace.log.lock"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SinkConfig {
    /// Path of the shared log file
    ///
    /// 共享日志文件路径
    pub path: PathBuf,

    /// Maximum size of the log file in bytes
    ///
    /// 日志文件的最大字节数
    #[cfg_attr(feature = "serde", serde(default = "default_size_limit"))]
    pub size_limit: u64,

    /// Lock file naming the exclusive section; defaults to `<path>.lock`
    ///
    /// 命名独占区的锁文件；默认为 `<path>.lock`
    #[cfg_attr(feature = "serde", serde(default))]
    pub lock_path: Option<PathBuf>,

    /// Lock wait policy
    ///
    /// 锁等待策略
    #[cfg_attr(feature = "serde", serde(default))]
    pub lock_wait: LockWait,

    /// Call `sync_data` after every entry
    ///
    /// 每个条目之后调用 `sync_data`
    #[cfg_attr(feature = "serde", serde(default))]
    pub sync_writes: bool,
}

#[cfg(feature = "serde")]
fn default_size_limit() -> u64 {
    DEFAULT_SIZE_LIMIT
}

impl SinkConfig {
    /// Configuration for `path` with all defaults
    ///
    /// 使用全部默认值的 `path` 配置
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            size_limit: DEFAULT_SIZE_LIMIT,
            lock_path: None,
            lock_wait: LockWait::Unbounded,
            sync_writes: false,
        }
    }

    /// Set the size limit
    ///
    /// 设置大小上限
    pub fn with_size_limit(mut self, size_limit: u64) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Use an explicit lock file instead of `<path>.lock`
    ///
    /// 使用指定的锁文件代替 `<path>.lock`
    pub fn with_lock_path(mut self, lock_path: impl AsRef<Path>) -> Self {
        self.lock_path = Some(lock_path.as_ref().to_path_buf());
        self
    }

    /// Set the lock wait policy
    ///
    /// 设置锁等待策略
    pub fn with_lock_wait(mut self, lock_wait: LockWait) -> Self {
        self.lock_wait = lock_wait;
        self
    }

    /// Enable or disable `sync_data` after every entry
    ///
    /// 启用或禁用每个条目之后的 `sync_data`
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Effective lock file path
    ///
    /// 实际使用的锁文件路径
    pub fn lock_path(&self) -> PathBuf {
        match &self.lock_path {
            Some(path) => path.clone(),
            None => {
                let mut name: OsString = self.path.clone().into_os_string();
                name.push(".lock");
                PathBuf::from(name)
            }
        }
    }

    /// Check that the configuration can hold at least one entry
    ///
    /// 检查配置至少能容纳一个条目
    ///
    /// # Errors
    /// Returns `InvalidSizeLimit` if `size_limit` is below [`MIN_SIZE_LIMIT`]
    ///
    /// # Errors
    /// 如果 `size_limit` 小于 [`MIN_SIZE_LIMIT`]，返回 `InvalidSizeLimit` 错误
    pub fn validate(&self) -> Result<()> {
        if self.size_limit < MIN_SIZE_LIMIT {
            return Err(Error::InvalidSizeLimit {
                limit: self.size_limit,
                minimum: MIN_SIZE_LIMIT,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SinkConfig::new("trace.log");
        assert_eq!(config.size_limit, 3 * 1024 * 1024);
        assert_eq!(config.lock_wait, LockWait::Unbounded);
        assert!(!config.sync_writes);
        assert_eq!(config.lock_path(), PathBuf::from("trace.log.lock"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_lock_path() {
        let config = SinkConfig::new("a/trace.log").with_lock_path("b/shared.lock");
        assert_eq!(config.lock_path(), PathBuf::from("b/shared.lock"));
    }

    #[test]
    fn test_min_size_limit() {
        assert_eq!(MIN_SIZE_LIMIT, 72);
        assert!(SinkConfig::new("x").with_size_limit(MIN_SIZE_LIMIT).validate().is_ok());

        let err = SinkConfig::new("x").with_size_limit(MIN_SIZE_LIMIT - 1).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidSizeLimit { limit: 71, minimum: 72 }));
    }
}
