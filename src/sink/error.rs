//! Error types for sentinel-log
//!
//! sentinel-log 的错误类型

use std::fmt;
use std::io;
use std::time::Duration;

/// Error type for sentinel-log operations
///
/// sentinel-log 操作的错误类型
///
/// These errors never reach callers of [`TraceSink::log`](super::TraceSink::log);
/// they are only visible through [`TraceSink::try_log`](super::TraceSink::try_log)
/// and the debug-level `tracing` events emitted when an entry is dropped.
///
/// 这些错误不会传递给 [`TraceSink::log`](super::TraceSink::log) 的调用者，
/// 只能通过 [`TraceSink::try_log`](super::TraceSink::try_log)
/// 以及丢弃条目时发出的 debug 级别 `tracing` 事件观察到。
#[derive(Debug)]
pub enum Error {
    /// I/O error
    ///
    /// I/O 错误
    Io(io::Error),

    /// Empty file cannot be mapped
    ///
    /// 空文件无法映射
    EmptyFile,

    /// The exclusive section could not be acquired before the configured deadline
    ///
    /// 在配置的期限内未能获取独占区
    LockTimeout {
        waited: Duration,
    },

    /// Size limit too small to hold a single entry and its sentinel
    ///
    /// 大小上限太小，无法容纳一个条目及其哨兵
    InvalidSizeLimit {
        limit: u64,
        minimum: u64,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::EmptyFile => write!(f, "Cannot map empty file / 无法映射空文件"),
            Error::LockTimeout { waited } => {
                write!(
                    f,
                    "Exclusive section not acquired within {:?} / {:?} 内未能获取独占区",
                    waited, waited
                )
            }
            Error::InvalidSizeLimit { limit, minimum } => {
                write!(
                    f,
                    "Size limit {} is smaller than minimum {} / 大小上限 {} 小于最小值 {}",
                    limit, minimum, limit, minimum
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Convert from io::Error to Error
///
/// 从 io::Error 转换到 Error
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

/// Convert from Error to io::Error for compatibility
///
/// 从 Error 转换到 io::Error 以保持兼容性
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(io_err) => io_err,
            Error::EmptyFile => io::Error::new(io::ErrorKind::UnexpectedEof, err.to_string()),
            Error::LockTimeout { .. } => io::Error::new(io::ErrorKind::TimedOut, err.to_string()),
            Error::InvalidSizeLimit { .. } => io::Error::new(io::ErrorKind::InvalidInput, err.to_string()),
        }
    }
}

/// Result type alias using our custom Error type
///
/// 使用自定义 Error 类型的 Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;
