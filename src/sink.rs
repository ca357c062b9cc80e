//! Size-bounded shared log file with a self-describing write cursor
//!
//! 带有自描述写入游标的限长共享日志文件
//!
//! The log file is a single-slot circular buffer. Every entry is followed by a
//! sentinel line that marks where the next entry starts:
//!
//! 日志文件是一个单槽环形缓冲区。每个条目之后紧跟一行哨兵，标记下一个条目的起始位置：
//!
//! ```text
//! 2024-05-01 12:00:00.000|first message
//! 2024-05-01 12:00:00.250|second message
//! **********
//! ```
//!
//! Nothing about the cursor is stored outside the file. Each write:
//! 1. Sanitizes the message ([`sanitize`])
//! 2. Acquires the machine-wide [`ExclusiveSection`]
//! 3. Maps the file and locates the sentinel ([`locate_sentinel`]), using the
//!    process-local hint only as a starting point
//! 4. Writes the entry and a fresh sentinel, wrapping to offset 0 when the file
//!    would grow past its size limit
//! 5. Releases the section
//!
//! 游标信息不会保存在文件之外。每次写入：
//! 1. 清理消息（[`sanitize`]）
//! 2. 获取机器范围的 [`ExclusiveSection`]
//! 3. 映射文件并定位哨兵（[`locate_sentinel`]），进程内提示仅作为起点
//! 4. 写入条目和新的哨兵，文件将超出大小上限时回绕到偏移 0
//! 5. 释放独占区
//!
//! # Usage
//!
//! # 用法
//!
//! ```
//! # use sentinel_log::{SinkConfig, TraceSink, Result};
//! # use tempfile::tempdir;
//! # fn main() -> Result<()> {
//! # let dir = tempdir()?;
//! # let path = dir.path().join("trace.log");
//! let sink = TraceSink::new(SinkConfig::new(&path).with_size_limit(4096))?;
//!
//! // Never fails, never blocks the caller on I/O errors
//! // 永不失败，I/O 错误不会影响调用方
//! sink.log("connection established");
//! sink.log("view refreshed");
//!
//! assert!(std::fs::metadata(&path)?.len() <= 4096);
//! # Ok(())
//! # }
//! ```

mod config;
mod cursor;
mod error;
mod global;
mod measure;
mod sanitize;
mod section;
mod trace_sink;
mod view;
mod writer;


/// Sentinel literal marking the next write position
///
/// 标记下一个写入位置的哨兵字面量
pub const SENTINEL: &str = "**********";

/// Line terminator used for entries and the sentinel
///
/// 条目和哨兵使用的行终止符
pub const LINE_TERMINATOR: &str = "\n";

/// Sentinel literal followed by the line terminator
///
/// 哨兵字面量加行终止符
pub const SENTINEL_LINE: &str = "**********\n";

// Re-export public API
// 重新导出公共 API
pub use config::{LockWait, SinkConfig, DEFAULT_SIZE_LIMIT, MIN_SIZE_LIMIT};
pub use cursor::locate_sentinel;
pub use error::{Error, Result};
pub use global::{install, installed, log};
pub use measure::encoded_len;
pub use sanitize::{sanitize, OVERSIZE_PREVIEW_CHARS, OVERSIZE_WARNING};
pub use section::{ExclusiveSection, SectionGuard};
pub use trace_sink::TraceSink;
pub use writer::{format_entry, WriteOutcome, ENTRY_OVERHEAD, TIMESTAMP_FORMAT};
