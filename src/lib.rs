//! Size-bounded diagnostic log file shared by many processes
//!
//! 多进程共享的限长诊断日志文件
//!
//! This library appends human-readable trace lines to a single file whose size
//! never exceeds a fixed limit. The file is never rotated, truncated or deleted:
//! when it is full, writing wraps around to offset 0 and overwrites the oldest
//! bytes. The next write position is never kept in memory as a source of truth;
//! it is recovered from a sentinel line stored in the file itself.
//!
//! 本库向单个文件追加人类可读的诊断行，文件大小永远不会超过固定上限。
//! 文件从不轮转、截断或删除：写满后回绕到偏移 0 并覆盖最旧的字节。
//! 下一个写入位置从不以内存状态为准，而是从文件内的哨兵行中恢复。
//!
//! # Features
//!
//! - **Bounded size**: one file, fixed ceiling, forever
//! - **Cross-process**: writers in different processes serialize on a named file lock
//! - **Restart-safe**: the cursor lives in the file; the in-process hint is only a shortcut
//! - **Self-healing**: a stale hint or a missing sentinel falls back to a full scan or re-initialization
//! - **Never fails the caller**: errors are dropped and reported through `tracing` at debug level
//!
//! # 特性
//!
//! - **大小有界**：一个文件，固定上限，永久使用
//! - **跨进程**：不同进程的写入者在命名文件锁上串行
//! - **重启安全**：游标保存在文件中；进程内提示只是捷径
//! - **自愈**：过期的提示或丢失的哨兵会退回到全量扫描或重新初始化
//! - **不影响调用方**：错误被丢弃，并通过 debug 级别的 `tracing` 报告
//!
//! # Quick Start
//!
//! ```
//! use sentinel_log::{SinkConfig, TraceSink, Result};
//! # use tempfile::tempdir;
//! # fn main() -> Result<()> {
//! # let dir = tempdir()?;
//! # let path = dir.path().join("trace.log");
//!
//! let sink = TraceSink::new(SinkConfig::new(&path).with_size_limit(1024))?;
//!
//! for i in 0..100 {
//!     sink.log(&format!("request {i} served"));
//! }
//!
//! // The file wrapped several times but never outgrew its limit
//! // 文件已多次回绕，但从未超过上限
//! assert!(std::fs::metadata(&path)?.len() <= 1024);
//! assert!(sink.locate()?.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # File Layout
//!
//! # 文件布局
//!
//! ```text
//! <timestamp>|<message>\n
//! <timestamp>|<message>\n
//! **********\n
//! <stale bytes from the previous cycle>
//! ```
//!
//! # Main Types
//!
//! - [`TraceSink`]: Writer context owning the lock handle and cursor hint
//! - [`SinkConfig`]: Path, size limit, lock location and wait policy
//! - [`ExclusiveSection`]: Named machine-wide lock
//! - [`locate_sentinel`]: Cursor recovery from raw file bytes
//! - [`sanitize`]: Size bounding of caller messages
//!
//! # 主要类型
//!
//! - [`TraceSink`]：持有锁句柄和游标提示的写入上下文
//! - [`SinkConfig`]：路径、大小上限、锁位置和等待策略
//! - [`ExclusiveSection`]：命名的机器范围锁
//! - [`locate_sentinel`]：从原始文件字节恢复游标
//! - [`sanitize`]：调用方消息的大小约束

mod sink;

pub use sink::{
    encoded_len, format_entry, install, installed, locate_sentinel, log, sanitize, Error,
    ExclusiveSection, LockWait, Result, SectionGuard, SinkConfig, TraceSink, WriteOutcome,
    DEFAULT_SIZE_LIMIT, ENTRY_OVERHEAD, LINE_TERMINATOR, MIN_SIZE_LIMIT, OVERSIZE_PREVIEW_CHARS,
    OVERSIZE_WARNING, SENTINEL, SENTINEL_LINE, TIMESTAMP_FORMAT,
};
