//! Process-wide sink
//!
//! 进程级日志汇
//!
//! Components that only want to leave a trace call [`log`] without holding a
//! [`TraceSink`]. The sink is installed once, at startup, and lives for the
//! rest of the process.
//!
//! 只想留下诊断记录的组件直接调用 [`log`]，无需持有 [`TraceSink`]。
//! 日志汇在启动时安装一次，并在进程剩余生命周期内存在。

use super::config::SinkConfig;
use super::error::Result;
use super::trace_sink::TraceSink;
use std::sync::OnceLock;

static SINK: OnceLock<TraceSink> = OnceLock::new();

/// Install the process-wide sink
///
/// 安装进程级日志汇
///
/// Only the first successful call installs a sink; later calls return the one
/// already installed and ignore their configuration.
///
/// 只有第一次成功的调用会安装日志汇；之后的调用返回已安装的实例并忽略其配置。
///
/// # Errors
/// Returns the same errors as [`TraceSink::new`]
///
/// # Errors
/// 返回与 [`TraceSink::new`] 相同的错误
pub fn install(config: SinkConfig) -> Result<&'static TraceSink> {
    if let Some(sink) = SINK.get() {
        tracing::debug!(path = %sink.config().path.display(), "trace sink already installed");
        return Ok(sink);
    }

    let sink = TraceSink::new(config)?;
    Ok(SINK.get_or_init(|| sink))
}

/// The process-wide sink, if installed
///
/// 进程级日志汇（如已安装）
#[inline]
pub fn installed() -> Option<&'static TraceSink> {
    SINK.get()
}

/// Log through the process-wide sink; does nothing before [`install`]
///
/// 通过进程级日志汇写入；在 [`install`] 之前不做任何事
///
/// # Examples
///
/// ```
/// # use sentinel_log::{SinkConfig, Result};
/// # use tempfile::tempdir;
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// sentinel_log::log("dropped: nothing installed yet");
///
/// sentinel_log::install(SinkConfig::new(dir.path().join("trace.log")))?;
/// sentinel_log::log("element cache refreshed");
/// # Ok(())
/// # }
/// ```
#[inline]
pub fn log(message: &str) {
    if let Some(sink) = SINK.get() {
        sink.log(message);
    }
}
