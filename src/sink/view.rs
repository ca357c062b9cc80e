//! Read-only memory-mapped view of the log file
//!
//! 日志文件的只读内存映射视图

use super::cursor::locate_sentinel;
use super::error::{Error, Result};
use memmap2::Mmap;
use std::fs::File;

/// Read-only snapshot of the log file contents, used for the cursor scan
///
/// 日志文件内容的只读快照，用于游标扫描
///
/// Mapping avoids copying up to the whole size limit into memory on every
/// write: the common case only touches the bytes between the hint and the
/// sentinel.
///
/// 映射避免了每次写入都把整个文件拷贝到内存：常见情况下只会访问提示与哨兵之间的字节。
///
/// # Safety Notes
///
/// The map must only be created while the [`ExclusiveSection`](super::ExclusiveSection)
/// is held, and dropped before the file is written. Every cooperating writer
/// goes through the section, so the mapped bytes do not change underneath the
/// scan.
///
/// A process that bypasses the section and truncates the file while it is
/// mapped makes reads past the new end raise `SIGBUS` on Unix, which no error
/// path here can catch.
///
/// # 安全性说明
///
/// 只能在持有 [`ExclusiveSection`](super::ExclusiveSection) 时创建映射，
/// 并在写入文件前释放。所有协作的写入者都经过独占区，因此扫描期间映射的字节不会变化。
///
/// 若有进程绕过独占区并在映射期间截断文件，在 Unix 上读取新末尾之后的字节会触发 `SIGBUS`，
/// 此处的任何错误路径都无法捕获。
pub(crate) struct LogView {
    /// Memory mapping of the whole file
    ///
    /// 整个文件的内存映射
    mmap: Mmap,
}

impl LogView {
    /// Map `file` for reading
    ///
    /// 以只读方式映射 `file`
    ///
    /// # Errors
    /// - Returns `EmptyFile` if the file has no bytes yet (nothing to map)
    /// - Returns corresponding I/O errors if metadata or mapping fails
    ///
    /// # Errors
    /// - 如果文件尚无内容（无可映射），返回 `EmptyFile` 错误
    /// - 如果获取元数据或映射失败，返回相应的 I/O 错误
    pub(crate) fn map(file: &File) -> Result<Self> {
        if file.metadata()?.len() == 0 {
            return Err(Error::EmptyFile);
        }

        // Safety: callers hold the exclusive section; only a writer that ignores
        // it and truncates the file can invalidate the map, see the type docs
        // Safety: 调用者持有独占区；只有绕过独占区并截断文件的写入者才会使映射失效，见类型文档
        let mmap = unsafe { Mmap::map(file)? };

        Ok(Self { mmap })
    }

    /// Locate the sentinel in the mapped bytes
    ///
    /// 在映射的字节中定位哨兵
    #[inline]
    pub(crate) fn locate(&self, hint: Option<u64>) -> Option<u64> {
        locate_sentinel(&self.mmap, hint)
    }

    /// Mapped length in bytes
    ///
    /// 映射长度（字节）
    #[inline]
    pub(crate) fn len(&self) -> u64 {
        self.mmap.len() as u64
    }
}

/// Map `file` and locate its sentinel; an empty file has none
///
/// 映射 `file` 并定位哨兵；空文件没有哨兵
pub(crate) fn locate_in_file(file: &File, hint: Option<u64>) -> Result<Option<u64>> {
    match LogView::map(file) {
        Ok(view) => {
            let found = view.locate(hint);
            if found.is_none() {
                tracing::debug!(len = view.len(), "no sentinel found, log will be re-initialized at offset 0");
            }
            Ok(found)
        }
        Err(Error::EmptyFile) => Ok(None),
        Err(err) => Err(err),
    }
}
