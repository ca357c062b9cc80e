//! Cross-process exclusive section
//!
//! 跨进程独占区
//!
//! A machine-wide mutual exclusion named by a lock file. The lock is an advisory
//! exclusive file lock (`flock` on Unix, `LockFileEx` on Windows) taken through
//! [`fs2::FileExt`], so the OS drops it if the holding process dies.
//!
//! 以锁文件命名的机器范围互斥。锁是通过 [`fs2::FileExt`] 获取的建议性独占文件锁
//! （Unix 上为 `flock`，Windows 上为 `LockFileEx`），因此持有进程退出时操作系统会释放它。

use super::config::LockWait;
use super::error::{Error, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

/// Longest pause between two lock attempts in bounded mode
///
/// 有限等待模式下两次加锁尝试之间的最长间隔
const MAX_BACKOFF: Duration = Duration::from_millis(20);

/// Open (creating if needed) a file that every local user may read and write
///
/// 打开（必要时创建）一个所有本地用户都可读写的文件
///
/// Missing parent directories are created. Widening the permissions of an
/// existing file owned by someone else fails silently.
///
/// 会创建缺失的父目录。对他人拥有的已有文件放宽权限时的失败会被忽略。
pub(crate) fn open_shared(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);

    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o666);
        let file = options.open(path)?;
        // The process umask usually strips group/other write bits
        if let Err(err) = file.set_permissions(fs::Permissions::from_mode(0o666)) {
            tracing::trace!(path = %path.display(), error = %err, "could not widen file permissions");
        }
        Ok(file)
    }

    #[cfg(not(unix))]
    {
        options.open(path)
    }
}

/// Named, machine-wide exclusive section
///
/// 命名的机器范围独占区
///
/// Threads sharing one `ExclusiveSection` serialize on an in-process mutex that
/// owns the lock file handle; processes (and separate `ExclusiveSection` values
/// for the same lock file) serialize on the file lock itself.
///
/// 共享同一个 `ExclusiveSection` 的线程在持有锁文件句柄的进程内互斥锁上串行；
/// 不同进程（以及同一锁文件的不同 `ExclusiveSection` 值）在文件锁本身上串行。
///
/// # Examples
///
/// ```
/// # use sentinel_log::{ExclusiveSection, LockWait, Result};
/// # use tempfile::tempdir;
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// let section = ExclusiveSection::open(dir.path().join("trace.log.lock"))?;
///
/// {
///     let _guard = section.acquire(LockWait::Unbounded)?;
///     // read-scan-write happens here
///     // 在这里执行读取-扫描-写入
/// } // released on drop, including early returns and panics
///   // 在 drop 时释放，包括提前返回和 panic
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ExclusiveSection {
    /// Lock file path, the machine-wide name of the section
    ///
    /// 锁文件路径，即独占区在机器范围内的名称
    path: PathBuf,

    /// Open lock file handle
    ///
    /// 打开的锁文件句柄
    handle: Mutex<File>,
}

impl ExclusiveSection {
    /// Open the section named by `path`, creating the lock file if needed
    ///
    /// 打开由 `path` 命名的独占区，必要时创建锁文件
    ///
    /// # Errors
    /// Returns corresponding I/O errors if the lock file cannot be created or opened
    ///
    /// # Errors
    /// 如果无法创建或打开锁文件，返回相应的 I/O 错误
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_shared(&path)?;
        Ok(Self {
            path,
            handle: Mutex::new(file),
        })
    }

    /// Lock file path
    ///
    /// 锁文件路径
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Enter the section
    ///
    /// 进入独占区
    ///
    /// With [`LockWait::Unbounded`] this blocks until the lock is free. With
    /// [`LockWait::Bounded`] the lock is polled with a growing backoff until the
    /// deadline, which also bounds the wait behind other threads sharing this
    /// section.
    ///
    /// 使用 [`LockWait::Unbounded`] 时阻塞直到锁可用。
    /// 使用 [`LockWait::Bounded`] 时以递增的退避间隔轮询，直到期限；
    /// 该期限同样约束等待共享此独占区的其他线程的时间。
    ///
    /// # Errors
    /// - Returns `LockTimeout` if a bounded wait expires
    /// - Returns corresponding I/O errors if locking fails
    ///
    /// # Errors
    /// - 有限等待超时返回 `LockTimeout` 错误
    /// - 加锁失败返回相应的 I/O 错误
    pub fn acquire(&self, wait: LockWait) -> Result<SectionGuard<'_>> {
        let timeout = match wait {
            LockWait::Unbounded => {
                // A panic while holding the guard still released the file lock in Drop
                let handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
                FileExt::lock_exclusive(&*handle)?;
                return Ok(SectionGuard { handle });
            }
            LockWait::Bounded(timeout) => timeout,
        };

        // One deadline covers both the in-process mutex and the file lock
        // 同一个期限同时覆盖进程内互斥锁和文件锁
        let mut backoff = Backoff::new(timeout);
        let handle = loop {
            match self.handle.try_lock() {
                Ok(handle) => break handle,
                Err(TryLockError::Poisoned(poisoned)) => break poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => backoff.pause()?,
            }
        };

        let contended = fs2::lock_contended_error().kind();
        loop {
            match FileExt::try_lock_exclusive(&*handle) {
                Ok(()) => return Ok(SectionGuard { handle }),
                Err(err) if err.kind() == contended => backoff.pause()?,
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Polling schedule for a bounded wait
///
/// 有限等待的轮询计划
struct Backoff {
    started: Instant,
    timeout: Duration,
    step: Duration,
}

impl Backoff {
    fn new(timeout: Duration) -> Self {
        Self {
            started: Instant::now(),
            timeout,
            step: Duration::from_millis(1),
        }
    }

    /// Sleep before the next attempt, or fail once the deadline has passed
    ///
    /// 在下一次尝试前休眠；期限已过则返回错误
    fn pause(&mut self) -> Result<()> {
        let waited = self.started.elapsed();
        if waited >= self.timeout {
            return Err(Error::LockTimeout { waited });
        }

        tracing::trace!(?waited, "exclusive section busy");
        thread::sleep(self.step.min(self.timeout - waited));
        self.step = (self.step * 2).min(MAX_BACKOFF);
        Ok(())
    }
}

/// Proof that the exclusive section is held; releases it on drop
///
/// 持有独占区的凭据；drop 时释放
#[must_use = "the section is released as soon as the guard is dropped"]
pub struct SectionGuard<'a> {
    handle: MutexGuard<'a, File>,
}

impl Drop for SectionGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&*self.handle) {
            tracing::debug!(error = %err, "failed to release exclusive section");
        }
    }
}

impl std::fmt::Debug for SectionGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionGuard").finish_non_exhaustive()
    }
}
