//! Independent processes writing to one log file
//!
//! 多个独立进程写入同一个日志文件
//!
//! The test binary re-executes itself: `child_writer` only writes when the
//! environment names a log file, so it is a no-op in a normal run.
//!
//! 测试二进制会重新执行自身：`child_writer` 仅在环境变量指定了日志文件时写入，
//! 因此在普通运行中不做任何事。

use sentinel_log::{locate_sentinel, SinkConfig, TraceSink, SENTINEL};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

const CHILD_PATH_VAR: &str = "SENTINEL_LOG_CHILD_PATH";
const CHILD_ID_VAR: &str = "SENTINEL_LOG_CHILD_ID";
const CHILD_LIMIT_VAR: &str = "SENTINEL_LOG_CHILD_LIMIT";

const CHILDREN: usize = 4;
const MESSAGES_PER_CHILD: usize = 40;

#[test]
fn child_writer() {
    let (Ok(path), Ok(id), Ok(limit)) = (
        env::var(CHILD_PATH_VAR),
        env::var(CHILD_ID_VAR),
        env::var(CHILD_LIMIT_VAR),
    ) else {
        return;
    };

    let config = SinkConfig::new(&path).with_size_limit(limit.parse().unwrap());
    let sink = TraceSink::new(config).unwrap();
    for i in 0..MESSAGES_PER_CHILD {
        sink.try_log(&format!("process {} message {}", id, i)).unwrap();
    }
}

/// Run `CHILDREN` copies of `child_writer` against `path` and wait for all of them
fn run_children(path: &Path, size_limit: u64) {
    let exe = env::current_exe().unwrap();
    let children: Vec<_> = (0..CHILDREN)
        .map(|id| {
            Command::new(&exe)
                .args(["child_writer", "--exact", "--test-threads=1"])
                .env(CHILD_PATH_VAR, path)
                .env(CHILD_ID_VAR, id.to_string())
                .env(CHILD_LIMIT_VAR, size_limit.to_string())
                .spawn()
                .unwrap()
        })
        .collect();

    for mut child in children {
        assert!(child.wait().unwrap().success());
    }
}

#[test]
fn processes_write_whole_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shared.log");

    run_children(&path, sentinel_log::DEFAULT_SIZE_LIMIT);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), CHILDREN * MESSAGES_PER_CHILD + 1);
    assert_eq!(lines.last(), Some(&SENTINEL));

    let messages: HashSet<&str> = lines[..lines.len() - 1]
        .iter()
        .map(|line| line.split_once('|').unwrap().1)
        .collect();
    assert_eq!(messages.len(), CHILDREN * MESSAGES_PER_CHILD);

    // Per-process order is preserved inside the total order
    // 每个进程内部的顺序在全序中得以保留
    for id in 0..CHILDREN {
        let prefix = format!("process {} message ", id);
        let seen: Vec<usize> = lines
            .iter()
            .filter_map(|line| line.split_once('|'))
            .filter_map(|(_, message)| message.strip_prefix(prefix.as_str()))
            .map(|n| n.parse().unwrap())
            .collect();
        assert_eq!(seen, (0..MESSAGES_PER_CHILD).collect::<Vec<_>>());
    }
}

#[test]
fn processes_wrap_within_limit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shared_small.log");
    let size_limit = 1500;

    run_children(&path, size_limit);

    let content = std::fs::read(&path).unwrap();
    assert!(content.len() as u64 <= size_limit);

    let sentinels = content
        .split(|&b| b == b'\n')
        .filter(|line| *line == SENTINEL.as_bytes())
        .count();
    assert_eq!(sentinels, 1);

    // A new process recovers the cursor from the file alone
    // 新进程仅凭文件就能恢复游标
    let sink = TraceSink::new(SinkConfig::new(&path).with_size_limit(size_limit)).unwrap();
    assert_eq!(sink.locate().unwrap(), locate_sentinel(&content, None));
    assert!(sink.locate().unwrap().is_some());
}
