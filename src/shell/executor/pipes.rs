use std::os::fd::{AsRawFd, OwnedFd};

use libc::{STDIN_FILENO, STDOUT_FILENO};
use log::trace;
use nix::unistd::{dup2, pipe};

use crate::shell::error::ShellError;

/// 一条匿名管道。两端都是 `OwnedFd`，drop 时自动关闭。
struct Pipe {
    read: OwnedFd,
    write: OwnedFd,
}

/// N 个阶段之间的 N-1 条管道。
///
/// 父进程在 fork 完所有阶段后 drop 它；每个子进程通过 [`PipeSet::connect_stage`]
/// 取得所有权，接好自己的两端后关闭全部描述符。
#[derive(Default)]
pub struct PipeSet {
    pipes: Vec<Pipe>,
}

impl PipeSet {
    /// 中途失败时已创建的管道随 `pipes` 一起被关闭。
    pub fn new(count: usize) -> Result<Self, ShellError> {
        let mut pipes = Vec::with_capacity(count);
        for _ in 0..count {
            let (read, write) = pipe().map_err(ShellError::Pipe)?;
            trace!("创建管道 r={} w={}", read.as_raw_fd(), write.as_raw_fd());
            pipes.push(Pipe { read, write });
        }
        Ok(Self { pipes })
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    /// 子进程中调用：第 `index` 个阶段从管道 `index-1` 读，向管道 `index` 写。
    /// 返回时 `self` 被消费，所有管道描述符都已关闭，只剩 dup 出来的 0/1。
    pub fn connect_stage(self, index: usize, stages: usize) -> nix::Result<()> {
        if index > 0 {
            if let Some(upstream) = self.pipes.get(index - 1) {
                dup2(upstream.read.as_raw_fd(), STDIN_FILENO)?;
            }
        }
        if index + 1 < stages {
            if let Some(downstream) = self.pipes.get(index) {
                dup2(downstream.write.as_raw_fd(), STDOUT_FILENO)?;
            }
        }
        Ok(())
    }
}
