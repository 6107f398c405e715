use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// `Display` 即用户看到的单行诊断信息。
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{0}: command not found")]
    CommandNotFound(String),

    #[error("{}: cannot create file", .0.display())]
    Redirect(PathBuf, #[source] io::Error),

    #[error("zest: pipe: {0}")]
    Pipe(#[source] nix::Error),

    #[error("zest: fork: {0}")]
    Fork(#[source] nix::Error),

    #[error("zest: wait: {0}")]
    Wait(#[source] nix::Error),
}

impl ShellError {
    /// 该错误对应的命令退出码。
    pub fn status(&self) -> i32 {
        match self {
            ShellError::CommandNotFound(_) => 127,
            _ => 1,
        }
    }
}
