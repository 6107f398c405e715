use std::io;

use libc::STDIN_FILENO;
use nix::errno::Errno;
use nix::unistd::read;

use crate::utils::config::Config;
use log::{debug, warn};
pub use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::Editor;
use rustyline::{CompletionType, Config as RLConfig};

enum LineSource {
    Editor(Box<Editor<(), FileHistory>>),
    /// stdin 不是终端时逐行读取，不显示提示符
    Piped,
}

pub struct ReadlineManager {
    source: LineSource,
}

impl ReadlineManager {
    pub fn new(config: &Config, interactive: bool) -> Result<Self, ReadlineError> {
        if !interactive {
            debug!("非交互模式，从 stdin 逐行读取");
            return Ok(Self {
                source: LineSource::Piped,
            });
        }

        let rl_config = RLConfig::builder()
            .history_ignore_space(true)
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .edit_mode(config.get_edit_mode())
            .build();
        let editor = Editor::with_config(rl_config)?;
        Ok(Self {
            source: LineSource::Editor(Box::new(editor)),
        })
    }

    pub fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        match &mut self.source {
            LineSource::Editor(editor) => editor.readline(prompt),
            LineSource::Piped => match read_raw_line()? {
                Some(line) => Ok(line),
                None => Err(ReadlineError::Eof),
            },
        }
    }

    /// 供上下键回溯；历史的权威副本在 `History` 中。
    pub fn add_history(&mut self, line: &str) {
        if let LineSource::Editor(editor) = &mut self.source {
            if let Err(err) = editor.add_history_entry(line) {
                warn!("添加编辑器历史失败: {}", err);
            }
        }
    }

    pub fn seed_history(&mut self, entries: &[String]) {
        for entry in entries {
            self.add_history(entry);
        }
    }
}

/// 不经缓冲逐字节读到换行：第一个阶段继承同一个 stdin，
/// 多读的数据会被子进程错过。
fn read_raw_line() -> Result<Option<String>, ReadlineError> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    let newline = loop {
        match read(STDIN_FILENO, &mut byte) {
            Ok(0) => break false,
            Ok(_) if byte[0] == b'\n' => break true,
            Ok(_) => bytes.push(byte[0]),
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(ReadlineError::Io(io::Error::from(errno))),
        }
    };
    if !newline && bytes.is_empty() {
        return Ok(None);
    }
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}
