use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    Truncate,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub stream: Stream,
    pub mode: RedirectMode,
    pub target: PathBuf,
}

impl Redirection {
    /// 识别重定向运算符，例如 `2>>` -> (Stderr, Append)。
    pub fn operator(text: &str) -> Option<(Stream, RedirectMode)> {
        match text {
            ">" | "1>" => Some((Stream::Stdout, RedirectMode::Truncate)),
            ">>" | "1>>" => Some((Stream::Stdout, RedirectMode::Append)),
            "2>" => Some((Stream::Stderr, RedirectMode::Truncate)),
            "2>>" => Some((Stream::Stderr, RedirectMode::Append)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    /// argv，`arguments[0]` 就是命令名
    pub arguments: Vec<String>,
    pub stdout: Option<Redirection>,
    pub stderr: Option<Redirection>,
}

impl Command {
    /// 同一流上后出现的重定向覆盖之前的。
    pub fn set_redirection(&mut self, redirection: Redirection) {
        match redirection.stream {
            Stream::Stdout => self.stdout = Some(redirection),
            Stream::Stderr => self.stderr = Some(redirection),
        }
    }

    pub fn redirection(&self, stream: Stream) -> Option<&Redirection> {
        match stream {
            Stream::Stdout => self.stdout.as_ref(),
            Stream::Stderr => self.stderr.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
}

impl Pipeline {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}
