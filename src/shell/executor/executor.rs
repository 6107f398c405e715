use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use libc::{STDERR_FILENO, STDOUT_FILENO};
use log::{debug, error, info};
use nix::errno::Errno;
use nix::unistd::{dup2, execv, fork, ForkResult};

use super::pipes::PipeSet;
use super::wait::wait_all;
use crate::shell::builtins::{self, Builtin, BuiltinIo, Flow};
use crate::shell::error::ShellError;
use crate::shell::history::History;
use crate::shell::parser::{Command, Pipeline, RedirectMode, Redirection, Stream};
use crate::shell::signals;
use crate::utils::path::{find_executable, is_executable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecOutcome {
    pub status: i32,
    /// shell 进程内执行了 `exit`
    pub exit_requested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Program {
    Builtin(Builtin),
    External(PathBuf),
}

struct Stage<'a> {
    command: &'a Command,
    program: Program,
}

pub struct Executor;

impl Executor {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(
        &mut self,
        pipeline: &Pipeline,
        history: &mut History,
    ) -> Result<ExecOutcome, ShellError> {
        if pipeline.is_empty() {
            return Ok(ExecOutcome::default());
        }
        debug!("执行 {} 个命令", pipeline.len());

        // 任何一个命令找不到就整体放弃，不启动任何阶段
        let stages = pipeline
            .commands
            .iter()
            .map(|command| -> Result<Stage, ShellError> {
                Ok(Stage {
                    command,
                    program: resolve(&command.name)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let [Stage {
            command,
            program: Program::Builtin(builtin),
        }] = stages.as_slice()
        {
            return self.run_builtin_in_shell(*builtin, command, history);
        }

        self.run_pipeline(&stages, history)
    }

    /// 单独的内建命令在 shell 进程中执行，`cd`/`exit` 才能作用于会话本身。
    fn run_builtin_in_shell(
        &mut self,
        builtin: Builtin,
        command: &Command,
        history: &mut History,
    ) -> Result<ExecOutcome, ShellError> {
        debug!("在 shell 进程内执行: {:?}", command.arguments);
        let mut out: Box<dyn Write> = match &command.stdout {
            Some(redirection) => Box::new(open_redirection(redirection)?),
            None => Box::new(io::stdout()),
        };
        let mut err: Box<dyn Write> = match &command.stderr {
            Some(redirection) => Box::new(open_redirection(redirection)?),
            None => Box::new(io::stderr()),
        };

        let mut io = BuiltinIo {
            out: &mut out,
            err: &mut err,
        };
        let flow = builtin.run(&command.arguments, &mut io, history);
        Ok(ExecOutcome {
            status: flow.status(),
            exit_requested: matches!(flow, Flow::Exit(_)),
        })
    }

    fn run_pipeline(
        &mut self,
        stages: &[Stage],
        history: &mut History,
    ) -> Result<ExecOutcome, ShellError> {
        let count = stages.len();
        let mut pipes = PipeSet::new(count - 1)?;
        info!("启动 {} 个阶段, {} 条管道", count, pipes.len());

        // 避免子进程继承未刷新的缓冲区
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();

        let mut pids = Vec::with_capacity(count);
        for (index, stage) in stages.iter().enumerate() {
            // SAFETY: shell 是单线程的，子进程只做 dup2/open/exec 或运行内建命令后 _exit。
            match unsafe { fork() } {
                Ok(ForkResult::Child) => {
                    run_stage(stage, index, count, std::mem::take(&mut pipes), history)
                }
                Ok(ForkResult::Parent { child }) => {
                    debug!("阶段 {} ({}) pid={}", index, stage.command.name, child);
                    pids.push(child);
                }
                Err(e) => {
                    error!("fork 第 {} 个阶段失败: {}", index, e);
                    // 先关闭管道，已启动的阶段才能读到 EOF 并退出
                    drop(pipes);
                    let _ = wait_all(&pids);
                    return Err(ShellError::Fork(e));
                }
            }
        }

        // 父进程不读写管道内部
        drop(pipes);
        let status = wait_all(&pids)?;
        debug!("流水线结束, 状态 {}", status);
        Ok(ExecOutcome {
            status,
            exit_requested: false,
        })
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(name: &str) -> Result<Program, ShellError> {
    if let Some(builtin) = builtins::lookup(name) {
        return Ok(Program::Builtin(builtin));
    }
    let path = if name.contains('/') {
        Some(PathBuf::from(name)).filter(|path| is_executable(path))
    } else {
        find_executable(name)
    };
    match path {
        Some(path) => Ok(Program::External(path)),
        None => Err(ShellError::CommandNotFound(name.to_string())),
    }
}

fn open_redirection(redirection: &Redirection) -> Result<File, ShellError> {
    let mut options = OpenOptions::new();
    options.create(true);
    match redirection.mode {
        RedirectMode::Truncate => options.write(true).truncate(true),
        RedirectMode::Append => options.append(true),
    };
    options
        .open(&redirection.target)
        .map_err(|e| ShellError::Redirect(redirection.target.clone(), e))
}

fn redirect_fd(redirection: &Redirection, fd: i32) -> Result<(), ShellError> {
    let file = open_redirection(redirection)?;
    dup2(file.as_raw_fd(), fd)
        .map_err(|e| ShellError::Redirect(redirection.target.clone(), e.into()))?;
    Ok(())
}

/// stdout 重定向只在最后一个阶段生效（其余阶段的 stdout 接在管道上）；
/// stderr 重定向只在首尾阶段生效。
fn redirect_stage(command: &Command, index: usize, count: usize) -> Result<(), ShellError> {
    let first = index == 0;
    let last = index + 1 == count;

    for (stream, fd, applies) in [
        (Stream::Stdout, STDOUT_FILENO, last),
        (Stream::Stderr, STDERR_FILENO, first || last),
    ] {
        match command.redirection(stream) {
            Some(redirection) if applies => redirect_fd(redirection, fd)?,
            Some(_) => debug!("忽略阶段 {} 的 {:?} 重定向", index, stream),
            None => {}
        }
    }
    Ok(())
}

/// 子进程入口，永不返回。
fn run_stage(
    stage: &Stage,
    index: usize,
    count: usize,
    pipes: PipeSet,
    history: &mut History,
) -> ! {
    signals::restore_default_signals();

    if let Err(e) = pipes.connect_stage(index, count) {
        eprintln!("zest: {}", e.desc());
        exit_child(1);
    }
    if let Err(e) = redirect_stage(stage.command, index, count) {
        eprintln!("{}", e);
        exit_child(1);
    }

    match &stage.program {
        Program::Builtin(builtin) => {
            let mut out = io::stdout();
            let mut err = io::stderr();
            let mut io = BuiltinIo {
                out: &mut out,
                err: &mut err,
            };
            // 子进程中的 exit 只结束这个阶段
            let flow = builtin.run(&stage.command.arguments, &mut io, history);
            exit_child(flow.status())
        }
        Program::External(path) => {
            let errno = exec(path, &stage.command.arguments);
            eprintln!("{}: {}", stage.command.name, errno.desc());
            exit_child(126)
        }
    }
}

fn exec(path: &Path, args: &[String]) -> Errno {
    let Ok(program) = CString::new(path.as_os_str().as_bytes()) else {
        return Errno::EINVAL;
    };
    let argv = match args
        .iter()
        .map(|arg| CString::new(arg.as_bytes()))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(argv) => argv,
        Err(_) => return Errno::EINVAL,
    };
    match execv(&program, &argv) {
        Ok(never) => match never {},
        Err(errno) => errno,
    }
}

fn exit_child(status: i32) -> ! {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    // 不运行父进程注册的 atexit 处理函数
    unsafe { libc::_exit(status) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_builtins() {
        assert_eq!(resolve("echo").ok(), Some(Program::Builtin(Builtin::Echo)));
        assert_eq!(resolve("type").ok(), Some(Program::Builtin(Builtin::Type)));
    }

    #[test]
    fn test_resolve_unknown_command() {
        match resolve("doesnotexist123") {
            Err(ShellError::CommandNotFound(name)) => assert_eq!(name, "doesnotexist123"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(resolve("./definitely/not/here").is_err());
    }

    #[test]
    fn test_resolve_direct_path() {
        if is_executable(Path::new("/bin/sh")) {
            assert_eq!(
                resolve("/bin/sh").ok(),
                Some(Program::External(PathBuf::from("/bin/sh")))
            );
        }
    }

    #[test]
    fn test_empty_pipeline_is_noop() {
        let mut executor = Executor::new();
        let outcome = executor.execute(&Pipeline::default(), &mut History::new());
        assert_eq!(outcome.ok(), Some(ExecOutcome::default()));
    }

    #[test]
    fn test_not_found_aborts_before_start() {
        let mut executor = Executor::new();
        let pipeline = crate::shell::parser::Parser::new("echo hi | doesnotexist123")
            .parse_pipeline()
            .unwrap_or_default();
        match executor.execute(&pipeline, &mut History::new()) {
            Err(e) => {
                assert_eq!(e.to_string(), "doesnotexist123: command not found");
                assert_eq!(e.status(), 127);
            }
            Ok(outcome) => panic!("unexpected {:?}", outcome),
        }
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirected_builtin_in_shell() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("out.txt");
        let command = Command {
            name: "echo".to_string(),
            arguments: vec!["echo".to_string(), "hi".to_string()],
            stdout: Some(Redirection {
                stream: Stream::Stdout,
                mode: RedirectMode::Append,
                target: target.clone(),
            }),
            stderr: None,
        };
        let pipeline = Pipeline {
            commands: vec![command],
        };
        let mut executor = Executor::new();
        let mut history = History::new();
        executor.execute(&pipeline, &mut history).unwrap();
        executor.execute(&pipeline, &mut history).unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "hi\nhi\n");
    }

    #[test]
    fn test_redirect_into_missing_dir_fails() {
        let redirection = Redirection {
            stream: Stream::Stdout,
            mode: RedirectMode::Truncate,
            target: PathBuf::from("/nonexistent/zest/out.txt"),
        };
        match open_redirection(&redirection) {
            Err(e) => assert_eq!(e.to_string(), "/nonexistent/zest/out.txt: cannot create file"),
            Ok(_) => panic!("expected failure"),
        }
    }
}
