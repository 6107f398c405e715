use std::collections::HashMap;
use std::env;
use std::io::{self, Write};
use std::path::Path;

use log::{debug, warn};
use nix::unistd::chdir;
use once_cell::sync::Lazy;

use crate::shell::history::History;
use crate::utils::path::find_executable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Exit,
    Echo,
    Type,
    Pwd,
    Cd,
    History,
}

/// 内建命令表：启动时构建一次，之后只读。
static REGISTRY: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    HashMap::from([
        ("exit", Builtin::Exit),
        ("echo", Builtin::Echo),
        ("type", Builtin::Type),
        ("pwd", Builtin::Pwd),
        ("cd", Builtin::Cd),
        ("history", Builtin::History),
    ])
});

pub fn lookup(name: &str) -> Option<Builtin> {
    REGISTRY.get(name).copied()
}

pub fn is_builtin(name: &str) -> bool {
    REGISTRY.contains_key(name)
}

/// 内建命令执行结果。`Exit` 要求结束当前进程（shell 本身或 fork 出的子进程）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue(i32),
    Exit(i32),
}

impl Flow {
    pub fn status(self) -> i32 {
        match self {
            Flow::Continue(status) | Flow::Exit(status) => status,
        }
    }
}

/// 内建命令看到的标准输出/错误，已按重定向或管道解析好。
pub struct BuiltinIo<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

impl Builtin {
    pub fn run(self, args: &[String], io: &mut BuiltinIo, history: &mut History) -> Flow {
        let operands = args.get(1..).unwrap_or_default();
        debug!("执行内建命令 {:?} {:?}", self, operands);
        let result = match self {
            Builtin::Exit => return builtin_exit(operands, io),
            Builtin::Echo => builtin_echo(operands, io),
            Builtin::Type => builtin_type(operands, io),
            Builtin::Pwd => builtin_pwd(io),
            Builtin::Cd => builtin_cd(operands, io),
            Builtin::History => builtin_history(operands, io, history),
        };
        let result = result.and_then(|status| io.out.flush().map(|()| status));
        match result {
            Ok(status) => {
                let _ = io.err.flush();
                Flow::Continue(status)
            }
            Err(e) => {
                // 多数是管道对端已关闭或磁盘写满
                warn!("内建命令 {:?} 写入失败: {}", self, e);
                let name = args.first().map(String::as_str).unwrap_or_default();
                let _ = writeln!(io.err, "{}: write error: {}", name, e);
                let _ = io.err.flush();
                Flow::Continue(1)
            }
        }
    }
}

fn builtin_exit(operands: &[String], io: &mut BuiltinIo) -> Flow {
    match operands.first() {
        None => Flow::Exit(0),
        Some(code) => match code.parse::<i32>() {
            Ok(code) => Flow::Exit(code),
            Err(_) => {
                let _ = writeln!(io.err, "exit: {}: numeric argument required", code);
                Flow::Exit(2)
            }
        },
    }
}

fn builtin_echo(operands: &[String], io: &mut BuiltinIo) -> io::Result<i32> {
    writeln!(io.out, "{}", operands.join(" "))?;
    Ok(0)
}

fn builtin_type(operands: &[String], io: &mut BuiltinIo) -> io::Result<i32> {
    if operands.is_empty() {
        writeln!(io.err, "type: missing argument")?;
        return Ok(1);
    }

    let mut status = 0;
    for name in operands {
        if is_builtin(name) {
            writeln!(io.out, "{} is a shell builtin", name)?;
        } else if let Some(path) = find_executable(name) {
            writeln!(io.out, "{} is {}", name, path.display())?;
        } else {
            writeln!(io.out, "{}: not found", name)?;
            status = 1;
        }
    }
    Ok(status)
}

fn builtin_pwd(io: &mut BuiltinIo) -> io::Result<i32> {
    match env::current_dir() {
        Ok(dir) => {
            writeln!(io.out, "{}", dir.display())?;
            Ok(0)
        }
        Err(e) => {
            writeln!(io.err, "pwd: {}", e)?;
            Ok(1)
        }
    }
}

fn builtin_cd(operands: &[String], io: &mut BuiltinIo) -> io::Result<i32> {
    let Some(dir) = operands.first() else {
        writeln!(io.err, "cd: missing argument")?;
        return Ok(1);
    };

    let target = shellexpand::tilde(dir);
    match chdir(Path::new(target.as_ref())) {
        Ok(()) => {
            debug!("工作目录切换到 {}", target);
            Ok(0)
        }
        Err(errno) => {
            writeln!(io.err, "cd: {}: {}", dir, errno.desc())?;
            Ok(1)
        }
    }
}

fn builtin_history(operands: &[String], io: &mut BuiltinIo, history: &mut History) -> io::Result<i32> {
    let flag = operands.first().map(String::as_str);
    match flag {
        Some(flag @ ("-r" | "-w" | "-a")) => {
            let Some(file) = operands.get(1) else {
                writeln!(io.err, "history: {}: missing filename", flag)?;
                return Ok(1);
            };
            let path = Path::new(file);
            let result = match flag {
                "-r" => history.read_from(path).map(|_| ()),
                "-w" => history.write_to(path),
                _ => history.append_to(path),
            };
            match result {
                Ok(()) => Ok(0),
                Err(e) => {
                    writeln!(io.err, "history: {}: {}", file, e)?;
                    Ok(1)
                }
            }
        }
        Some(count) => match count.parse::<usize>() {
            Ok(n) => print_history(history, Some(n), io),
            Err(_) => {
                writeln!(io.err, "history: {}: numeric argument required", count)?;
                Ok(1)
            }
        },
        None => print_history(history, None, io),
    }
}

fn print_history(history: &History, limit: Option<usize>, io: &mut BuiltinIo) -> io::Result<i32> {
    for (index, entry) in history.tail(limit) {
        writeln!(io.out, "{:>5}  {}", index, entry)?;
    }
    Ok(0)
}
