use log::{debug, error, trace};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;

use crate::shell::error::ShellError;

/// 把 `waitpid` 的结果换算成 shell 约定的退出码；被信号杀死时为 128+信号。
fn exit_code(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, sig, _core_dumped) => Some(128 + sig as i32),
        _ => None,
    }
}

fn wait_one(pid: Pid) -> Result<i32, ShellError> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => match exit_code(status) {
                Some(code) => {
                    debug!("子进程 {} 结束: {:?}", pid, status);
                    return Ok(code);
                }
                None => trace!("子进程 {} 状态变化: {:?}", pid, status),
            },
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ShellError::Wait(e)),
        }
    }
}

/// 等待所有阶段结束，返回最后一个阶段的退出码。
/// 即使某次等待出错也会继续回收剩下的子进程，避免留下僵尸进程。
pub fn wait_all(pids: &[Pid]) -> Result<i32, ShellError> {
    let mut last_status = 0;
    let mut first_error = None;
    for pid in pids {
        match wait_one(*pid) {
            Ok(code) => last_status = code,
            Err(e) => {
                error!("等待子进程 {} 失败: {}", pid, e);
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(last_status),
    }
}
