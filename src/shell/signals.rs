use log::warn;
use nix::sys::signal::{signal, SigHandler, Signal};

/// 交互模式下 shell 自身忽略的信号。
const SHELL_IGNORED: [Signal; 2] = [Signal::SIGINT, Signal::SIGQUIT];

/// 子进程需要恢复默认处理的信号。Rust 运行时启动时忽略了 SIGPIPE，
/// 而被忽略的信号会跨 exec 继承。
const CHILD_DEFAULTS: [Signal; 3] = [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGPIPE];

fn set_handler(signals: &[Signal], handler: SigHandler) {
    for &sig in signals {
        // SAFETY: 只设置 SIG_IGN/SIG_DFL，不安装自定义处理函数
        if let Err(e) = unsafe { signal(sig, handler) } {
            warn!("设置信号 {:?} 处理失败: {}", sig, e);
        }
    }
}

/// Ctrl-C / Ctrl-\ 只让前台子进程收到。
pub fn ignore_interactive_signals() {
    set_handler(&SHELL_IGNORED, SigHandler::SigIgn);
}

pub fn restore_default_signals() {
    set_handler(&CHILD_DEFAULTS, SigHandler::SigDfl);
}
