use log::{debug, error, info, warn};
use std::error::Error;
use std::io::{self, IsTerminal, Write};

use crate::shell::executor::Executor;
use crate::shell::history::History;
use crate::shell::parser::Parser;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::signals;
use crate::utils::config::Config;
use crate::utils::theme::Theme;

/// 一行输入的处理结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineOutcome {
    /// 是否真正启动了流水线（空行、语法错误时为 false）
    pub executed: bool,
    pub status: i32,
    pub exit_requested: bool,
}

pub struct Shell<'a> {
    config: &'a Config,
    theme: &'a Theme,
    readline: ReadlineManager,
    executor: Executor,
    history: History,
    interactive: bool,
    last_status: i32,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config, theme: &'a Theme) -> Result<Self, ReadlineError> {
        let interactive = io::stdin().is_terminal();
        Ok(Self {
            config,
            theme,
            readline: ReadlineManager::new(config, interactive)?,
            executor: Executor::new(),
            history: History::new(),
            interactive,
            last_status: 0,
        })
    }

    /// 运行读取-执行循环，返回 shell 的退出码。
    pub fn run(&mut self) -> Result<i32, Box<dyn Error>> {
        debug!("初始化 zest, 交互模式: {}", self.interactive);
        if self.interactive {
            signals::ignore_interactive_signals();
        }
        self.load_history();

        if self.interactive {
            println!("{}", self.theme.welcome_message);
        }
        info!("zest 准备就绪");

        let status = self.run_loop()?;
        self.save_history();

        if self.interactive {
            println!("{}", self.theme.exit_message);
        }
        debug!("退出 zest, 状态 {}", status);
        Ok(status)
    }

    fn run_loop(&mut self) -> Result<i32, Box<dyn Error>> {
        loop {
            io::stdout().flush()?;
            let prompt = if self.interactive {
                self.theme.prompt(self.last_status)
            } else {
                String::new()
            };

            match self.readline.readline(&prompt) {
                Ok(line) => {
                    let outcome = self.submit_line(&line);
                    debug!(
                        "命令结束: executed={} status={}",
                        outcome.executed, outcome.status
                    );
                    if outcome.exit_requested {
                        return Ok(outcome.status);
                    }
                }
                Err(ReadlineError::Eof) => {
                    debug!("接收到 EOF");
                    return Ok(self.last_status);
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("接收到中断信号");
                    self.last_status = 130;
                }
                Err(err) => {
                    error!("读取输入失败: {}", err);
                    eprintln!("zest: {}", err);
                    return Ok(1);
                }
            }
        }
    }

    /// 处理一行输入：记录历史、词法/语法分析、执行。
    pub fn submit_line(&mut self, line: &str) -> LineOutcome {
        if line.trim().is_empty() {
            return LineOutcome {
                status: self.last_status,
                ..LineOutcome::default()
            };
        }

        self.history.push(line);
        self.readline.add_history(line);
        debug!("执行命令: {}", line);

        let pipeline = match Parser::new(line).parse_pipeline() {
            Ok(pipeline) => pipeline,
            Err(e) => {
                eprintln!("{}", e);
                self.last_status = 2;
                return LineOutcome {
                    status: 2,
                    ..LineOutcome::default()
                };
            }
        };

        let outcome = match self.executor.execute(&pipeline, &mut self.history) {
            Ok(result) => LineOutcome {
                executed: true,
                status: result.status,
                exit_requested: result.exit_requested,
            },
            Err(e) => {
                warn!("命令执行失败: {}", e);
                eprintln!("{}", e);
                LineOutcome {
                    executed: false,
                    status: e.status(),
                    exit_requested: false,
                }
            }
        };
        self.last_status = outcome.status;
        outcome
    }

    fn load_history(&mut self) {
        let path = &self.config.history_file;
        if !path.exists() {
            return;
        }
        match self.history.read_from(path) {
            Ok(count) => {
                debug!("历史记录加载成功: {} 条", count);
                self.readline.seed_history(self.history.entries());
            }
            Err(err) => warn!("无法加载历史记录: {} {}", path.display(), err),
        }
    }

    fn save_history(&mut self) {
        let path = &self.config.history_file;
        match self.history.write_to(path) {
            Ok(()) => debug!("历史记录保存成功"),
            Err(err) => error!("保存历史记录失败: {} {}", path.display(), err),
        }
    }
}
