use crate::utils::config::Config;
use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::process;

fn parse_level(level: &str) -> LevelFilter {
    match level {
        level if level.eq_ignore_ascii_case("off") => LevelFilter::Off,
        level if level.eq_ignore_ascii_case("error") => LevelFilter::Error,
        level if level.eq_ignore_ascii_case("warn") => LevelFilter::Warn,
        level if level.eq_ignore_ascii_case("info") => LevelFilter::Info,
        level if level.eq_ignore_ascii_case("debug") => LevelFilter::Debug,
        level if level.eq_ignore_ascii_case("trace") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// 日志只写入文件：stdout/stderr 属于用户命令的输出，不能混入日志。
pub fn init_logger(config: &Config) {
    let level = parse_level(&config.logger_level);
    let sink = open_log_file(config);

    let result = Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[PID:{}][{}] {} - {}",
                process::id(),
                record.level(),
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.args()
            )
        })
        .target(Target::Pipe(sink))
        .filter(Some(&config.name), level)
        .filter(None, LevelFilter::Warn)
        .try_init();

    if result.is_ok() {
        log::debug!("日志级别设置为: {}", level);
    }
}

fn open_log_file(config: &Config) -> Box<dyn Write + Send + 'static> {
    if fs::create_dir_all(&config.logger_dir).is_err() {
        return Box::new(io::sink());
    }
    let date = Local::now().format("%Y-%m-%d");
    let log_file = config.logger_dir.join(format!("{}_{}.log", config.name, date));
    match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => Box::new(file),
        Err(_) => Box::new(io::sink()),
    }
}
