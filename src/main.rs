use log::{debug, warn};
use shell::Shell;
use utils::theme::Theme;

use crate::utils::config::Config;
use crate::utils::log::init_logger;

mod shell;
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::new();
    init_logger(&config);
    // 历史目录创建失败只记录，不中断启动
    if let Err(e) = config.ensure_history_dir() {
        warn!("无法创建历史记录目录 {}: {}", config.history_file.display(), e);
    }
    debug!("配置加载成功, 历史文件 {}", config.history_file.display());
    let theme = Theme::load_theme(&config.theme);
    debug!("使用主题: {}", theme.name);

    let mut shell = Shell::new(&config, &theme)?;
    let status = shell.run()?;
    log::logger().flush();
    std::process::exit(status)
}
