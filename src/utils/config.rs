use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

pub struct Config {
    pub name: String,
    pub theme: String,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        if let Ok(home) = env::var("HOME") {
            PathBuf::from(home).join(".config/zest")
        } else {
            env::temp_dir().join("zest")
        }
    }

    fn default() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            name: String::from("zest"),
            theme: String::from("default"),
            history_file: config_dir.join(".zest_history"),
            editor_mode: String::from("emacs"),
            logger_level: String::from("info"),
            logger_dir: config_dir.join("logs"),
        }
    }

    pub fn new() -> Self {
        // 优先加载 .env 文件中的变量
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();

        if let Ok(theme) = env::var("ZEST_THEME") {
            config.theme = theme;
        }

        if let Ok(editor) = env::var("ZEST_EDITOR") {
            config.editor_mode = editor;
        }

        if let Ok(level) = env::var("ZEST_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Ok(dir) = env::var("ZEST_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        // HISTFILE 优先于 ZEST_HISTORY
        if let Ok(history) = env::var("HISTFILE").or_else(|_| env::var("ZEST_HISTORY")) {
            if !history.is_empty() {
                config.history_file = PathBuf::from(history);
            }
        }

        config
    }

    /// 确保历史文件所在目录存在。需在日志初始化之后调用，失败由调用方记录。
    pub fn ensure_history_dir(&self) -> io::Result<()> {
        match self.history_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}
