use colored::Colorize;

use crate::utils::path::{basename, current_dir};

pub struct Theme {
    pub name: String,
    pub welcome_message: String,
    pub exit_message: String,
    pub dir_style: Box<dyn Fn(&str) -> String>,
    pub symbol_style: Box<dyn Fn(&str) -> String>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            name: String::from("default"),
            welcome_message: "zest ready. type `exit` to leave.".bright_cyan().to_string(),
            exit_message: "bye.".bright_blue().to_string(),
            dir_style: Box::new(|s| s.bright_cyan().to_string()),
            symbol_style: Box::new(|s| s.bright_green().to_string()),
        }
    }
}

impl Theme {
    pub fn load_theme(theme_name: &str) -> Theme {
        match theme_name {
            "dark" => Theme {
                name: String::from("dark"),
                welcome_message: "zest ready.".bright_purple().to_string(),
                exit_message: "bye.".purple().to_string(),
                dir_style: Box::new(|s| s.bright_purple().to_string()),
                symbol_style: Box::new(|s| s.magenta().to_string()),
            },
            _ => Theme::default(),
        }
    }

    /// 上一条命令失败时提示符号变红。
    pub fn prompt(&self, last_status: i32) -> String {
        let dir = current_dir();
        let symbol = if last_status == 0 {
            (self.symbol_style)("$")
        } else {
            "$".red().to_string()
        };
        format!("{} {} ", (self.dir_style)(basename(&dir)), symbol)
    }
}
