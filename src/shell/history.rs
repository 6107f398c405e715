use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::debug;

/// 本次会话的命令历史。
///
/// `appended` 是 `history -a` 的游标：记录上一次 `-w`/`-a` 之后已经落盘的条目数，
/// 会话开始时为 0。
#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<String>,
    appended: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn push(&mut self, line: &str) {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            return;
        }
        self.entries.push(line.to_string());
    }

    /// 最后 `limit` 条（`None` 表示全部），附带从 1 开始的序号。
    pub fn tail(&self, limit: Option<usize>) -> impl Iterator<Item = (usize, &str)> + '_ {
        let skip = match limit {
            Some(n) => self.entries.len().saturating_sub(n),
            None => 0,
        };
        self.entries
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, entry)| (i + 1, entry.as_str()))
    }

    /// 读取文件中的每个非空行并追加到历史中。
    pub fn read_from(&mut self, path: &Path) -> io::Result<usize> {
        let content = fs::read_to_string(path)?;
        let before = self.entries.len();
        for line in content.lines() {
            self.push(line);
        }
        let loaded = self.entries.len() - before;
        debug!("从 {} 读取了 {} 条历史", path.display(), loaded);
        Ok(loaded)
    }

    /// 覆盖写入全部条目。
    pub fn write_to(&mut self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Self::write_entries(file, &self.entries)?;
        self.appended = self.entries.len();
        debug!("写入 {} 条历史到 {}", self.entries.len(), path.display());
        Ok(())
    }

    /// 只追加上次 `-w`/`-a` 之后新增的条目。
    pub fn append_to(&mut self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let pending = &self.entries[self.appended.min(self.entries.len())..];
        Self::write_entries(file, pending)?;
        debug!("追加 {} 条历史到 {}", pending.len(), path.display());
        self.appended = self.entries.len();
        Ok(())
    }

    fn write_entries(file: fs::File, entries: &[String]) -> io::Result<()> {
        let mut writer = BufWriter::new(file);
        for entry in entries {
            writeln!(writer, "{}", entry)?;
        }
        writer.flush()
    }
}
