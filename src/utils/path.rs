use std::env;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::{debug, trace};

/// 在 `PATH` 中查找名为 `name` 的可执行文件，按 `PATH` 顺序返回第一个匹配。
pub fn find_executable(name: &str) -> Option<PathBuf> {
    match env::var_os("PATH") {
        Some(path) => find_executable_in(name, &path),
        None => {
            debug!("PATH 未设置，无法查找 {}", name);
            None
        }
    }
}

pub fn find_executable_in(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    if name.is_empty() || name.contains('/') {
        return None;
    }
    for dir in env::split_paths(path_var) {
        // 空的 PATH 分量表示当前目录
        let dir = if dir.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            dir
        };
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            trace!("{} 解析为 {}", name, candidate.display());
            return Some(candidate);
        }
    }
    None
}

/// 常规文件且至少有一个执行位。
pub fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

pub fn basename(path: &str) -> &str {
    match path.trim_end_matches('/').rsplit('/').next() {
        Some("") | None => path,
        Some(p) => p,
    }
}

pub fn current_dir() -> String {
    match env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(e) => {
            debug!("env current_dir error: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::fs::File;
    use tempfile::TempDir;

    #[allow(clippy::unwrap_used)]
    fn touch(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[allow(clippy::unwrap_used)]
    fn join(dirs: &[&Path]) -> OsString {
        env::join_paths(dirs).unwrap()
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("/usr/local/bin"), "bin");
        assert_eq!(basename("/tmp/"), "tmp");
        assert_eq!(basename("/"), "/");
        assert_eq!(basename("file"), "file");
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_first_match_in_path_order_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        touch(second.path(), "tool", 0o755);
        let expected = touch(first.path(), "tool", 0o755);

        let found = find_executable_in("tool", &join(&[first.path(), second.path()]));
        assert_eq!(found, Some(expected));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_skips_non_executable_entries() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        touch(first.path(), "tool", 0o644);
        let expected = touch(second.path(), "tool", 0o700);

        let found = find_executable_in("tool", &join(&[first.path(), second.path()]));
        assert_eq!(found, Some(expected));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_skips_directories_and_missing_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("tool")).unwrap();
        let missing = dir.path().join("does-not-exist");

        let found = find_executable_in("tool", &join(&[missing.as_path(), dir.path()]));
        assert_eq!(found, None);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_exact_name_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "tool.sh", 0o755);

        assert_eq!(find_executable_in("tool", &join(&[dir.path()])), None);
        assert_eq!(find_executable_in("", &join(&[dir.path()])), None);
    }
}
