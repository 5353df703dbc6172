//! 입력 기록 저장소. rustyline `FileHistory` 위에서 파일로 보존한다.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rustyline::history::{FileHistory, History as _, SearchDirection};
use tracing::{debug, warn};

pub struct History {
    entries: FileHistory,
    path: Option<PathBuf>,
}

impl History {
    /// 파일에 남기지 않는 기록.
    pub fn in_memory(limit: usize) -> Self {
        Self {
            entries: bounded_history(limit),
            path: None,
        }
    }

    /// 기록 파일을 읽는다. 기록은 부가 기능이므로 실패해도 빈 기록으로 시작한다.
    pub fn load(path: PathBuf, limit: usize) -> Self {
        let mut entries = bounded_history(limit);
        if path.exists()
            && let Err(err) = entries.load(&path)
        {
            warn!(path = %path.display(), error = %err, "failed to load history");
            entries = bounded_history(limit);
        }

        Self {
            entries,
            path: Some(path),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<String> {
        match self.entries.get(idx, SearchDirection::Forward) {
            Ok(found) => found.map(|hit| hit.entry.into_owned()),
            Err(err) => {
                debug!(idx, error = %err, "history lookup failed");
                None
            }
        }
    }

    /// 빈 줄, 공백으로 시작하는 줄, 직전과 같은 줄은 기록하지 않는다.
    pub fn push(&mut self, line: &str) {
        match self.entries.add(line.trim_end()) {
            Ok(true) => {
                if let Some(path) = &self.path
                    && let Err(err) = append_new_entries(&mut self.entries, path)
                {
                    warn!(path = %path.display(), error = %err, "failed to append history");
                }
            }
            Ok(false) => {}
            Err(err) => warn!(error = %err, "failed to record history"),
        }
    }

    /// `before` 앞쪽 기록에서 `term`을 포함하는 가장 최근 항목과 그 위치.
    pub fn search_back(&self, term: &str, before: usize) -> Option<(usize, String)> {
        if term.is_empty() || before == 0 {
            return None;
        }

        let start = before.min(self.len()).checked_sub(1)?;
        match self.entries.search(term, start, SearchDirection::Reverse) {
            Ok(found) => found.map(|hit| (hit.idx, hit.entry.into_owned())),
            Err(err) => {
                debug!(error = %err, "history search failed");
                None
            }
        }
    }
}

fn bounded_history(limit: usize) -> FileHistory {
    let mut entries = FileHistory::new();
    if let Err(err) = entries.set_max_len(limit.max(1)) {
        warn!(limit, error = %err, "failed to apply history limit");
    }
    if let Err(err) = entries.ignore_dups(true) {
        warn!(error = %err, "failed to enable history dedup");
    }
    entries.ignore_space(true);
    entries
}

fn append_new_entries(entries: &mut FileHistory, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    entries
        .append(path)
        .with_context(|| format!("failed to write history at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn skips_blank_spaced_and_repeated_lines() {
        let mut history = History::in_memory(10);
        history.push("get a");
        history.push("get a");
        history.push("   ");
        history.push(" set hidden 1");
        history.push("dump");
        history.push("get a");

        assert_eq!(history.len(), 3);
        assert_eq!(history.get(0).as_deref(), Some("get a"));
        assert_eq!(history.get(1).as_deref(), Some("dump"));
        assert_eq!(history.get(2).as_deref(), Some("get a"));
        assert_eq!(history.get(3), None);
    }

    #[test]
    fn keeps_only_the_newest_entries() {
        let mut history = History::in_memory(2);
        for line in ["a", "b", "c"] {
            history.push(line);
        }
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(0).as_deref(), Some("b"));
        assert_eq!(history.get(1).as_deref(), Some("c"));
    }

    #[test]
    fn persists_across_loads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history");

        let mut history = History::load(path.clone(), 10);
        assert!(history.is_empty());
        history.push("set a 1");
        history.push("get a");

        let reloaded = History::load(path, 10);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(1).as_deref(), Some("get a"));
    }

    #[test]
    fn plain_line_file_loads_newest_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history");
        fs::write(&path, "a\nb\nc\nd\n").unwrap();

        let history = History::load(path, 2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.get(0).as_deref(), Some("c"));
        assert_eq!(history.get(1).as_deref(), Some("d"));
    }

    #[test]
    fn unreadable_history_starts_empty() {
        let dir = TempDir::new().unwrap();
        // 디렉터리는 파일로 읽을 수 없다.
        let history = History::load(dir.path().to_path_buf(), 10);
        assert!(history.is_empty());
    }

    #[test]
    fn search_back_walks_older_matches() {
        let mut history = History::in_memory(10);
        for line in ["set a 1", "get a", "set b 2"] {
            history.push(line);
        }

        assert_eq!(
            history.search_back("set", history.len()),
            Some((2, "set b 2".to_string()))
        );
        assert_eq!(
            history.search_back("set", 2),
            Some((0, "set a 1".to_string()))
        );
        assert_eq!(history.search_back("set", 0), None);
        assert_eq!(history.search_back("dump", history.len()), None);
        assert_eq!(history.search_back("", history.len()), None);
    }
}
