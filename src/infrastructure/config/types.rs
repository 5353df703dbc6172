//! 설정 스키마와 병합/해석 규칙.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_LIMIT: usize = 1000;
const HISTORY_FILE_NAME: &str = "history";
const FALLBACK_HISTORY_FILE_NAME: &str = "kvsh.history";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// 대화형 쉘 설정
    #[serde(default)]
    pub shell: ShellConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ShellConfig {
    /// 프롬프트 문자열. 없으면 `<dir> > `
    pub prompt: Option<String>,
    /// 입력 기록 파일 경로
    pub history_file: Option<String>,
    /// 보관할 최대 입력 기록 수
    pub history_limit: Option<usize>,
}

impl Config {
    pub(crate) fn merge_from(&mut self, other: Config) {
        self.shell.merge_from(other.shell);
    }
}

impl ShellConfig {
    pub(crate) fn merge_from(&mut self, other: ShellConfig) {
        if other.prompt.is_some() {
            self.prompt = other.prompt;
        }
        if other.history_file.is_some() {
            self.history_file = other.history_file;
        }
        if other.history_limit.is_some() {
            self.history_limit = other.history_limit;
        }
    }

    /// 설정된 프롬프트 또는 저장소 디렉터리 기반 기본 프롬프트.
    pub fn prompt_for(&self, dir: &Path) -> String {
        self.prompt
            .clone()
            .unwrap_or_else(|| format!("{} > ", dir.display()))
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT)
    }

    /// 입력 기록 파일 경로를 결정한다.
    /// 설정값 -> 로컬 데이터 디렉터리 -> 임시 디렉터리 순이다.
    pub fn history_path(&self) -> PathBuf {
        if let Some(path) = &self.history_file {
            return PathBuf::from(path);
        }

        match dirs::data_local_dir() {
            Some(base) => base.join("kvsh").join(HISTORY_FILE_NAME),
            None => env::temp_dir().join(FALLBACK_HISTORY_FILE_NAME),
        }
    }
}
