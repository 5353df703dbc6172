//! 키-값 저장소 포트 구현체.
//! 실제 실행은 redb 기반 저장소를, 테스트는 메모리 저장소를 사용한다.

mod memory;
mod redb_store;

use std::path::{Path, PathBuf};

pub use memory::MemoryStore;
pub use redb_store::{INDEX_FILE, RedbStore, VALUE_FILE};

/// 저장소 디렉터리 설정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// 키 인덱스가 위치하는 디렉터리
    pub dir: PathBuf,
    /// 값 파일이 위치하는 디렉터리. 지정하지 않으면 `dir`과 같다.
    pub value_dir: PathBuf,
}

impl StoreOptions {
    pub fn new(dir: impl Into<PathBuf>, value_dir: Option<PathBuf>) -> Self {
        let dir = dir.into();
        let value_dir = value_dir.unwrap_or_else(|| dir.clone());
        Self { dir, value_dir }
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    pub fn value_path(&self) -> PathBuf {
        self.value_dir.join(VALUE_FILE)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
