//! 사용자 설정(JSON) 로딩/병합 모듈.
//! 여러 경로의 설정을 우선순위대로 병합한다.

mod loader;
mod types;

use anyhow::Result;
use tracing::debug;

pub use loader::{CONFIG_ENV, config_paths};
pub use types::{Config, DEFAULT_HISTORY_LIMIT, ShellConfig};

impl Config {
    /// 병합된 최종 설정을 로딩한다.
    pub fn load() -> Result<Self> {
        let loaded = loader::load_merged_config()?;
        debug!(files = loaded.loaded_paths.len(), "config merged");
        Ok(loaded.config)
    }
}
