//! 애플리케이션 조립(composition root) 모듈.

use anyhow::Result;

use crate::application::usecases::{DispatchStatementUseCase, RunSessionUseCase};
use crate::infrastructure::adapters::{History, TerminalLineSource};
use crate::infrastructure::config::Config;
use crate::infrastructure::store::{RedbStore, StoreOptions};

/// 실행 시점 의존성을 한 곳에서 조립하는 컨테이너.
/// 저장소 핸들을 단독 소유하며, drop 시 저장소가 닫힌다.
pub struct AppComposition {
    config: Config,
    store: RedbStore,
}

impl AppComposition {
    /// 병합된 설정을 읽고 저장소를 연다.
    pub fn open(options: StoreOptions) -> Result<Self> {
        Self::with_config(Config::load()?, options)
    }

    /// 설정을 외부에서 주입한다.
    pub fn with_config(config: Config, options: StoreOptions) -> Result<Self> {
        let store = RedbStore::open(options)?;
        Ok(Self { config, store })
    }

    /// 문장 실행 유스케이스를 생성한다.
    pub fn dispatch_usecase(&self) -> DispatchStatementUseCase<'_> {
        DispatchStatementUseCase { store: &self.store }
    }

    /// 대화형 세션 유스케이스를 생성한다.
    pub fn session_usecase(&self) -> RunSessionUseCase<'_> {
        RunSessionUseCase { store: &self.store }
    }

    /// 설정된 프롬프트와 입력 기록으로 터미널 줄 입력기를 만든다.
    pub fn line_source(&self) -> TerminalLineSource {
        let shell = &self.config.shell;
        let prompt = shell.prompt_for(self.store.options().dir());
        let history = History::load(shell.history_path(), shell.history_limit());
        TerminalLineSource::new(prompt, history)
    }
}
