//! 애플리케이션 계층이 의존하는 포트(추상 인터페이스) 모음.

use anyhow::Result;

use crate::domain::entry::{IteratorOptions, Item, ScanEntry};

/// 한 번의 스캔 동안만 유효한 항목 반복자. drop 시점에 내부 트랜잭션이 해제된다.
pub type EntryIter<'a> = Box<dyn Iterator<Item = Result<ScanEntry>> + 'a>;

/// 이미 열린 키-값 저장소 핸들 포트.
pub trait KvStore: Send + Sync {
    /// 키가 없으면 `None`을 반환한다. 없는 키는 오류가 아니다.
    fn get(&self, key: &[u8]) -> Result<Option<Item>>;
    fn set(&self, key: &[u8], value: &[u8], meta: u8) -> Result<()>;
    fn delete(&self, key: &[u8]) -> Result<()>;
    /// 호출할 때마다 처음부터 다시 시작하는 지연 반복자를 만든다.
    fn iter(&self, options: &IteratorOptions) -> Result<EntryIter<'_>>;
}

/// 줄 입력 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// 인터럽트(Ctrl+C). 그 시점까지 입력 중이던 버퍼를 함께 전달한다.
    Interrupted { pending: String },
    Eof,
}

/// 대화형 줄 입력 포트.
pub trait LineSource {
    fn read_line(&mut self) -> Result<ReadOutcome>;
}
