//! 저장소와 주고받는 항목 타입.

use anyhow::Result;

/// badger 기본 반복 옵션과 같은 선읽기 크기.
pub const DEFAULT_PREFETCH_SIZE: usize = 100;

/// `get` 결과. 값과 함께 저장된 메타 바이트를 돌려준다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub value: Vec<u8>,
    pub meta: u8,
}

/// 전체 스캔 중 한 항목.
/// 키 순회와 값 조회는 독립적으로 실패할 수 있어 값은 별도의 `Result`로 둔다.
#[derive(Debug)]
pub struct ScanEntry {
    pub key: Vec<u8>,
    pub meta: u8,
    pub value: Result<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IteratorOptions {
    /// 키 역순 순회 여부
    pub reverse: bool,
    /// 한 번에 미리 읽어 둘 키 개수
    pub prefetch_size: usize,
}

impl Default for IteratorOptions {
    fn default() -> Self {
        Self {
            reverse: false,
            prefetch_size: DEFAULT_PREFETCH_SIZE,
        }
    }
}
