//! 프로세스 메모리 안의 저장소. 테스트와 라이브러리 직접 호출용.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow, bail};

use crate::application::ports::{EntryIter, KvStore};
use crate::domain::entry::{IteratorOptions, Item, ScanEntry};

#[derive(Default)]
struct MemoryState {
    entries: BTreeMap<Vec<u8>, Item>,
    /// 값 조회를 실패시킬 키
    broken_values: BTreeSet<Vec<u8>>,
    /// 설정되면 모든 연산이 이 메시지로 실패한다
    failure: Option<String>,
    /// 반복자가 이만큼 내보낸 뒤 커서 오류를 낸다
    scan_failure: Option<(usize, String)>,
}

/// `BTreeMap` 기반 저장소.
/// 반복자는 생성 시점 스냅샷을 순회하며, 살아 있는 반복자 수를 추적한다.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    open_iterators: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이후 모든 연산을 주어진 메시지로 실패시킨다.
    pub fn fail_operations(&self, reason: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.failure = Some(reason.to_string());
        }
    }

    /// 해당 키의 값 조회만 실패시킨다. 키 순회는 계속 성공한다.
    pub fn fail_value(&self, key: &[u8]) {
        if let Ok(mut state) = self.state.lock() {
            state.broken_values.insert(key.to_vec());
        }
    }

    /// 이후 만드는 반복자가 항목 `after`개를 내보낸 뒤 커서 오류로 끝나게 한다.
    pub fn fail_scan_after(&self, after: usize, reason: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.scan_failure = Some((after, reason.to_string()));
        }
    }

    /// 아직 drop되지 않은 반복자 수.
    pub fn open_iterators(&self) -> usize {
        self.open_iterators.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        let state = self
            .state
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        if let Some(reason) = &state.failure {
            bail!("{reason}");
        }
        Ok(state)
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Item>> {
        let state = self.lock()?;
        if state.broken_values.contains(key) {
            bail!("value unreadable for key {}", String::from_utf8_lossy(key));
        }
        Ok(state.entries.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8], meta: u8) -> Result<()> {
        let mut state = self.lock()?;
        state.entries.insert(
            key.to_vec(),
            Item {
                value: value.to_vec(),
                meta,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        let mut state = self.lock()?;
        state.entries.remove(key);
        Ok(())
    }

    fn iter(&self, options: &IteratorOptions) -> Result<EntryIter<'_>> {
        let state = self.lock()?;
        let mut snapshot: Vec<ScanEntry> = state
            .entries
            .iter()
            .map(|(key, item)| ScanEntry {
                key: key.clone(),
                meta: item.meta,
                value: if state.broken_values.contains(key) {
                    Err(anyhow!(
                        "value unreadable for key {}",
                        String::from_utf8_lossy(key)
                    ))
                } else {
                    Ok(item.value.clone())
                },
            })
            .collect();
        if options.reverse {
            snapshot.reverse();
        }

        Ok(Box::new(MemoryEntryIter::new(
            snapshot,
            state.scan_failure.clone(),
            Arc::clone(&self.open_iterators),
        )))
    }
}

struct MemoryEntryIter {
    entries: std::vec::IntoIter<ScanEntry>,
    failure: Option<(usize, String)>,
    yielded: usize,
    open_iterators: Arc<AtomicUsize>,
}

impl MemoryEntryIter {
    fn new(
        entries: Vec<ScanEntry>,
        failure: Option<(usize, String)>,
        open_iterators: Arc<AtomicUsize>,
    ) -> Self {
        open_iterators.fetch_add(1, Ordering::SeqCst);
        Self {
            entries: entries.into_iter(),
            failure,
            yielded: 0,
            open_iterators,
        }
    }
}

impl Iterator for MemoryEntryIter {
    type Item = Result<ScanEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        // 커서 오류는 한 번만 내고 이후로는 끝난 반복자처럼 동작한다.
        if let Some((after, _)) = &self.failure
            && self.yielded >= *after
        {
            let (_, reason) = self.failure.take()?;
            self.entries = Vec::new().into_iter();
            return Some(Err(anyhow!(reason)));
        }

        let entry = self.entries.next()?;
        self.yielded += 1;
        Some(Ok(entry))
    }
}

impl Drop for MemoryEntryIter {
    fn drop(&mut self) {
        self.open_iterators.fetch_sub(1, Ordering::SeqCst);
    }
}
