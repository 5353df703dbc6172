//! redb 기반 저장소 어댑터.
//! 키 인덱스(키 -> 메타 바이트)와 값(키 -> 값)을 서로 다른 파일에 둔다.

use std::collections::VecDeque;
use std::fs;
use std::ops::Bound;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use redb::{Database, ReadOnlyTable, ReadTransaction, TableDefinition};
use tracing::debug;

use super::StoreOptions;
use crate::application::ports::{EntryIter, KvStore};
use crate::domain::entry::{IteratorOptions, Item, ScanEntry};

pub const INDEX_FILE: &str = "index.redb";
pub const VALUE_FILE: &str = "values.redb";

const INDEX_TABLE: TableDefinition<&[u8], u8> = TableDefinition::new("index");
const VALUE_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("values");

type IndexTable = ReadOnlyTable<&'static [u8], u8>;
type ValueTable = ReadOnlyTable<&'static [u8], &'static [u8]>;

/// `--dir`/`--value-dir`로 지정된 두 데이터베이스를 묶은 저장소 핸들.
/// drop 시 두 데이터베이스가 함께 닫힌다.
pub struct RedbStore {
    index: Database,
    values: Database,
    options: StoreOptions,
}

impl RedbStore {
    /// 디렉터리와 데이터베이스 파일이 없으면 만들고 테이블을 준비한다.
    pub fn open(options: StoreOptions) -> Result<Self> {
        let index = open_database(&options.index_path())?;
        let values = open_database(&options.value_path())?;

        let txn = index.begin_write()?;
        txn.open_table(INDEX_TABLE)?;
        txn.commit().context("failed to initialize index table")?;

        let txn = values.begin_write()?;
        txn.open_table(VALUE_TABLE)?;
        txn.commit().context("failed to initialize value table")?;

        debug!(
            dir = %options.dir.display(),
            value_dir = %options.value_dir.display(),
            "store opened"
        );
        Ok(Self {
            index,
            values,
            options,
        })
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }
}

impl KvStore for RedbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Item>> {
        let txn = self.index.begin_read()?;
        let table = txn.open_table(INDEX_TABLE)?;
        let Some(meta) = table.get(key)? else {
            return Ok(None);
        };
        let meta = meta.value();

        let values_txn = self.values.begin_read()?;
        let values = values_txn.open_table(VALUE_TABLE)?;
        let value = read_value(&values, key)?;
        Ok(Some(Item { value, meta }))
    }

    fn set(&self, key: &[u8], value: &[u8], meta: u8) -> Result<()> {
        // 값을 먼저 기록해 인덱스가 없는 값을 가리키는 상태를 만들지 않는다.
        let txn = self.values.begin_write()?;
        {
            let mut table = txn.open_table(VALUE_TABLE)?;
            table.insert(key, value)?;
        }
        txn.commit()?;

        let txn = self.index.begin_write()?;
        {
            let mut table = txn.open_table(INDEX_TABLE)?;
            table.insert(key, meta)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        let txn = self.index.begin_write()?;
        {
            let mut table = txn.open_table(INDEX_TABLE)?;
            table.remove(key)?;
        }
        txn.commit()?;

        let txn = self.values.begin_write()?;
        {
            let mut table = txn.open_table(VALUE_TABLE)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn iter(&self, options: &IteratorOptions) -> Result<EntryIter<'_>> {
        let index_txn = self.index.begin_read()?;
        let index = index_txn.open_table(INDEX_TABLE)?;
        let values_txn = self.values.begin_read()?;
        let values = values_txn.open_table(VALUE_TABLE)?;

        Ok(Box::new(RedbEntryIter {
            index,
            values,
            _index_txn: index_txn,
            _values_txn: values_txn,
            reverse: options.reverse,
            prefetch_size: options.prefetch_size.max(1),
            buffer: VecDeque::new(),
            cursor: None,
            exhausted: false,
        }))
    }
}

/// 읽기 트랜잭션 스냅샷 위에서 키를 `prefetch_size`개씩 끊어 읽는 반복자.
/// 값은 항목을 내보낼 때 하나씩 조회한다.
struct RedbEntryIter {
    index: IndexTable,
    values: ValueTable,
    _index_txn: ReadTransaction,
    _values_txn: ReadTransaction,
    reverse: bool,
    prefetch_size: usize,
    buffer: VecDeque<(Vec<u8>, u8)>,
    cursor: Option<Vec<u8>>,
    exhausted: bool,
}

impl Iterator for RedbEntryIter {
    type Item = Result<ScanEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            match fetch_keys(
                &self.index,
                self.cursor.as_deref(),
                self.reverse,
                self.prefetch_size,
            ) {
                Ok(batch) => {
                    self.exhausted = batch.len() < self.prefetch_size;
                    self.buffer = batch;
                }
                Err(err) => {
                    self.exhausted = true;
                    return Some(Err(err));
                }
            }
        }

        let (key, meta) = self.buffer.pop_front()?;
        self.cursor = Some(key.clone());
        let value = read_value(&self.values, &key);
        Some(Ok(ScanEntry { key, meta, value }))
    }
}

fn fetch_keys(
    table: &IndexTable,
    after: Option<&[u8]>,
    reverse: bool,
    limit: usize,
) -> Result<VecDeque<(Vec<u8>, u8)>> {
    let bounds: (Bound<&[u8]>, Bound<&[u8]>) = match (after, reverse) {
        (None, _) => (Bound::Unbounded, Bound::Unbounded),
        (Some(key), false) => (Bound::Excluded(key), Bound::Unbounded),
        (Some(key), true) => (Bound::Unbounded, Bound::Excluded(key)),
    };

    let mut range = table.range::<&[u8]>(bounds)?;
    let mut batch = VecDeque::with_capacity(limit);
    while batch.len() < limit {
        let next = if reverse {
            range.next_back()
        } else {
            range.next()
        };
        let Some(entry) = next else {
            break;
        };
        let (key, meta) = entry?;
        batch.push_back((key.value().to_vec(), meta.value()));
    }
    Ok(batch)
}

fn read_value(table: &ValueTable, key: &[u8]) -> Result<Vec<u8>> {
    let guard = table
        .get(key)?
        .ok_or_else(|| anyhow!("value missing for key {}", String::from_utf8_lossy(key)))?;
    Ok(guard.value().to_vec())
}

fn open_database(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    Database::create(path)
        .with_context(|| format!("failed to open database at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn open(dir: &TempDir) -> RedbStore {
        RedbStore::open(StoreOptions::new(dir.path(), None)).unwrap()
    }

    fn scan(store: &RedbStore, options: IteratorOptions) -> Vec<(Vec<u8>, Vec<u8>)> {
        store
            .iter(&options)
            .unwrap()
            .map(|entry| {
                let entry = entry.unwrap();
                (entry.key, entry.value.unwrap())
            })
            .collect()
    }

    #[test]
    fn set_get_delete_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);

        store.set(b"k", b"v", 7).unwrap();
        assert_eq!(
            store.get(b"k").unwrap(),
            Some(Item {
                value: b"v".to_vec(),
                meta: 7,
            })
        );

        store.delete(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn deleting_absent_key_succeeds() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.delete(b"ghost").unwrap();
    }

    #[test]
    fn overwrite_replaces_value() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.set(b"k", b"old", 0).unwrap();
        store.set(b"k", b"new", 0).unwrap();
        assert_eq!(store.get(b"k").unwrap().unwrap().value, b"new".to_vec());
    }

    #[test]
    fn iteration_follows_key_order_across_batches() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        for key in ["d", "a", "c", "e", "b"] {
            store.set(key.as_bytes(), key.to_uppercase().as_bytes(), 0).unwrap();
        }

        let options = IteratorOptions {
            reverse: false,
            prefetch_size: 2,
        };
        let keys: Vec<Vec<u8>> = scan(&store, options).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec(), b"e".to_vec()]
        );
    }

    #[test]
    fn reverse_iteration() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        for key in ["a", "b", "c"] {
            store.set(key.as_bytes(), b"x", 0).unwrap();
        }

        let options = IteratorOptions {
            reverse: true,
            prefetch_size: 2,
        };
        let keys: Vec<Vec<u8>> = scan(&store, options).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn iterator_sees_snapshot_taken_at_creation() {
        let dir = TempDir::new().unwrap();
        let store = open(&dir);
        store.set(b"a", b"1", 0).unwrap();

        let mut entries = store.iter(&IteratorOptions::default()).unwrap();
        store.set(b"b", b"2", 0).unwrap();

        let first = entries.next().unwrap().unwrap();
        assert_eq!(first.key, b"a".to_vec());
        assert!(entries.next().is_none());
    }

    #[test]
    fn separate_value_dir_holds_value_file() {
        let index_dir = TempDir::new().unwrap();
        let value_dir = TempDir::new().unwrap();
        let options = StoreOptions::new(index_dir.path(), Some(value_dir.path().join("vlog")));

        let store = RedbStore::open(options).unwrap();
        store.set(b"k", b"v", 0).unwrap();

        assert!(index_dir.path().join(INDEX_FILE).is_file());
        assert!(value_dir.path().join("vlog").join(VALUE_FILE).is_file());
        assert!(!index_dir.path().join(VALUE_FILE).exists());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = open(&dir);
            store.set(b"k", b"v", 0).unwrap();
        }

        let store = open(&dir);
        assert_eq!(store.get(b"k").unwrap().unwrap().value, b"v".to_vec());
    }

    #[test]
    fn index_entry_without_value_is_reported_per_entry() {
        let index_dir = TempDir::new().unwrap();
        let first_values = TempDir::new().unwrap();
        let second_values = TempDir::new().unwrap();
        {
            let store = RedbStore::open(StoreOptions::new(
                index_dir.path(),
                Some(first_values.path().to_path_buf()),
            ))
            .unwrap();
            store.set(b"k", b"v", 0).unwrap();
        }

        // 같은 인덱스를 빈 값 디렉터리와 함께 연다.
        let store = RedbStore::open(StoreOptions::new(
            index_dir.path(),
            Some(second_values.path().to_path_buf()),
        ))
        .unwrap();

        assert!(store.get(b"k").is_err());
        let entry = store
            .iter(&IteratorOptions::default())
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(entry.key, b"k".to_vec());
        assert!(entry.value.is_err());
    }
}
