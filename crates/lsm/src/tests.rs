use super::*;
use config::LsmConfig;
use kvcontract::KvEngine;
use tempfile::tempdir;

fn engine_in(dir: &std::path::Path, memtable_byte_limit: usize) -> LsmEngine {
    let mut config = LsmConfig::new(dir);
    config.memtable_byte_limit = memtable_byte_limit;
    config.sparse_index_stride = 4;
    LsmEngine::new(config).unwrap()
}

#[test]
fn put_then_get_returns_the_value() {
    let dir = tempdir().unwrap();
    let engine = engine_in(dir.path(), 1 << 20);
    engine.start().unwrap();

    engine.put(b"a".to_vec(), b"1".to_vec()).unwrap();
    assert_eq!(engine.read(b"a").unwrap(), Some(b"1".to_vec()));
}

#[test]
fn delete_shadows_an_older_value_even_after_a_flush() {
    let dir = tempdir().unwrap();
    let engine = engine_in(dir.path(), 8); // tiny, forces a flush on every write

    engine.start().unwrap();
    engine.put(b"a".to_vec(), b"1".to_vec()).unwrap();
    engine.delete(b"a").unwrap();
    assert_eq!(engine.read(b"a").unwrap(), None);
}

#[test]
fn flush_moves_data_out_of_the_memtable_into_a_table() {
    let dir = tempdir().unwrap();
    let engine = engine_in(dir.path(), 4); // flush after nearly every put

    engine.start().unwrap();
    for i in 0..20u32 {
        engine.put(format!("k{i:03}").into_bytes(), b"v".to_vec()).unwrap();
    }

    assert!(!engine.manifest.read().unwrap().is_empty());
    for i in 0..20u32 {
        assert_eq!(engine.read(format!("k{i:03}").into_bytes().as_slice()).unwrap(), Some(b"v".to_vec()));
    }
}

#[test]
fn a_newer_table_wins_over_an_older_one_on_point_read() {
    let dir = tempdir().unwrap();
    let engine = engine_in(dir.path(), 1); // flush after every write

    engine.start().unwrap();
    engine.put(b"a".to_vec(), b"old".to_vec()).unwrap();
    engine.put(b"a".to_vec(), b"new".to_vec()).unwrap();
    assert_eq!(engine.read(b"a").unwrap(), Some(b"new".to_vec()));
}

#[test]
fn read_range_merges_memtable_and_tables_with_newest_winning() {
    let dir = tempdir().unwrap();
    let engine = engine_in(dir.path(), 1);

    engine.start().unwrap();
    engine.put(b"a".to_vec(), b"1".to_vec()).unwrap();
    engine.put(b"b".to_vec(), b"2".to_vec()).unwrap();
    engine.put(b"a".to_vec(), b"1-new".to_vec()).unwrap();

    let got = engine.read_range(b"a", b"b", 10).unwrap();
    assert_eq!(got, vec![(b"a".to_vec(), b"1-new".to_vec()), (b"b".to_vec(), b"2".to_vec())]);
}

#[test]
fn recovery_across_restart_replays_the_wal_into_a_fresh_memtable() {
    let dir = tempdir().unwrap();
    {
        let engine = engine_in(dir.path(), 1 << 20); // large: nothing flushes
        engine.start().unwrap();
        engine.put(b"a".to_vec(), b"1".to_vec()).unwrap();
        engine.delete(b"a".to_vec().as_slice()).unwrap();
        engine.put(b"b".to_vec(), b"2".to_vec()).unwrap();
        engine.close().unwrap();
    }

    let engine = engine_in(dir.path(), 1 << 20);
    engine.start().unwrap();
    assert_eq!(engine.read(b"a").unwrap(), None);
    assert_eq!(engine.read(b"b").unwrap(), Some(b"2".to_vec()));
}

#[test]
fn compaction_merges_the_oldest_tables_and_shrinks_the_manifest() {
    let dir = tempdir().unwrap();
    let mut config = LsmConfig::new(dir.path());
    config.memtable_byte_limit = 1;
    config.compaction_fan_in = 3;
    let engine = LsmEngine::new(config).unwrap();
    engine.start().unwrap();

    for i in 0..5u32 {
        engine.put(format!("k{i}").into_bytes(), b"v".to_vec()).unwrap();
    }
    let before = engine.manifest.read().unwrap().len();
    assert!(before >= 3);

    let reclaimed = engine.compact().unwrap();
    assert!(reclaimed > 0);

    let after = engine.manifest.read().unwrap().len();
    assert!(after < before);
    for i in 0..5u32 {
        assert_eq!(engine.read(format!("k{i}").into_bytes().as_slice()).unwrap(), Some(b"v".to_vec()));
    }
}

#[test]
fn compaction_is_a_no_op_with_fewer_than_two_tables() {
    let dir = tempdir().unwrap();
    let engine = engine_in(dir.path(), 1 << 20);
    engine.start().unwrap();
    engine.put(b"a".to_vec(), b"1".to_vec()).unwrap();

    assert_eq!(engine.compact().unwrap(), 0);
}

#[test]
fn read_range_with_start_after_end_returns_empty_instead_of_panicking() {
    let dir = tempdir().unwrap();
    let engine = engine_in(dir.path(), 1 << 20);
    engine.start().unwrap();
    engine.put(b"a".to_vec(), b"1".to_vec()).unwrap();

    assert_eq!(engine.read_range(b"z", b"a", 10).unwrap(), Vec::new());
}

#[test]
fn operations_before_start_return_a_lifecycle_error() {
    let dir = tempdir().unwrap();
    let config = LsmConfig::new(dir.path());
    let engine = LsmEngine::new(config).unwrap();

    assert!(matches!(engine.read(b"a"), Err(KvError::Lifecycle)));
}
