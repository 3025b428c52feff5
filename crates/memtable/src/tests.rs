use super::*;

#[test]
fn put_then_get_returns_hit() {
    let m = Memtable::new();
    m.put(b"hello".to_vec(), b"world".to_vec());
    assert_eq!(m.get(b"hello"), Some(Some(b"world".to_vec())));
}

#[test]
fn missing_key_returns_none() {
    let m = Memtable::new();
    assert_eq!(m.get(b"nope"), None);
}

#[test]
fn delete_installs_tombstone_distinct_from_missing() {
    let m = Memtable::new();
    m.put(b"hello".to_vec(), b"world".to_vec());
    m.delete(b"hello".to_vec());
    assert_eq!(m.get(b"hello"), Some(None));
    assert_ne!(m.get(b"hello"), m.get(b"never-written"));
}

#[test]
fn empty_value_is_distinguishable_from_tombstone() {
    let m = Memtable::new();
    m.put(b"k".to_vec(), Vec::new());
    assert_eq!(m.get(b"k"), Some(Some(Vec::new())));
    m.delete(b"k".to_vec());
    assert_eq!(m.get(b"k"), Some(None));
}

#[test]
fn later_put_overwrites_earlier_one() {
    let m = Memtable::new();
    m.put(b"k".to_vec(), b"old".to_vec());
    m.put(b"k".to_vec(), b"new".to_vec());
    assert_eq!(m.get(b"k"), Some(Some(b"new".to_vec())));
    assert_eq!(m.len(), 1);
}

#[test]
fn approx_size_tracks_key_and_value_bytes() {
    let m = Memtable::new();
    assert_eq!(m.approx_size(), 0);
    m.put(b"ab".to_vec(), b"cde".to_vec());
    assert_eq!(m.approx_size(), 2 + 3);
    m.put(b"ab".to_vec(), b"x".to_vec());
    assert_eq!(m.approx_size(), 2 + 1);
    m.delete(b"ab".to_vec());
    assert_eq!(m.approx_size(), 2);
}

#[test]
fn snapshot_is_sorted_ascending_and_includes_tombstones() {
    let m = Memtable::new();
    m.put(b"c".to_vec(), b"3".to_vec());
    m.put(b"a".to_vec(), b"1".to_vec());
    m.delete(b"b".to_vec());

    let snap = m.snapshot();
    let keys: Vec<_> = snap.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    assert_eq!(snap[1].1, None);
}

#[test]
fn range_respects_inclusive_start_exclusive_end() {
    let m = Memtable::new();
    for k in [b"a" as &[u8], b"b", b"c", b"d"] {
        m.put(k.to_vec(), k.to_vec());
    }
    let got: Vec<_> = m.range(b"b", Some(b"d")).into_iter().map(|(k, _)| k).collect();
    assert_eq!(got, vec![b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn range_with_no_end_runs_to_the_last_key() {
    let m = Memtable::new();
    for k in [b"a" as &[u8], b"b", b"c"] {
        m.put(k.to_vec(), k.to_vec());
    }
    let got: Vec<_> = m.range(b"b", None).into_iter().map(|(k, _)| k).collect();
    assert_eq!(got, vec![b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn clear_empties_map_and_resets_size() {
    let m = Memtable::new();
    m.put(b"a".to_vec(), b"1".to_vec());
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.approx_size(), 0);
    assert_eq!(m.get(b"a"), None);
}
