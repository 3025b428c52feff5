use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn replay_recovers_puts_and_deletes_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    let mut writer = WalWriter::create(&path, true).unwrap();

    writer
        .append(&WalEntry::Put {
            key: b"a".to_vec(),
            value: b"1".to_vec(),
        })
        .unwrap();
    writer
        .append(&WalEntry::Put {
            key: b"b".to_vec(),
            value: b"2".to_vec(),
        })
        .unwrap();
    writer.append(&WalEntry::Delete { key: b"a".to_vec() }).unwrap();

    let mut seen = Vec::new();
    replay(&path, |entry| seen.push(entry)).unwrap();

    assert_eq!(
        seen,
        vec![
            WalEntry::Put {
                key: b"a".to_vec(),
                value: b"1".to_vec()
            },
            WalEntry::Put {
                key: b"b".to_vec(),
                value: b"2".to_vec()
            },
            WalEntry::Delete { key: b"a".to_vec() },
        ]
    );
}

#[test]
fn replay_of_missing_file_is_a_no_op() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.log");
    let mut seen = Vec::new();
    replay(&path, |entry| seen.push(entry)).unwrap();
    assert!(seen.is_empty());
}

#[test]
fn replay_stops_cleanly_on_truncated_final_frame() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    let mut writer = WalWriter::create(&path, true).unwrap();
    writer
        .append(&WalEntry::Put {
            key: b"a".to_vec(),
            value: b"1".to_vec(),
        })
        .unwrap();
    writer
        .append(&WalEntry::Put {
            key: b"b".to_vec(),
            value: b"22".to_vec(),
        })
        .unwrap();
    drop(writer);

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 1]).unwrap();

    let mut seen = Vec::new();
    replay(&path, |entry| seen.push(entry)).unwrap();
    assert_eq!(
        seen,
        vec![WalEntry::Put {
            key: b"a".to_vec(),
            value: b"1".to_vec()
        }]
    );
}

#[test]
fn replay_stops_cleanly_on_crc_mismatch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    let mut writer = WalWriter::create(&path, true).unwrap();
    writer
        .append(&WalEntry::Put {
            key: b"a".to_vec(),
            value: b"1".to_vec(),
        })
        .unwrap();
    writer
        .append(&WalEntry::Put {
            key: b"b".to_vec(),
            value: b"2".to_vec(),
        })
        .unwrap();
    drop(writer);

    let mut bytes = fs::read(&path).unwrap();
    let first_len = WalEntry::Put {
        key: b"a".to_vec(),
        value: b"1".to_vec(),
    }
    .encode()
    .len();
    // flip a byte inside the second frame's key, after the first frame's header
    let corrupt_at = first_len + HEADER_LEN;
    bytes[corrupt_at] ^= 0xff;
    fs::write(&path, &bytes).unwrap();

    let mut seen = Vec::new();
    replay(&path, |entry| seen.push(entry)).unwrap();
    assert_eq!(
        seen,
        vec![WalEntry::Put {
            key: b"a".to_vec(),
            value: b"1".to_vec()
        }]
    );
}

#[test]
fn replay_stops_cleanly_on_wrong_magic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    fs::write(&path, [0u8, 1, 2, 3, 4, 5, 6, 7]).unwrap();

    let mut seen: Vec<WalEntry> = Vec::new();
    replay(&path, |entry| seen.push(entry)).unwrap();
    assert!(seen.is_empty());
}

#[test]
fn rotate_archives_old_file_and_starts_a_fresh_one() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wal.log");
    let mut writer = WalWriter::create(&path, true).unwrap();
    writer
        .append(&WalEntry::Put {
            key: b"a".to_vec(),
            value: b"1".to_vec(),
        })
        .unwrap();

    let archived = writer.rotate(42).unwrap();
    assert!(archived.exists());
    assert_eq!(archived, dir.path().join("wal-42.log"));

    writer
        .append(&WalEntry::Put {
            key: b"b".to_vec(),
            value: b"2".to_vec(),
        })
        .unwrap();

    let mut from_active = Vec::new();
    replay(&path, |entry| from_active.push(entry)).unwrap();
    assert_eq!(
        from_active,
        vec![WalEntry::Put {
            key: b"b".to_vec(),
            value: b"2".to_vec()
        }]
    );

    let mut from_archived = Vec::new();
    replay(&archived, |entry| from_archived.push(entry)).unwrap();
    assert_eq!(
        from_archived,
        vec![WalEntry::Put {
            key: b"a".to_vec(),
            value: b"1".to_vec()
        }]
    );
}

#[test]
fn delete_entries_carry_no_value_bytes() {
    let entry = WalEntry::Delete { key: b"k".to_vec() };
    let buf = entry.encode();
    assert_eq!(buf.len(), HEADER_LEN + 1);
}
