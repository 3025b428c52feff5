use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::Slot;

/// K-way merges already-sorted `sources` (each ascending by key, highest
/// priority first — typically the memtable, then tables newest to oldest)
/// into a single ascending sequence of live `(key, value)` pairs.
///
/// On a key present in more than one source, the source listed earliest
/// wins and every other source's entry for that key is discarded. A
/// tombstone winner is dropped rather than emitted. Stops once `limit`
/// entries have been emitted, if given.
pub fn k_way_merge(sources: Vec<Vec<(Vec<u8>, Slot)>>, limit: Option<usize>) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut cursors = vec![0usize; sources.len()];
    let mut heap = BinaryHeap::new();

    for (src_idx, source) in sources.iter().enumerate() {
        if let Some((key, _)) = source.first() {
            heap.push(Reverse((key.clone(), src_idx)));
        }
    }

    let mut out = Vec::new();

    while let Some(Reverse((key, winner_idx))) = heap.pop() {
        let winner_pos = cursors[winner_idx];
        let winner_value = sources[winner_idx][winner_pos].1.clone();
        advance(&sources, &mut cursors, &mut heap, winner_idx);

        // Discard every other source's entry for this same key.
        while let Some(&Reverse((ref next_key, _))) = heap.peek() {
            if next_key != &key {
                break;
            }
            let Reverse((_, idx)) = heap.pop().unwrap();
            advance(&sources, &mut cursors, &mut heap, idx);
        }

        if let Some(value) = winner_value {
            out.push((key, value));
            if let Some(limit) = limit {
                if out.len() >= limit {
                    break;
                }
            }
        }
    }

    out
}

fn advance(
    sources: &[Vec<(Vec<u8>, Slot)>],
    cursors: &mut [usize],
    heap: &mut BinaryHeap<Reverse<(Vec<u8>, usize)>>,
    src_idx: usize,
) {
    cursors[src_idx] += 1;
    if let Some((next_key, _)) = sources[src_idx].get(cursors[src_idx]) {
        heap.push(Reverse((next_key.clone(), src_idx)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_disjoint_sources_in_key_order() {
        let a = vec![(b"a".to_vec(), Some(b"1".to_vec())), (b"c".to_vec(), Some(b"3".to_vec()))];
        let b = vec![(b"b".to_vec(), Some(b"2".to_vec()))];
        let merged = k_way_merge(vec![a, b], None);
        assert_eq!(
            merged,
            vec![
                (b"a".to_vec(), b"1".to_vec()),
                (b"b".to_vec(), b"2".to_vec()),
                (b"c".to_vec(), b"3".to_vec()),
            ]
        );
    }

    #[test]
    fn earlier_source_wins_ties() {
        let newer = vec![(b"k".to_vec(), Some(b"new".to_vec()))];
        let older = vec![(b"k".to_vec(), Some(b"old".to_vec()))];
        let merged = k_way_merge(vec![newer, older], None);
        assert_eq!(merged, vec![(b"k".to_vec(), b"new".to_vec())]);
    }

    #[test]
    fn tombstone_winner_suppresses_older_value_and_emits_nothing() {
        let newer = vec![(b"k".to_vec(), None)];
        let older = vec![(b"k".to_vec(), Some(b"old".to_vec()))];
        let merged = k_way_merge(vec![newer, older], None);
        assert!(merged.is_empty());
    }

    #[test]
    fn limit_stops_early() {
        let a = vec![
            (b"a".to_vec(), Some(b"1".to_vec())),
            (b"b".to_vec(), Some(b"2".to_vec())),
            (b"c".to_vec(), Some(b"3".to_vec())),
        ];
        let merged = k_way_merge(vec![a], Some(2));
        assert_eq!(
            merged,
            vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())]
        );
    }
}
