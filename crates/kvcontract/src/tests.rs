use super::*;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A trivial in-memory stand-in used only to check the trait's shape is
/// usable — object-safe, `Send + Sync`, callable through `&self`.
struct MemoryEngine {
    map: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl KvEngine for MemoryEngine {
    fn start(&self) -> Result<(), KvError> {
        Ok(())
    }

    fn close(&self) -> Result<(), KvError> {
        Ok(())
    }

    fn put(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), KvError> {
        self.map.lock().unwrap().insert(key, value);
        Ok(())
    }

    fn batch_put(&self, items: Vec<(Vec<u8>, Vec<u8>)>) -> Result<usize, KvError> {
        let mut map = self.map.lock().unwrap();
        let count = items.len();
        for (k, v) in items {
            map.insert(k, v);
        }
        Ok(count)
    }

    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    fn read_range(&self, start: &[u8], end: &[u8], limit: usize) -> Result<Vec<(Vec<u8>, Vec<u8>)>, KvError> {
        Ok(self
            .map
            .lock()
            .unwrap()
            .range(start.to_vec()..=end.to_vec())
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn delete(&self, key: &[u8]) -> Result<(), KvError> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }

    fn compact(&self) -> Result<u64, KvError> {
        Ok(0)
    }
}

#[test]
fn trait_is_object_safe_and_usable_through_a_dyn_reference() {
    let engine: Box<dyn KvEngine> = Box::new(MemoryEngine {
        map: Mutex::new(BTreeMap::new()),
    });
    engine.start().unwrap();
    engine.put(b"k".to_vec(), b"v".to_vec()).unwrap();
    assert_eq!(engine.read(b"k").unwrap(), Some(b"v".to_vec()));
    assert_eq!(engine.batch_put(vec![]).unwrap(), 0);
    engine.delete(b"k".to_vec().as_slice()).unwrap();
    assert_eq!(engine.read(b"k").unwrap(), None);
    assert_eq!(engine.compact().unwrap(), 0);
}

fn _assert_send_sync<T: Send + Sync>() {}
fn _trait_bounds_hold() {
    _assert_send_sync::<MemoryEngine>();
}
