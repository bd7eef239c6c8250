use crate::color::space::Rgb;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileKey {
    pub hash: u64,
    pub max_side: u32,
}

impl ProfileKey {
    pub fn for_bytes(bytes: &[u8], max_side: u32) -> Self {
        Self { hash: hash_bytes(bytes), max_side }
    }
}

/// Bounded memo of computed profiles, evicting least recently used.
#[derive(Debug, Default)]
pub struct ProfileCache {
    cap: usize,
    order: VecDeque<ProfileKey>,
    map: HashMap<ProfileKey, Rgb>,
}

impl ProfileCache {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            order: VecDeque::new(),
            map: HashMap::new(),
        }
    }

    pub fn get(&mut self, key: ProfileKey) -> Option<Rgb> {
        let val = *self.map.get(&key)?;
        self.touch(key);
        Some(val)
    }

    pub fn put(&mut self, key: ProfileKey, val: Rgb) {
        if self.map.insert(key, val).is_some() {
            self.touch(key);
            return;
        }
        self.order.push_back(key);

        while self.order.len() > self.cap {
            if let Some(old) = self.order.pop_front() {
                self.map.remove(&old);
            }
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.map.clear();
    }

    fn touch(&mut self, key: ProfileKey) {
        if let Some(pos) = self.order.iter().position(|k| *k == key) {
            self.order.remove(pos);
            self.order.push_back(key);
        }
    }
}

fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut h = DefaultHasher::new();
    bytes.hash(&mut h);
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = ProfileCache::new(2);
        let a = ProfileKey::for_bytes(b"a", 200);
        let b = ProfileKey::for_bytes(b"b", 200);
        let c = ProfileKey::for_bytes(b"c", 200);
        cache.put(a, Rgb::from_u8(1, 1, 1));
        cache.put(b, Rgb::from_u8(2, 2, 2));
        assert!(cache.get(a).is_some());
        cache.put(c, Rgb::from_u8(3, 3, 3));

        assert!(cache.get(b).is_none());
        assert_eq!(cache.get(a), Some(Rgb::from_u8(1, 1, 1)));
        assert_eq!(cache.get(c), Some(Rgb::from_u8(3, 3, 3)));
    }

    #[test]
    fn key_depends_on_size() {
        assert_ne!(ProfileKey::for_bytes(b"x", 100), ProfileKey::for_bytes(b"x", 200));
        assert_eq!(ProfileKey::for_bytes(b"x", 200), ProfileKey::for_bytes(b"x", 200));
    }
}
