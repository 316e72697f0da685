use {
    crate::error::OutOfMemory,
    parking_lot::Mutex,
    slab::Slab,
};

/// Key of a value stored in [`Pool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolKey(usize);

impl PoolKey {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Fixed-capacity pool of same-typed units.
/// Freed units are reused by later insertions.
#[derive(Debug)]
pub struct Pool<T> {
    name: Box<str>,
    capacity: usize,
    slab: Mutex<Slab<T>>,
}

impl<T> Pool<T> {
    #[tracing::instrument]
    pub fn new(name: &str, capacity: usize) -> Self {
        tracing::info!("Pool created");
        Pool {
            name: name.into(),
            capacity,
            slab: Mutex::new(Slab::with_capacity(capacity)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slab.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slab.lock().is_empty()
    }

    pub fn insert(&self, value: T) -> Result<PoolKey, OutOfMemory> {
        let mut slab = self.slab.lock();
        if slab.len() >= self.capacity {
            tracing::warn!(
                pool = %self.name,
                capacity = self.capacity,
                "Pool exhausted"
            );
            return Err(OutOfMemory);
        }
        Ok(PoolKey(slab.insert(value)))
    }

    pub fn remove(&self, key: PoolKey) -> Option<T> {
        let mut slab = self.slab.lock();
        if slab.contains(key.0) {
            Some(slab.remove(key.0))
        } else {
            None
        }
    }

    pub fn contains(&self, key: PoolKey) -> bool {
        self.slab.lock().contains(key.0)
    }

    /// Calls `f` with the value under `key`.
    /// The pool stays locked while `f` runs.
    pub fn with<R>(&self, key: PoolKey, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.slab.lock().get_mut(key.0).map(f)
    }

    pub fn for_each(&self, mut f: impl FnMut(PoolKey, &mut T)) {
        for (index, value) in self.slab.lock().iter_mut() {
            f(PoolKey(index), value);
        }
    }

    /// Keeps only values for which `f` returns `true`.
    pub fn retain(&self, mut f: impl FnMut(PoolKey, &mut T) -> bool) {
        self.slab.lock().retain(|index, value| f(PoolKey(index), value))
    }

    pub fn clear(&self) {
        self.slab.lock().clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_fails_when_full() {
        let pool = Pool::new("test", 2);
        pool.insert(1).unwrap();
        pool.insert(2).unwrap();
        assert_eq!(pool.insert(3), Err(OutOfMemory));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn removed_unit_is_reused() {
        let pool = Pool::new("test", 2);
        let a = pool.insert("a").unwrap();
        let _b = pool.insert("b").unwrap();
        assert_eq!(pool.remove(a), Some("a"));
        assert_eq!(pool.remove(a), None);
        let c = pool.insert("c").unwrap();
        assert_eq!(c, a);
        assert_eq!(pool.with(c, |value| *value), Some("c"));
    }

    #[test]
    fn retain_drops_rejected_values() {
        let pool = Pool::new("test", 8);
        for value in 0..8 {
            pool.insert(value).unwrap();
        }
        pool.retain(|_, value| *value % 2 == 0);
        let mut sum = 0;
        pool.for_each(|_, value| sum += *value);
        assert_eq!(sum, 0 + 2 + 4 + 6);
        pool.clear();
        assert!(pool.is_empty());
    }
}
