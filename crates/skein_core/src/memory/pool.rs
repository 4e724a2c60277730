//! # Object Pool
//!
//! Free-list pool for objects that are acquired on demand and handed back
//! in bulk when their owner is torn down.

/// Contract for pooled objects.
///
/// The pool calls [`Poolable::reset`] before an object re-enters the free
/// list. After a reset the object must hold no references to its previous
/// owner.
pub trait Poolable: Default {
    /// Clears all owner state.
    fn reset(&mut self);
}

/// A pool of reusable objects.
///
/// Unlike a slot allocator, the pool hands out owned values: the caller
/// keeps the object wherever it likes and returns it with
/// [`ObjectPool::release`]. Buffers inside returned objects keep their
/// capacity, so a warm pool stops allocating.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Use one pool per render pipe.
///
/// # Example
///
/// ```rust
/// use skein_core::{ObjectPool, Poolable};
///
/// #[derive(Default)]
/// struct Scratch { data: Vec<f32> }
///
/// impl Poolable for Scratch {
///     fn reset(&mut self) { self.data.clear(); }
/// }
///
/// let mut pool: ObjectPool<Scratch> = ObjectPool::with_capacity(4);
/// let mut scratch = pool.acquire();
/// scratch.data.push(1.0);
/// pool.release(scratch);
/// assert_eq!(pool.free_count(), 4);
/// ```
pub struct ObjectPool<T: Poolable> {
    /// Reset objects ready for reuse.
    free_list: Vec<T>,
    /// Number of objects currently handed out.
    outstanding: usize,
    /// Total objects ever constructed by this pool.
    created: usize,
}

impl<T: Poolable> ObjectPool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            free_list: Vec::new(),
            outstanding: 0,
            created: 0,
        }
    }

    /// Creates a pool pre-filled with `capacity` default objects.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let free_list: Vec<T> = (0..capacity).map(|_| T::default()).collect();
        Self {
            free_list,
            outstanding: 0,
            created: capacity,
        }
    }

    /// Returns the number of objects waiting on the free list.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Returns the number of objects currently handed out.
    #[inline]
    #[must_use]
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Returns the number of objects this pool has constructed.
    #[inline]
    #[must_use]
    pub const fn created(&self) -> usize {
        self.created
    }

    /// Takes an object from the pool, constructing one if the pool is dry.
    ///
    /// This is **O(1)** and allocation-free while the free list is non-empty.
    pub fn acquire(&mut self) -> T {
        self.outstanding += 1;
        if let Some(value) = self.free_list.pop() {
            return value;
        }
        self.created += 1;
        T::default()
    }

    /// Resets an object and puts it back on the free list.
    pub fn release(&mut self, mut value: T) {
        value.reset();
        self.outstanding = self.outstanding.saturating_sub(1);
        self.free_list.push(value);
    }

    /// Releases every object yielded by `values`.
    pub fn release_all<I: IntoIterator<Item = T>>(&mut self, values: I) {
        for value in values {
            self.release(value);
        }
    }
}

impl<T: Poolable> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Entry {
        owner: Option<u32>,
        data: Vec<u8>,
    }

    impl Poolable for Entry {
        fn reset(&mut self) {
            self.owner = None;
            self.data.clear();
        }
    }

    #[test]
    fn test_pool_acquire_release() {
        let mut pool: ObjectPool<Entry> = ObjectPool::new();

        let mut entry = pool.acquire();
        entry.owner = Some(7);
        assert_eq!(pool.outstanding(), 1);
        assert_eq!(pool.created(), 1);

        pool.release(entry);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn test_release_clears_owner() {
        let mut pool: ObjectPool<Entry> = ObjectPool::new();

        let mut entry = pool.acquire();
        entry.owner = Some(3);
        entry.data.extend_from_slice(&[1, 2, 3]);
        pool.release(entry);

        let reused = pool.acquire();
        assert!(reused.owner.is_none());
        assert!(reused.data.is_empty());
        assert!(reused.data.capacity() >= 3); // Buffer kept
        assert_eq!(pool.created(), 1);
    }

    #[test]
    fn test_prewarmed_pool_does_not_construct() {
        let mut pool: ObjectPool<Entry> = ObjectPool::with_capacity(2);

        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!(pool.created(), 2);

        pool.release_all([a, b]);
        assert_eq!(pool.free_count(), 2);
        assert_eq!(pool.outstanding(), 0);
    }
}
