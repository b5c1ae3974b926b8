use bytemuck::Pod;

/// Growable array with a hard element ceiling and a write cursor.
///
/// Clearing only resets the cursor; storage is kept for the next tick.
/// Growth doubles the required length, capped at the ceiling.
#[derive(Debug, Clone)]
pub struct BoundedArray<T: Pod> {
    data: Vec<T>,
    len: usize,
    ceiling: usize,
}

impl<T: Pod> BoundedArray<T> {
    pub fn new(initial_len: usize, ceiling: usize) -> Self {
        Self {
            data: vec![T::zeroed(); initial_len.min(ceiling)],
            len: 0,
            ceiling,
        }
    }

    /// Whether `n` more elements fit under the ceiling.
    pub fn fits(&self, n: usize) -> bool {
        self.len
            .checked_add(n)
            .is_some_and(|end| end <= self.ceiling)
    }

    fn grow_for(&mut self, n: usize) {
        let required = self.len + n;
        if required > self.data.len() {
            let new_len = required.saturating_mul(2).min(self.ceiling);
            self.data.resize(new_len, T::zeroed());
        }
    }

    /// Append a slice. Returns false, touching nothing, if it does not fit.
    pub fn extend_from_slice(&mut self, items: &[T]) -> bool {
        if !self.fits(items.len()) {
            return false;
        }
        self.grow_for(items.len());
        self.data[self.len..self.len + items.len()].copy_from_slice(items);
        self.len += items.len();
        true
    }

    /// Append `n` elements produced by `items`.
    pub fn extend_exact(&mut self, n: usize, items: impl IntoIterator<Item = T>) -> bool {
        if !self.fits(n) {
            return false;
        }
        self.grow_for(n);
        let start = self.len;
        let mut written = 0;
        for (slot, item) in self.data[start..start + n].iter_mut().zip(items) {
            *slot = item;
            written += 1;
        }
        debug_assert_eq!(written, n, "iterator shorter than declared length");
        self.len += written;
        true
    }

    pub fn push(&mut self, item: T) -> bool {
        self.extend_from_slice(std::slice::from_ref(&item))
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated length of the backing storage.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// The written prefix.
    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len]
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_doubles_required_length() {
        let mut a = BoundedArray::<u32>::new(4, 1000);
        assert!(a.extend_from_slice(&[1, 2, 3, 4]));
        assert_eq!(a.capacity(), 4);
        assert!(a.push(5));
        assert_eq!(a.capacity(), 10);
        assert_eq!(a.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn growth_is_capped_at_ceiling() {
        let mut a = BoundedArray::<u32>::new(2, 6);
        assert!(a.extend_from_slice(&[0; 4]));
        assert_eq!(a.capacity(), 6);
        assert!(a.extend_from_slice(&[0; 2]));
        assert_eq!(a.len(), 6);
    }

    #[test]
    fn rejection_leaves_array_untouched() {
        let mut a = BoundedArray::<u32>::new(2, 3);
        assert!(a.extend_from_slice(&[7, 8]));
        assert!(!a.extend_from_slice(&[9, 9]));
        assert_eq!(a.as_slice(), &[7, 8]);
        assert_eq!(a.capacity(), 2);
    }

    #[test]
    fn clear_keeps_storage() {
        let mut a = BoundedArray::<u32>::new(1, 100);
        a.extend_exact(10, 0..10);
        let cap = a.capacity();
        a.clear();
        assert!(a.is_empty());
        assert_eq!(a.capacity(), cap);
        assert!(a.as_bytes().is_empty());
    }

    #[test]
    fn bytes_cover_written_prefix_only() {
        let mut a = BoundedArray::<u32>::new(32, 100);
        a.extend_exact(3, [1, 2, 3]);
        assert_eq!(a.as_bytes().len(), 12);
    }

    #[test]
    fn initial_len_never_exceeds_ceiling() {
        let a = BoundedArray::<u32>::new(32, 8);
        assert_eq!(a.capacity(), 8);
        assert!(!a.fits(9));
        assert!(a.fits(8));
    }
}
