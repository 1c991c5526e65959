//! Sample filter: circular buffer plus a rank-median.
//!
//! Both measurement channels use the same filter.  The "median" is the
//! element at sorted index `len / 2`, which for even-length windows is the
//! upper of the two middle values rather than their mean.

use std::collections::VecDeque;

/// Circular buffer whose capacity is chosen at construction.
///
/// Storage is allocated once, up front; once full, each insertion evicts
/// the oldest entry.
#[derive(Debug, Clone)]
pub struct CircularBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy> CircularBuffer<T> {
    /// Returns `None` when `capacity` is zero.
    pub fn new(capacity: usize) -> Option<Self> {
        (capacity > 0).then(|| Self::clamped(capacity))
    }

    /// Like [`new`](Self::new) but a zero capacity becomes 1.
    pub fn clamped(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: T) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(value);
    }

    /// Most recently inserted value.
    pub fn newest(&self) -> Option<T> {
        self.items.back().copied()
    }

    /// Contents ordered oldest → newest.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Copy + Ord> CircularBuffer<T> {
    /// Rank-median of the current contents, `None` while empty.
    pub fn median(&self) -> Option<T> {
        let (front, back) = self.items.as_slices();
        let mut sorted = Vec::with_capacity(self.items.len());
        sorted.extend_from_slice(front);
        sorted.extend_from_slice(back);
        median_in_place(&mut sorted)
    }
}

/// Element at sorted index `floor(len / 2)`.
pub fn rank_median<T: Copy + Ord>(values: &[T]) -> Option<T> {
    median_in_place(&mut values.to_vec())
}

fn median_in_place<T: Copy + Ord>(values: &mut [T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    Some(values[values.len() / 2])
}
