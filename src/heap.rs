//! Addressable Heap
//!
//! A min-heap keyed by [`Weight`] that supports removing arbitrary items, which is what the alternating trees
//! need to reclassify edges and minus blossoms whenever a label changes.
//!

use super::util::*;
use crate::derivative::Derivative;
use crate::ordered_float::OrderedFloat;
use crate::priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::hash::Hash;

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct AddressableHeap<I: Hash + Eq + Copy> {
    /// the underlying queue is a max-heap, hence the reversed key
    #[derivative(Debug="ignore")]
    queue: PriorityQueue<I, Reverse<OrderedFloat<Weight>>>,
}

impl<I: Hash + Eq + Copy> Default for AddressableHeap<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Hash + Eq + Copy> AddressableHeap<I> {

    pub fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn key_of(&self, item: &I) -> Option<Weight> {
        self.queue.get_priority(item).map(|Reverse(key)| key.into_inner())
    }

    /// an item lives in at most one position of one heap at a time
    pub fn insert(&mut self, item: I, key: Weight) {
        let previous = self.queue.push(item, Reverse(OrderedFloat(key)));
        assert!(previous.is_none(), "item inserted twice into the same heap");
    }

    pub fn remove(&mut self, item: &I) -> Option<Weight> {
        self.queue.remove(item).map(|(_, Reverse(key))| key.into_inner())
    }

    pub fn find_min(&self) -> Option<(I, Weight)> {
        self.queue.peek().map(|(&item, Reverse(key))| (item, key.into_inner()))
    }

    pub fn min_key(&self) -> Option<Weight> {
        self.find_min().map(|(_, key)| key)
    }

    /// empties `other` into this heap and returns the moved items, so that the caller can update their locations
    pub fn meld(&mut self, other: &mut Self) -> Vec<I> {
        let mut moved = Vec::with_capacity(other.len());
        for (item, key) in std::mem::take(&mut other.queue).into_iter() {
            let previous = self.queue.push(item, key);
            assert!(previous.is_none(), "melded heaps must be disjoint");
            moved.push(item);
        }
        moved
    }

    /// removes every item, returning them in unspecified order
    pub fn drain(&mut self) -> Vec<I> {
        std::mem::take(&mut self.queue).into_iter().map(|(item, _)| item).collect()
    }

    pub fn items(&self) -> impl Iterator<Item = (I, Weight)> + '_ {
        self.queue.iter().map(|(&item, Reverse(key))| (item, key.into_inner()))
    }

}
