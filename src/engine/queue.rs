// src/engine/queue.rs

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry ordered by priority (higher first), then by insertion
/// sequence (earlier first).
#[derive(Debug)]
struct Entry<T> {
    priority: i32,
    seq: u64,
    item: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Stable max-priority queue of ready tasks.
///
/// Semantics:
/// - `pop` returns the entry with the highest priority.
/// - Among equal priorities, entries come out in the order they were pushed.
/// - Push and pop are `O(log n)`.
#[derive(Debug)]
pub struct PriorityQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
}

impl<T> PriorityQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn push(&mut self, item: T, priority: i32) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            priority,
            seq,
            item,
        });
    }

    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|e| e.item)
    }

    pub fn peek(&self) -> Option<&T> {
        self.heap.peek().map(|e| &e.item)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Remove every entry, returned in pop order.
    pub fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.heap.len());
        while let Some(item) = self.pop() {
            items.push(item);
        }
        items
    }
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<(T, i32)> for PriorityQueue<T> {
    fn extend<I: IntoIterator<Item = (T, i32)>>(&mut self, iter: I) {
        for (item, priority) in iter {
            self.push(item, priority);
        }
    }
}
