//! Min-heap over a dense index universe with O(log n) arbitrary-key update.
//!
//! Three arrays move in lockstep: `priorities` (by index), `heap`
//! (position -> index) and `positions` (index -> position). Every swap
//! updates both maps so that looking up an index's heap slot is O(1).
//! Ties between equal priorities are broken by heap shape only.

/// Indexed binary min-heap keyed by `0..capacity`.
///
/// Contract violations (inserting a present index, updating or removing an
/// absent one, dequeueing from an empty queue, indices out of range) panic.
#[derive(Debug, Clone)]
pub struct IndexedPriorityQueue<P> {
    priorities: Vec<Option<P>>,
    heap: Vec<usize>,
    positions: Vec<Option<usize>>,
}

impl<P: Ord + Copy> IndexedPriorityQueue<P> {
    /// Creates an empty queue accepting indices in `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            priorities: vec![None; capacity],
            heap: Vec::with_capacity(capacity),
            positions: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.positions.get(index).is_some_and(Option::is_some)
    }

    /// Current priority of `index`, or `None` when it is not queued.
    pub fn priority(&self, index: usize) -> Option<P> {
        self.priorities.get(index).copied().flatten()
    }

    /// Index and priority at the top of the heap.
    pub fn peek_min(&self) -> Option<(usize, P)> {
        let index = *self.heap.first()?;
        self.priority(index).map(|priority| (index, priority))
    }

    /// Adds `index` with `priority`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or already queued.
    pub fn insert(&mut self, index: usize, priority: P) {
        assert!(
            index < self.capacity(),
            "index {index} is outside the queue capacity {}",
            self.capacity()
        );
        assert!(
            self.positions[index].is_none(),
            "index {index} is already queued"
        );
        let position = self.heap.len();
        self.heap.push(index);
        self.positions[index] = Some(position);
        self.priorities[index] = Some(priority);
        self.sift_up(position);
    }

    /// Changes the priority of a queued index and restores heap order.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not queued.
    pub fn update(&mut self, index: usize, priority: P) {
        let position = self.position_of(index);
        let old = self.priorities[index];
        self.priorities[index] = Some(priority);
        match Some(priority).cmp(&old) {
            std::cmp::Ordering::Less => self.sift_up(position),
            std::cmp::Ordering::Greater => self.sift_down(position),
            std::cmp::Ordering::Equal => {}
        }
    }

    /// Inserts `index`, or updates it when already present.
    pub fn insert_or_update(&mut self, index: usize, priority: P) {
        if self.contains(index) {
            self.update(index, priority);
        } else {
            self.insert(index, priority);
        }
    }

    /// Removes an arbitrary queued index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not queued.
    pub fn remove(&mut self, index: usize) {
        let position = self.position_of(index);
        let last = self.heap.len() - 1;
        self.swap(position, last);
        self.heap.pop();
        self.positions[index] = None;
        self.priorities[index] = None;
        if position < self.heap.len() {
            // The element moved into the hole may belong above or below it.
            self.sift_down(position);
            self.sift_up(position);
        }
    }

    /// Removes and returns the index with the lowest priority.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty.
    pub fn dequeue_min(&mut self) -> usize {
        assert!(!self.heap.is_empty(), "dequeue from an empty queue");
        let index = self.heap[0];
        self.remove(index);
        index
    }

    /// Priority by index; `None` for indices not in the queue.
    pub fn priorities(&self) -> &[Option<P>] {
        &self.priorities
    }

    /// Heap layout: the index stored at each heap position.
    pub fn position_to_index(&self) -> &[usize] {
        &self.heap
    }

    /// Heap position of each index; `None` for indices not in the queue.
    pub fn index_to_position(&self) -> &[Option<usize>] {
        &self.positions
    }

    fn position_of(&self, index: usize) -> usize {
        match self.positions.get(index).copied().flatten() {
            Some(position) => position,
            None => panic!("index {index} is not queued"),
        }
    }

    #[inline]
    fn key(&self, position: usize) -> Option<P> {
        self.priorities[self.heap[position]]
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a]] = Some(a);
        self.positions[self.heap[b]] = Some(b);
    }

    fn sift_up(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / 2;
            if self.key(position) >= self.key(parent) {
                break;
            }
            self.swap(position, parent);
            position = parent;
        }
    }

    fn sift_down(&mut self, mut position: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * position + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let smallest = if right < len && self.key(right) < self.key(left) {
                right
            } else {
                left
            };
            if self.key(smallest) >= self.key(position) {
                break;
            }
            self.swap(position, smallest);
            position = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_consistent<P: Ord + Copy + std::fmt::Debug>(queue: &IndexedPriorityQueue<P>) {
        let heap = queue.position_to_index();
        for position in 1..heap.len() {
            let parent = (position - 1) / 2;
            assert!(
                queue.priority(heap[parent]) <= queue.priority(heap[position]),
                "heap order violated at position {position}"
            );
        }
        for (position, &index) in heap.iter().enumerate() {
            assert_eq!(queue.index_to_position()[index], Some(position));
            assert!(queue.priority(index).is_some());
        }
        let present = queue
            .index_to_position()
            .iter()
            .filter(|p| p.is_some())
            .count();
        assert_eq!(present, heap.len());
    }

    #[test]
    fn test_dequeue_in_priority_order() {
        let mut queue = IndexedPriorityQueue::new(8);
        queue.insert(0, 10);
        queue.insert(1, 4);
        queue.insert(2, 3);
        queue.insert(3, 7);
        queue.update(0, 2);
        assert_consistent(&queue);

        assert_eq!(queue.peek_min(), Some((0, 2)));
        let order: Vec<usize> = (0..4).map(|_| queue.dequeue_min()).collect();
        assert_eq!(order, vec![0, 2, 1, 3]);
        assert!(queue.is_empty());
        assert_eq!(queue.peek_min(), None);
    }

    #[test]
    fn test_update_moves_both_directions() {
        let mut queue = IndexedPriorityQueue::new(5);
        for index in 0..5 {
            queue.insert(index, index * 10);
        }
        queue.update(0, 100);
        assert_consistent(&queue);
        assert_eq!(queue.peek_min(), Some((1, 10)));

        queue.update(4, 0);
        assert_consistent(&queue);
        assert_eq!(queue.peek_min(), Some((4, 0)));
        assert_eq!(queue.priority(0), Some(100));
    }

    #[test]
    fn test_remove_arbitrary_and_reinsert() {
        let mut queue = IndexedPriorityQueue::new(6);
        for (index, priority) in [5, 1, 4, 2, 3, 0].into_iter().enumerate() {
            queue.insert(index, priority);
        }
        queue.remove(3);
        assert!(!queue.contains(3));
        assert_eq!(queue.priority(3), None);
        assert_consistent(&queue);

        queue.insert_or_update(3, 9);
        queue.insert_or_update(5, 8);
        assert_consistent(&queue);
        assert_eq!(queue.len(), 6);
        assert_eq!(queue.peek_min(), Some((1, 1)));
    }

    #[test]
    #[should_panic(expected = "already queued")]
    fn test_duplicate_insert_panics() {
        let mut queue = IndexedPriorityQueue::new(2);
        queue.insert(1, 1);
        queue.insert(1, 2);
    }

    #[test]
    #[should_panic(expected = "not queued")]
    fn test_update_absent_panics() {
        let mut queue: IndexedPriorityQueue<u32> = IndexedPriorityQueue::new(2);
        queue.update(0, 1);
    }

    #[test]
    #[should_panic(expected = "not queued")]
    fn test_remove_absent_panics() {
        let mut queue: IndexedPriorityQueue<u32> = IndexedPriorityQueue::new(2);
        queue.remove(1);
    }

    #[test]
    #[should_panic(expected = "empty queue")]
    fn test_dequeue_empty_panics() {
        let mut queue: IndexedPriorityQueue<u32> = IndexedPriorityQueue::new(2);
        queue.dequeue_min();
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(usize, u8),
        Update(usize, u8),
        Remove(usize),
        Dequeue,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..32, any::<u8>()).prop_map(|(i, p)| Op::Insert(i, p)),
            (0usize..32, any::<u8>()).prop_map(|(i, p)| Op::Update(i, p)),
            (0usize..32).prop_map(Op::Remove),
            Just(Op::Dequeue),
        ]
    }

    proptest! {
        #[test]
        fn heap_and_maps_stay_consistent(ops in proptest::collection::vec(arb_op(), 0..200)) {
            let mut queue = IndexedPriorityQueue::new(32);
            let mut model: Vec<Option<u8>> = vec![None; 32];
            for op in ops {
                match op {
                    Op::Insert(i, p) if model[i].is_none() => {
                        queue.insert(i, p);
                        model[i] = Some(p);
                    }
                    Op::Update(i, p) if model[i].is_some() => {
                        queue.update(i, p);
                        model[i] = Some(p);
                    }
                    Op::Remove(i) if model[i].is_some() => {
                        queue.remove(i);
                        model[i] = None;
                    }
                    Op::Dequeue if !queue.is_empty() => {
                        let min = model.iter().flatten().min().copied();
                        let index = queue.dequeue_min();
                        prop_assert_eq!(model[index], min);
                        model[index] = None;
                    }
                    _ => {}
                }
                assert_consistent(&queue);
                for (index, expected) in model.iter().enumerate() {
                    prop_assert_eq!(queue.priority(index), *expected);
                }
            }
        }
    }
}
