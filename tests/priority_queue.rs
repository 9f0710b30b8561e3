use dagrun::engine::PriorityQueue;

#[test]
fn test_pops_highest_priority_first() {
    let mut queue = PriorityQueue::new();
    queue.push("low", -5);
    queue.push("high", 10);
    queue.push("mid", 0);

    assert_eq!(queue.len(), 3);
    assert_eq!(queue.peek(), Some(&"high"));
    assert_eq!(queue.pop(), Some("high"));
    assert_eq!(queue.pop(), Some("mid"));
    assert_eq!(queue.pop(), Some("low"));
    assert_eq!(queue.pop(), None);
    assert!(queue.is_empty());
}

#[test]
fn test_equal_priorities_keep_insertion_order() {
    let mut queue = PriorityQueue::new();
    for i in 0..50 {
        queue.push(i, 1);
    }
    queue.push(100, 2);

    assert_eq!(queue.pop(), Some(100));
    let rest: Vec<i32> = std::iter::from_fn(|| queue.pop()).collect();
    assert_eq!(rest, (0..50).collect::<Vec<_>>());
}

#[test]
fn test_interleaved_push_and_pop_stay_stable() {
    let mut queue = PriorityQueue::new();
    queue.push("a", 0);
    queue.push("b", 0);
    assert_eq!(queue.pop(), Some("a"));
    queue.push("c", 0);
    queue.push("d", 1);
    assert_eq!(queue.drain(), vec!["d", "b", "c"]);
    assert!(queue.is_empty());
}

#[test]
fn test_extend_with_priorities() {
    let mut queue = PriorityQueue::default();
    queue.extend([("x", 1), ("y", 3), ("z", 1)]);
    assert_eq!(queue.drain(), vec!["y", "x", "z"]);
}
