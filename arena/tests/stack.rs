use {
    rig_arena::{Arena, ArenaAlloc, OutOfMemory, SyncArena, RIGHT_HEADER_SIZE},
    std::{ptr::NonNull, sync::Arc, thread},
};

#[test]
fn left_rollback_restores_available() {
    let mut arena = Arena::new("rollback", 4096).unwrap();

    arena.alloc_left(100).unwrap();
    let outer = arena.mark_left();
    let outer_available = arena.available();

    arena.alloc_left(17).unwrap();
    arena.alloc_left_aligned(33, 16).unwrap();
    let inner = arena.mark_left();
    let inner_available = arena.available();

    arena.alloc_left(500).unwrap();
    arena.alloc_left(1).unwrap();

    arena.free_left(inner);
    assert_eq!(arena.available(), inner_available);

    arena.free_left(outer);
    assert_eq!(arena.available(), outer_available);
}

#[test]
fn left_rollback_does_not_touch_right_side() {
    let mut arena = Arena::new("sides", 1024).unwrap();
    let mark = arena.mark_left();
    let right = arena.alloc_right(64).unwrap();
    arena.alloc_left(64).unwrap();
    arena.free_left(mark);
    assert_eq!(arena.available(), 1024 - 64 - RIGHT_HEADER_SIZE);
    unsafe { arena.free_right(right) };
    assert_eq!(arena.available(), 1024);
}

#[test]
#[should_panic]
fn rollback_above_top_panics() {
    let mut arena = Arena::new("bad mark", 64).unwrap();
    arena.alloc_left(8).unwrap();
    let mark = arena.mark_left();
    arena.clear_left();
    arena.free_left(mark);
}

#[test]
fn reverse_right_frees_reclaim_incrementally() {
    let arena = Arena::new("reverse", 4096).unwrap();
    let before = arena.available();

    let sizes = [8, 100, 3, 64, 17];
    let blocks = sizes
        .iter()
        .map(|&size| arena.alloc_right(size).unwrap())
        .collect::<Vec<_>>();

    let mut expected = arena.available();
    for (&size, &block) in sizes.iter().zip(&blocks).rev() {
        unsafe { arena.free_right(block) };
        expected += size + RIGHT_HEADER_SIZE;
        assert_eq!(arena.available(), expected);
    }
    assert_eq!(arena.available(), before);
}

#[test]
fn right_frees_in_any_order_reclaim_everything() {
    let orders: &[&[usize]] = &[
        &[0, 1, 2, 3],
        &[3, 2, 1, 0],
        &[1, 3, 0, 2],
        &[2, 0, 3, 1],
        &[0, 2, 1, 3],
    ];

    for order in orders {
        let arena = Arena::new("any order", 1024).unwrap();
        let before = arena.available();
        let blocks = [12, 40, 7, 29]
            .iter()
            .map(|&size| arena.alloc_right(size).unwrap())
            .collect::<Vec<NonNull<u8>>>();

        for &index in order.iter() {
            unsafe { arena.free_right(blocks[index]) };
        }
        assert_eq!(arena.available(), before, "order {:?}", order);
    }
}

#[test]
fn aligned_allocations_honor_alignment() {
    let arena = Arena::new("align", 1 << 16).unwrap();
    for &align in &[4, 8, 16] {
        for size in 1..40 {
            let left = arena.alloc_left_aligned(size, align).unwrap();
            let right = arena.alloc_right_aligned(size, align).unwrap();
            assert_eq!(left.as_ptr() as usize % align, 0);
            assert_eq!(right.as_ptr() as usize % align, 0);
        }
    }
}

#[test]
fn aligned_right_blocks_coalesce() {
    let arena = Arena::new("aligned right", 1024).unwrap();
    let before = arena.available();
    let a = arena.alloc_right_aligned(24, 16).unwrap();
    let b = arena.alloc_right_aligned(5, 8).unwrap();
    unsafe {
        arena.free_right_aligned(a);
        arena.free_right_aligned(b);
    }
    assert_eq!(arena.available(), before);
}

#[test]
fn aligned_left_free_releases_block() {
    let mut arena = Arena::new("aligned left", 256).unwrap();
    arena.alloc_left(3).unwrap();
    let before = arena.available();
    let ptr = arena.alloc_left_aligned(10, 8).unwrap();
    unsafe { arena.free_left_aligned(ptr) };
    assert_eq!(arena.available(), before);
}

#[test]
fn exhaustion_is_reported() {
    let arena = Arena::new("small", 64).unwrap();
    assert_eq!(arena.alloc_left(65), Err(OutOfMemory));
    assert_eq!(arena.alloc_right(64), Err(OutOfMemory));
    assert!(arena.alloc_slice_left_with(7, |_| 0u64).is_ok());
    assert_eq!(arena.alloc_left(1), Err(OutOfMemory));
}

#[test]
fn sync_arena_serves_several_threads() {
    let arena = Arc::new(SyncArena::new("shared", 1 << 16).unwrap());
    let before = arena.available();

    let workers = (0..4)
        .map(|worker| {
            let arena = arena.clone();
            thread::spawn(move || {
                for round in 0..50 {
                    let scratch = arena
                        .scratch(16 + round, |index| (worker, index))
                        .unwrap();
                    assert!(scratch
                        .iter()
                        .enumerate()
                        .all(|(index, &value)| value == (worker, index)));
                }
            })
        })
        .collect::<Vec<_>>();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(arena.available(), before);
}
