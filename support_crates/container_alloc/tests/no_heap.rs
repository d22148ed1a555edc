//! The fixed buffer allocator must work without any dynamic memory.
//!
//! This test binary installs a global allocator that counts the heap allocations of the current thread.

use container_alloc::{AllocError, Box, ElementAllocator, FixedBufferAllocator, SlabAllocator};
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

struct CountingHeap;

thread_local! {
    static HEAP_ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingHeap {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = HEAP_ALLOCATIONS.try_with(|count| count.set(count.get() + 1));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: CountingHeap = CountingHeap;

fn heap_allocations() -> usize {
    HEAP_ALLOCATIONS.with(Cell::get)
}

#[test]
fn fixed_buffer_does_not_use_the_heap() {
    let before = heap_allocations();

    let mut alloc = FixedBufferAllocator::<u64, 64>::new();
    {
        let slice = Box::from_fn(32, &alloc, |i| i as u64).unwrap();
        let single = Box::new(7, &alloc).unwrap();
        assert_eq!(slice[31] + *single, 38);
    }
    assert_eq!(alloc.allocate(32), Err(AllocError::OutOfMemory));
    alloc.reset();
    assert!(alloc.allocate(64).is_ok());

    assert_eq!(heap_allocations(), before);
}

#[test]
fn slab_uses_the_heap_only_for_caches() {
    let slab = SlabAllocator::<u64>::new(10).unwrap();
    let before = heap_allocations();

    let first = slab.allocate_one().unwrap();
    assert_eq!(heap_allocations(), before + 1);
    let second = slab.allocate_one().unwrap();
    assert_eq!(heap_allocations(), before + 1);

    unsafe {
        slab.deallocate_one(first);
        slab.deallocate_one(second);
    }
}
