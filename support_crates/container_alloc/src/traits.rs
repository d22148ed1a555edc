use core::ptr::NonNull;
use thiserror_no_std::Error;

/// The error returned when an allocation fails
#[derive(Debug, Error, Eq, PartialEq, Copy, Clone)]
pub enum AllocError {
    #[error("the allocator has insufficient free memory to allocate the requested amount")]
    OutOfMemory,
}

/// An implementation of `ElementAllocator` hands out storage for values of one specific element type.
///
/// This is the capability set a container needs from its allocator: it asks for room for `count` consecutive
/// elements and gives that room back once it is done with it.
pub trait ElementAllocator {
    /// The type of values for which storage is handed out
    type Element;

    /// Attempt to allocate storage for `count` consecutive elements.
    ///
    /// The returned memory is uninitialized and suitably aligned for [`Element`](ElementAllocator::Element).
    fn allocate(&self, count: usize) -> Result<NonNull<Self::Element>, AllocError>;

    /// Give the storage for `count` elements starting at `ptr` back to the allocator.
    ///
    /// Depending on the allocation strategy this may not make the memory available again.
    ///
    /// # Safety
    /// The given storage must be *currently allocated* from this allocator.
    ///
    /// This means that:
    /// - it was previously returned by [`allocate`](ElementAllocator::allocate) with the same `count`
    /// - it has not yet been deallocated
    unsafe fn deallocate(&self, ptr: NonNull<Self::Element>, count: usize);
}

/// Construction of a sibling allocator that uses the same strategy and configuration but hands out storage for
/// another element type.
///
/// The sibling never shares backing memory with `self`.
pub trait Rebind<U>: ElementAllocator {
    type Rebound: ElementAllocator<Element = U>;

    fn rebind(&self) -> Result<Self::Rebound, AllocError>;
}

#[cfg(test)]
pub(crate) mod tests {
    extern crate std;

    use super::ElementAllocator;
    use core::ptr::NonNull;
    use std::vec::Vec;

    #[cfg(feature = "std")]
    #[test]
    fn alloc_error_converts_into_boxed_std_error() {
        use std::boxed::Box;
        use std::error::Error;
        use std::string::ToString;

        fn fails() -> Result<(), Box<dyn Error>> {
            let result: Result<(), super::AllocError> = Err(super::AllocError::OutOfMemory);
            result?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(err.to_string().contains("insufficient free memory"));
        assert!(err.source().is_none());
    }

    /// Allocate a single element, write to it and give it back.
    pub fn can_alloc_free_single<A: ElementAllocator>(alloc: &A, value: A::Element)
    where
        A::Element: Clone + PartialEq + core::fmt::Debug,
    {
        let ptr = alloc.allocate(1).unwrap();
        unsafe {
            ptr.as_ptr().write(value.clone());
            assert_eq!(*ptr.as_ptr(), value);
            alloc.deallocate(ptr, 1);
        }
    }

    /// Allocate `count` single elements one after another and return the pointers.
    pub fn can_alloc_count<A: ElementAllocator>(alloc: &A, count: usize) -> Vec<NonNull<A::Element>> {
        (0..count)
            .map(|i| {
                alloc
                    .allocate(1)
                    .unwrap_or_else(|e| panic!("allocation {i} of {count} failed: {e}"))
            })
            .collect()
    }

    /// Store every item in its own allocation and check that no allocation overwrote another one.
    pub fn allocs_dont_alias<A: ElementAllocator>(alloc: &A, items: &[A::Element]) -> Vec<NonNull<A::Element>>
    where
        A::Element: Clone + PartialEq + core::fmt::Debug,
    {
        let ptrs = can_alloc_count(alloc, items.len());
        for (ptr, item) in ptrs.iter().zip(items) {
            unsafe { ptr.as_ptr().write(item.clone()) };
        }
        for (ptr, item) in ptrs.iter().zip(items) {
            assert_eq!(unsafe { &*ptr.as_ptr() }, item);
        }
        ptrs
    }

    /// Assert that the given ranges of `count` elements are pairwise disjoint.
    pub fn assert_disjoint<T>(ranges: &[(NonNull<T>, usize)]) {
        let size = core::mem::size_of::<T>();
        for (i, (a, a_len)) in ranges.iter().enumerate() {
            for (b, b_len) in &ranges[i + 1..] {
                let a_start = a.as_ptr() as usize;
                let b_start = b.as_ptr() as usize;
                let a_end = a_start + a_len * size;
                let b_end = b_start + b_len * size;
                assert!(
                    a_end <= b_start || b_end <= a_start,
                    "allocations {:p} and {:p} overlap",
                    a.as_ptr(),
                    b.as_ptr()
                );
            }
        }
    }
}
