use crate::traits::{AllocError, ElementAllocator, Rebind};
use core::cell::{Cell, UnsafeCell};
use core::mem::MaybeUninit;
use core::ptr::NonNull;

/// A bump allocator whose backing memory is a buffer of `N` elements embedded in the allocator itself.
///
/// It behaves exactly like an [`ArenaAllocator`](crate::ArenaAllocator) but never acquires or releases any memory
/// which makes it usable where dynamic memory is not available at all.
/// Placing it on the stack gives an allocator for stack memory.
///
/// # Usage Example
/// ```rust
/// use container_alloc::{ElementAllocator, FixedBufferAllocator};
///
/// let allocator = FixedBufferAllocator::<u32, 4>::new();
/// assert!(allocator.allocate(4).is_ok());
/// assert!(allocator.allocate(1).is_err());
/// ```
///
/// Because handed out pointers point into the allocator, moving the allocator while they are in use invalidates
/// them.
/// Handles that borrow the allocator (like [`Box`](crate::Box)) prevent that.
pub struct FixedBufferAllocator<T, const N: usize> {
    storage: UnsafeCell<[MaybeUninit<T>; N]>,
    used: Cell<usize>,
}

impl<T, const N: usize> FixedBufferAllocator<T, N> {
    pub const fn new() -> Self {
        Self {
            // Safety: an array of `MaybeUninit` does not require initialization
            storage: UnsafeCell::new(unsafe { MaybeUninit::uninit().assume_init() }),
            used: Cell::new(0),
        }
    }

    /// Make the whole buffer available for allocations again.
    pub fn reset(&mut self) {
        log::trace!("resetting fixed buffer with {} used elements", self.used.get());
        self.used.set(0);
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn used(&self) -> usize {
        self.used.get()
    }
}

impl<T, const N: usize> ElementAllocator for FixedBufferAllocator<T, N> {
    type Element = T;

    fn allocate(&self, count: usize) -> Result<NonNull<T>, AllocError> {
        let used = self.used.get();
        let new_used = used
            .checked_add(count)
            .filter(|&new_used| new_used <= N)
            .ok_or(AllocError::OutOfMemory)?;
        self.used.set(new_used);

        let ptr = unsafe {
            NonNull::new_unchecked(self.storage.get().cast::<MaybeUninit<T>>().add(used)).cast()
        };
        log::trace!("allocated {} of {} buffer elements at {:p}", count, N, ptr);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<T>, _count: usize) {}
}

impl<T, U, const N: usize> Rebind<U> for FixedBufferAllocator<T, N> {
    type Rebound = FixedBufferAllocator<U, N>;

    fn rebind(&self) -> Result<Self::Rebound, AllocError> {
        Ok(FixedBufferAllocator::new())
    }
}

impl<T, const N: usize> Default for FixedBufferAllocator<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones start out empty and share no storage with the allocator they were cloned from.
impl<T, const N: usize> Clone for FixedBufferAllocator<T, N> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T, const N: usize> core::fmt::Debug for FixedBufferAllocator<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FixedBufferAllocator")
            .field("capacity", &N)
            .field("used", &self.used.get())
            .finish()
    }
}
