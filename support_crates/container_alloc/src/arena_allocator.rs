use crate::page_source::{region_layout, PageSource, RawRegion, SystemPages};
use crate::traits::{AllocError, ElementAllocator, Rebind};
use core::cell::Cell;
use core::marker::PhantomData;
use core::mem;
use core::ptr::NonNull;

/// Configuration of an [`ArenaAllocator`]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ArenaConfig {
    /// Number of elements the arena must at least be able to hold
    pub min_capacity: usize,
}

/// An arena allocator implementation
///
/// The arena owns one continuous region of backing memory which is large enough to hold at least `min_capacity`
/// elements of type `T`.
/// Since the region is rounded up to whole pages it usually holds more than that.
/// Allocations are carved from the region by bumping a marker forward:
///
/// ```text
///   ┌──────────────────── region ──────────────────────────┐
///   │                                                      │
/// [ T ,  T ,  T ,  T , ___, ___, ___, ___, ___, ___, ___, ___]
///                      ^
///         used ────────┘
/// ```
///
/// Individual deallocations are ignored.
/// Memory only becomes available again when the whole arena is [`reset`](ArenaAllocator::reset) and is given back
/// to the [`PageSource`] when the arena is dropped.
pub struct ArenaAllocator<T, S: PageSource = SystemPages> {
    /// The backing memory
    region: RawRegion,
    /// Number of elements that fit into the region
    arena_size: usize,
    min_capacity: usize,
    /// Number of elements handed out since the last reset
    used: Cell<usize>,
    source: S,
    _phantom_data: PhantomData<T>,
}

impl<T> ArenaAllocator<T> {
    /// Create an arena that can hold at least `min_capacity` elements and takes its memory from the global heap.
    pub fn new(min_capacity: usize) -> Result<Self, AllocError> {
        Self::with_source(min_capacity, SystemPages)
    }
}

impl<T, S: PageSource> ArenaAllocator<T, S> {
    /// Create an arena that can hold at least `min_capacity` elements and takes its memory from `source`.
    ///
    /// A `min_capacity` of zero is treated as one.
    ///
    /// # Panics
    /// Zero-sized element types are not supported.
    pub fn with_source(min_capacity: usize, source: S) -> Result<Self, AllocError> {
        assert!(
            mem::size_of::<T>() > 0,
            "arena allocators do not support zero-sized types"
        );

        let bytes = min_capacity
            .max(1)
            .checked_mul(mem::size_of::<T>())
            .ok_or(AllocError::OutOfMemory)?;
        let layout = region_layout(&source, bytes, mem::align_of::<T>())?;
        let region = source.allocate_raw(layout)?;
        let arena_size = region.bytes() / mem::size_of::<T>();

        log::debug!(
            "created arena for {} elements (requested {}) at {:p}",
            arena_size,
            min_capacity,
            region.start
        );
        Ok(Self {
            region,
            arena_size,
            min_capacity,
            used: Cell::new(0),
            source,
            _phantom_data: PhantomData,
        })
    }

    /// Create an arena from an explicit configuration.
    pub fn with_config(config: ArenaConfig, source: S) -> Result<Self, AllocError> {
        Self::with_source(config.min_capacity, source)
    }

    /// Create an independent arena with the same configuration and a freshly acquired region.
    pub fn try_clone(&self) -> Result<Self, AllocError>
    where
        S: Clone,
    {
        Self::with_config(self.config(), self.source.clone())
    }

    /// Make the whole region available for allocations again.
    ///
    /// All previously handed out pointers must no longer be used.
    /// The region itself is retained.
    pub fn reset(&mut self) {
        log::trace!("resetting arena with {} used elements", self.used.get());
        self.used.set(0);
    }

    /// How many elements fit into the arena in total
    pub fn capacity(&self) -> usize {
        self.arena_size
    }

    /// How many elements have been handed out since the last reset
    pub fn used(&self) -> usize {
        self.used.get()
    }

    pub fn min_capacity(&self) -> usize {
        self.min_capacity
    }

    pub fn config(&self) -> ArenaConfig {
        ArenaConfig {
            min_capacity: self.min_capacity,
        }
    }

    /// The page source from which the region was acquired
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<T, S: PageSource> ElementAllocator for ArenaAllocator<T, S> {
    type Element = T;

    fn allocate(&self, count: usize) -> Result<NonNull<T>, AllocError> {
        let used = self.used.get();

        // check that there even is enough space to allocate the requested amount
        let new_used = used
            .checked_add(count)
            .filter(|&new_used| new_used <= self.arena_size)
            .ok_or(AllocError::OutOfMemory)?;
        self.used.set(new_used);

        let ptr = unsafe { NonNull::new_unchecked(self.region.start.cast::<T>().as_ptr().add(used)) };
        log::trace!("allocated {} elements at {:p}", count, ptr);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        debug_assert!(
            self.region.contains(ptr.as_ptr().cast()) || count == 0,
            "deallocate was called with a pointer that does not point inside the arena"
        );
    }
}

impl<T, U, S: PageSource + Clone> Rebind<U> for ArenaAllocator<T, S> {
    type Rebound = ArenaAllocator<U, S>;

    fn rebind(&self) -> Result<Self::Rebound, AllocError> {
        ArenaAllocator::with_config(self.config(), self.source.clone())
    }
}

impl<T, S: PageSource> Drop for ArenaAllocator<T, S> {
    fn drop(&mut self) {
        unsafe { self.source.deallocate_raw(self.region) }
    }
}

impl<T, S: PageSource + core::fmt::Debug> core::fmt::Debug for ArenaAllocator<T, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("region", &self.region)
            .field("capacity", &self.arena_size)
            .field("min_capacity", &self.min_capacity)
            .field("used", &self.used.get())
            .field("source", &self.source)
            .finish()
    }
}

// Safety: the region is exclusively owned by the arena so moving the arena moves the ownership of all its memory
unsafe impl<T: Send, S: PageSource + Send> Send for ArenaAllocator<T, S> {}
