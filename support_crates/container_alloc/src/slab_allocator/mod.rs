//! Implementation of the slab allocator.
//!
//! The main type is the [`SlabAllocator`] which hands out storage for exactly one object per allocation.
//! Its memory is organized in *caches*, page-sized regions that are subdivided into object-sized *slabs*.
//! Every cache keeps its free slabs in an intrusive free list and counts how many of its slabs are in use.
//!
//! A cache goes through the following states:
//!
//! ```text
//!  Growing ──► Active ◄──► Draining ──► Freed
//! ```
//!
//! It is created (*growing*) when an allocation finds no free slab in any existing cache, stays *active* while
//! slabs are taken from and returned to it and is *freed*, i.e. its region is returned to the [`PageSource`], as soon
//! as its last slab is deallocated.
//!
//! # Example
//!
//! ```rust
//! use container_alloc::{ElementAllocator, SlabAllocator};
//!
//! let allocator = SlabAllocator::<u64>::new(10).unwrap();
//! let a = allocator.allocate_one().unwrap();
//! let b = allocator.allocate_one().unwrap();
//! assert_ne!(a, b);
//!
//! // only single objects can be allocated
//! assert!(allocator.allocate(2).is_err());
//!
//! unsafe {
//!     allocator.deallocate_one(a);
//!     allocator.deallocate_one(b);
//! }
//! assert_eq!(allocator.cache_count(), 0);
//! ```
mod cache;


use crate::page_source::{region_layout, PageSource, SystemPages};
use crate::traits::{AllocError, ElementAllocator, Rebind};
use cache::{Slab, SlabCache};
use core::alloc::Layout;
use core::cell::Cell;
use core::marker::PhantomData;
use core::ptr::NonNull;

/// Configuration of a [`SlabAllocator`]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SlabConfig {
    /// Number of objects every cache must at least be able to hold
    pub min_cache_size: usize,
}

/// An allocator for single objects of type `T` which supports deallocation in any order.
///
/// Caches are acquired lazily from the [`PageSource`] and released as soon as they become empty again.
pub struct SlabAllocator<T, S: PageSource = SystemPages> {
    min_cache_size: usize,
    /// Layout of the region backing one cache
    map_layout: Layout,
    /// Number of slabs per cache
    cache_size: usize,
    /// Offset of the first slab from the start of a cache's region
    slabs_offset: usize,
    /// Most recently created cache
    cache_list: Cell<Option<NonNull<SlabCache<T>>>>,
    /// Number of slabs currently handed out over all caches
    allocated_slabs: Cell<usize>,
    source: S,
    _phantom_data: PhantomData<T>,
}

impl<T> SlabAllocator<T> {
    /// Create a slab allocator whose caches hold at least `min_cache_size` objects and which takes its memory from
    /// the global heap.
    pub fn new(min_cache_size: usize) -> Result<Self, AllocError> {
        Self::with_source(min_cache_size, SystemPages)
    }
}

impl<T, S: PageSource> SlabAllocator<T, S> {
    /// Create a slab allocator whose caches hold at least `min_cache_size` objects and which takes its memory from
    /// `source`.
    ///
    /// No memory is acquired until the first allocation.
    /// A `min_cache_size` of zero is treated as one.
    pub fn with_source(min_cache_size: usize, source: S) -> Result<Self, AllocError> {
        let slab = Layout::new::<Slab<T>>();
        let (header, slabs_offset) = Layout::new::<SlabCache<T>>()
            .extend(slab)
            .map_err(|_| AllocError::OutOfMemory)?;

        let bytes = slab
            .size()
            .checked_mul(min_cache_size.max(1))
            .and_then(|slabs| slabs.checked_add(slabs_offset))
            .ok_or(AllocError::OutOfMemory)?;
        let map_layout = region_layout(&source, bytes, header.align())?;
        let cache_size = (map_layout.size() - slabs_offset) / slab.size();

        log::debug!(
            "slab allocator with {} slabs of {} bytes per cache ({} bytes)",
            cache_size,
            slab.size(),
            map_layout.size()
        );
        Ok(Self {
            min_cache_size,
            map_layout,
            cache_size,
            slabs_offset,
            cache_list: Cell::new(None),
            allocated_slabs: Cell::new(0),
            source,
            _phantom_data: PhantomData,
        })
    }

    /// Create a slab allocator from an explicit configuration.
    pub fn with_config(config: SlabConfig, source: S) -> Result<Self, AllocError> {
        Self::with_source(config.min_cache_size, source)
    }

    /// Allocate storage for one object.
    ///
    /// The most recently created cache that still has a free slab is used.
    /// If all caches are full, a new one is acquired from the page source.
    pub fn allocate_one(&self) -> Result<NonNull<T>, AllocError> {
        let mut cursor = self.cache_list.get();
        while let Some(mut cache) = cursor {
            let cache = unsafe { cache.as_mut() };
            if let Some(ptr) = unsafe { cache.pop() } {
                return Ok(self.handed_out(ptr));
            }
            cursor = cache.next;
        }

        let mut cache = self.allocate_cache()?;
        match unsafe { cache.as_mut().pop() } {
            Some(ptr) => Ok(self.handed_out(ptr)),
            None => unreachable!("freshly created cache has no free slabs"),
        }
    }

    fn handed_out(&self, ptr: NonNull<T>) -> NonNull<T> {
        self.allocated_slabs.set(self.allocated_slabs.get() + 1);
        log::trace!("allocated slab {:p}", ptr);
        ptr
    }

    /// Acquire a new cache and link it at the head of the cache list.
    fn allocate_cache(&self) -> Result<NonNull<SlabCache<T>>, AllocError> {
        let region = self.source.allocate_raw(self.map_layout)?;
        let cache = unsafe {
            SlabCache::init(
                region,
                self.slabs_offset,
                self.cache_size,
                self.cache_list.get(),
            )
        };
        self.cache_list.set(Some(cache));
        log::debug!(
            "created cache with {} slabs at {:p}",
            self.cache_size,
            region.start
        );
        Ok(cache)
    }

    /// Give the storage of one object back to the allocator.
    ///
    /// If this was the last allocated slab of its cache, the whole cache is returned to the page source.
    ///
    /// # Panics
    /// This function panics if `ptr` does not point into one of the allocator's caches or if its slab is already
    /// free.
    ///
    /// # Safety
    /// `ptr` must have been returned by [`allocate_one`](SlabAllocator::allocate_one) of this allocator and must no
    /// longer be used.
    pub unsafe fn deallocate_one(&self, ptr: NonNull<T>) {
        let mut prev: Option<NonNull<SlabCache<T>>> = None;
        let mut cursor = self.cache_list.get();
        while let Some(mut cache_ptr) = cursor {
            let cache = cache_ptr.as_mut();
            if !cache.owns(ptr.as_ptr().cast()) {
                prev = cursor;
                cursor = cache.next;
                continue;
            }

            cache.push(ptr, self.slabs_offset, self.slab_size());
            self.allocated_slabs.set(self.allocated_slabs.get() - 1);
            log::trace!("deallocated slab {:p}", ptr);

            if cache.used == 0 {
                // unlink the cache before its memory goes away
                match prev {
                    Some(mut prev) => prev.as_mut().next = cache.next,
                    None => self.cache_list.set(cache.next),
                }
                let region = cache.region;
                log::debug!("releasing empty cache at {:p}", region.start);
                self.source.deallocate_raw(region);
            }
            return;
        }

        panic!(
            "deallocate was called with a pointer {:p} that does not point inside the allocators caches",
            ptr
        );
    }

    fn slab_size(&self) -> usize {
        core::mem::size_of::<Slab<T>>()
    }

    pub fn min_cache_size(&self) -> usize {
        self.min_cache_size
    }

    /// Number of objects that fit into one cache
    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    /// Size in bytes of the region backing one cache
    pub fn map_size(&self) -> usize {
        self.map_layout.size()
    }

    /// Number of caches that currently exist
    pub fn cache_count(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.cache_list.get();
        while let Some(cache) = cursor {
            count += 1;
            cursor = unsafe { cache.as_ref().next };
        }
        count
    }

    /// Number of objects that are currently allocated
    pub fn allocated(&self) -> usize {
        self.allocated_slabs.get()
    }

    pub fn config(&self) -> SlabConfig {
        SlabConfig {
            min_cache_size: self.min_cache_size,
        }
    }

    /// The page source from which caches are acquired
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<T, S: PageSource> ElementAllocator for SlabAllocator<T, S> {
    type Element = T;

    /// Only single objects can be allocated; any other `count` fails with [`AllocError::OutOfMemory`].
    fn allocate(&self, count: usize) -> Result<NonNull<T>, AllocError> {
        if count != 1 {
            log::trace!("refusing to allocate {} contiguous slabs", count);
            return Err(AllocError::OutOfMemory);
        }
        self.allocate_one()
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>, count: usize) {
        if count == 1 {
            self.deallocate_one(ptr);
        } else {
            log::warn!(
                "ignoring deallocation of {} slabs at {:p} which can never have been allocated",
                count,
                ptr
            );
        }
    }
}

impl<T, U, S: PageSource + Clone> Rebind<U> for SlabAllocator<T, S> {
    type Rebound = SlabAllocator<U, S>;

    fn rebind(&self) -> Result<Self::Rebound, AllocError> {
        SlabAllocator::with_config(self.config(), self.source.clone())
    }
}

/// Clones have the same configuration but start without any caches.
impl<T, S: PageSource + Clone> Clone for SlabAllocator<T, S> {
    fn clone(&self) -> Self {
        Self {
            min_cache_size: self.min_cache_size,
            map_layout: self.map_layout,
            cache_size: self.cache_size,
            slabs_offset: self.slabs_offset,
            cache_list: Cell::new(None),
            allocated_slabs: Cell::new(0),
            source: self.source.clone(),
            _phantom_data: PhantomData,
        }
    }
}

impl<T, S: PageSource> Drop for SlabAllocator<T, S> {
    fn drop(&mut self) {
        if self.allocated_slabs.get() > 0 {
            log::warn!(
                "dropping slab allocator with {} objects still allocated",
                self.allocated_slabs.get()
            );
        }

        let mut cursor = self.cache_list.take();
        while let Some(cache) = cursor {
            unsafe {
                let SlabCache { next, region, .. } = *cache.as_ptr();
                cursor = next;
                self.source.deallocate_raw(region);
            }
        }
    }
}

impl<T, S: PageSource + core::fmt::Debug> core::fmt::Debug for SlabAllocator<T, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlabAllocator")
            .field("min_cache_size", &self.min_cache_size)
            .field("cache_size", &self.cache_size)
            .field("map_size", &self.map_size())
            .field("caches", &self.cache_count())
            .field("allocated", &self.allocated())
            .field("source", &self.source)
            .finish()
    }
}

// Safety: all caches are exclusively owned by the allocator so moving the allocator moves the ownership of all its
// memory
unsafe impl<T: Send, S: PageSource + Send> Send for SlabAllocator<T, S> {}
