//! Acquisition of whole pages of backing memory.
//!
//! The arena and slab allocators never talk to the system directly. Instead they request regions from a
//! [`PageSource`] which rounds every request up to its allocation granule.

use crate::AllocError;
use core::alloc::Layout;
use core::ptr::NonNull;

/// Granule and alignment of regions handed out by [`SystemPages`]
pub const PAGESIZE: usize = 4096;

/// A region of memory obtained from a [`PageSource`]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct RawRegion {
    pub start: NonNull<u8>,
    pub layout: Layout,
}

impl RawRegion {
    /// Size of the region in bytes
    pub fn bytes(&self) -> usize {
        self.layout.size()
    }

    /// Whether `ptr` points into this region
    pub fn contains(&self, ptr: *const u8) -> bool {
        let start = self.start.as_ptr() as usize;
        let addr = ptr as usize;
        addr >= start && addr < start + self.bytes()
    }
}

/// A provider of granule-sized chunks of memory.
///
/// Implementations may fail at any time; callers surface that as [`AllocError::OutOfMemory`].
pub trait PageSource {
    /// The unit in bytes to which every region size is rounded up
    fn granule(&self) -> usize {
        PAGESIZE
    }

    /// Acquire a region of memory that satisfies `layout`.
    ///
    /// `layout.size()` must be a non-zero multiple of [`granule()`](PageSource::granule).
    fn allocate_raw(&self, layout: Layout) -> Result<RawRegion, AllocError>;

    /// Return a region to the source.
    ///
    /// # Safety
    /// `region` must have been returned by [`allocate_raw`](PageSource::allocate_raw) of this source and must not be
    /// used afterwards.
    unsafe fn deallocate_raw(&self, region: RawRegion);
}

/// The default [`PageSource`] which takes page-aligned regions from the global heap
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct SystemPages;

impl PageSource for SystemPages {
    fn allocate_raw(&self, layout: Layout) -> Result<RawRegion, AllocError> {
        assert!(layout.size() > 0, "must allocate at least 1 byte");
        let layout = layout
            .align_to(PAGESIZE)
            .map_err(|_| AllocError::OutOfMemory)?;

        let start = NonNull::new(unsafe { alloc::alloc::alloc(layout) })
            .ok_or(AllocError::OutOfMemory)?;
        log::debug!("acquired {} bytes at {:p}", layout.size(), start);
        Ok(RawRegion { start, layout })
    }

    unsafe fn deallocate_raw(&self, region: RawRegion) {
        log::debug!("releasing {} bytes at {:p}", region.bytes(), region.start);
        alloc::alloc::dealloc(region.start.as_ptr(), region.layout);
    }
}

/// Compute the layout of a region that holds `bytes` bytes, rounded up to the granule of `source` and aligned to
/// at least `align`.
pub(crate) fn region_layout<S: PageSource>(
    source: &S,
    bytes: usize,
    align: usize,
) -> Result<Layout, AllocError> {
    let granule = source.granule();
    let size = bytes
        .max(1)
        .checked_next_multiple_of(granule)
        .ok_or(AllocError::OutOfMemory)?;
    Layout::from_size_align(size, align.max(granule)).map_err(|_| AllocError::OutOfMemory)
}
