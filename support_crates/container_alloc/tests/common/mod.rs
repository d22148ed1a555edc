#![allow(dead_code)]

use container_alloc::{AllocError, PageSource, RawRegion, SystemPages};
use std::alloc::Layout;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct PageCounters {
    pub acquired: Cell<usize>,
    pub released: Cell<usize>,
    pub live_bytes: Cell<usize>,
}

impl PageCounters {
    pub fn live_regions(&self) -> usize {
        self.acquired.get() - self.released.get()
    }
}

/// A page source that forwards to [`SystemPages`] and counts every region that passes through it.
///
/// Clones share their counters so that rebinds and clones of an allocator are accounted too.
/// An optional budget limits how many regions may be live at the same time.
#[derive(Debug, Clone, Default)]
pub struct CountingPages {
    pub counters: Rc<PageCounters>,
    pub max_live_regions: Option<usize>,
}

impl CountingPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(max_live_regions: usize) -> Self {
        Self {
            counters: Rc::default(),
            max_live_regions: Some(max_live_regions),
        }
    }

    pub fn acquired(&self) -> usize {
        self.counters.acquired.get()
    }

    pub fn released(&self) -> usize {
        self.counters.released.get()
    }

    pub fn live_regions(&self) -> usize {
        self.counters.live_regions()
    }
}

impl PageSource for CountingPages {
    fn allocate_raw(&self, layout: Layout) -> Result<RawRegion, AllocError> {
        if self
            .max_live_regions
            .is_some_and(|max| self.counters.live_regions() >= max)
        {
            return Err(AllocError::OutOfMemory);
        }

        let region = SystemPages.allocate_raw(layout)?;
        let counters = &self.counters;
        counters.acquired.set(counters.acquired.get() + 1);
        counters.live_bytes.set(counters.live_bytes.get() + region.bytes());
        Ok(region)
    }

    unsafe fn deallocate_raw(&self, region: RawRegion) {
        let counters = &self.counters;
        counters.released.set(counters.released.get() + 1);
        counters.live_bytes.set(counters.live_bytes.get() - region.bytes());
        SystemPages.deallocate_raw(region)
    }
}

/// A page source that never has memory available.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingPages;

impl PageSource for FailingPages {
    fn allocate_raw(&self, _layout: Layout) -> Result<RawRegion, AllocError> {
        Err(AllocError::OutOfMemory)
    }

    unsafe fn deallocate_raw(&self, _region: RawRegion) {
        unreachable!("no region was ever handed out")
    }
}

/// A page source with a granule of 64 bytes, used to observe the rounding behavior with small regions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmallPages;

impl PageSource for SmallPages {
    fn granule(&self) -> usize {
        64
    }

    fn allocate_raw(&self, layout: Layout) -> Result<RawRegion, AllocError> {
        let start = std::ptr::NonNull::new(unsafe { std::alloc::alloc(layout) })
            .ok_or(AllocError::OutOfMemory)?;
        Ok(RawRegion { start, layout })
    }

    unsafe fn deallocate_raw(&self, region: RawRegion) {
        std::alloc::dealloc(region.start.as_ptr(), region.layout)
    }
}
