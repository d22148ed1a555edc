use crate::page_source::RawRegion;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

/// Storage for exactly one object.
///
/// A slab is either linked into the free list of its cache or holds caller data, never both.
pub(super) enum Slab<T> {
    Free { next: Option<NonNull<Slab<T>>> },
    Occupied(MaybeUninit<T>),
}

/// Bookkeeping of one cache.
///
/// The header is placed at the very beginning of the cache's region and is followed by the slabs:
///
/// ```text
///   ┌─────────────────────────── region ─────────────────────────────┐
///   │                                                                │
/// [ SlabCache | Slab<T> | Slab<T> | Slab<T> | ... | Slab<T> | padding ]
///               ^
///               └── slabs_offset
/// ```
pub(super) struct SlabCache<T> {
    /// Next cache in the allocator's cache list
    pub next: Option<NonNull<SlabCache<T>>>,
    /// First free slab of this cache
    pub free_list: Option<NonNull<Slab<T>>>,
    /// The memory this header and its slabs live in
    pub region: RawRegion,
    /// Number of slabs that are currently handed out
    pub used: usize,
}

impl<T> SlabCache<T> {
    /// Write a fresh cache header into `region` and thread all `size` slabs onto its free list.
    ///
    /// # Safety
    /// `region` must be unused, aligned for `SlabCache<T>` and large enough to hold the header followed by `size`
    /// slabs starting at `slabs_offset`.
    pub unsafe fn init(
        region: RawRegion,
        slabs_offset: usize,
        size: usize,
        next: Option<NonNull<SlabCache<T>>>,
    ) -> NonNull<SlabCache<T>> {
        let slabs = region.start.as_ptr().add(slabs_offset).cast::<Slab<T>>();

        // link back to front so that the slab with the lowest address ends up at the head
        let mut free_list = None;
        for i in (0..size).rev() {
            let slab = slabs.add(i);
            slab.write(Slab::Free { next: free_list });
            free_list = Some(NonNull::new_unchecked(slab));
        }

        let cache = region.start.cast::<SlabCache<T>>();
        cache.as_ptr().write(SlabCache {
            next,
            free_list,
            region,
            used: 0,
        });
        cache
    }

    /// Take the first free slab and return a pointer to its storage.
    ///
    /// # Safety
    /// The free list must only contain slabs of this cache that are currently free.
    pub unsafe fn pop(&mut self) -> Option<NonNull<T>> {
        let slab = self.free_list?;
        self.free_list = match &*slab.as_ptr() {
            Slab::Free { next } => *next,
            Slab::Occupied(_) => unreachable!("occupied slab on the free list"),
        };

        slab.as_ptr().write(Slab::Occupied(MaybeUninit::uninit()));
        self.used += 1;
        match &mut *slab.as_ptr() {
            Slab::Occupied(data) => Some(NonNull::new_unchecked(data.as_mut_ptr())),
            Slab::Free { .. } => unreachable!(),
        }
    }

    /// Put the slab containing `ptr` back onto the free list.
    ///
    /// # Panics
    /// Panics if the slab is already free.
    ///
    /// # Safety
    /// `ptr` must point into a slab of this cache which starts at `slabs_offset` with slabs of `slab_size` bytes.
    pub unsafe fn push(&mut self, ptr: NonNull<T>, slabs_offset: usize, slab_size: usize) {
        let slabs = self.region.start.as_ptr().add(slabs_offset);
        assert!(
            ptr.as_ptr().cast::<u8>() >= slabs,
            "pointer {:p} does not point to a slab",
            ptr
        );
        let index = (ptr.as_ptr() as usize - slabs as usize) / slab_size;
        let slab = slabs.cast::<Slab<T>>().add(index);

        assert!(
            matches!(&*slab, Slab::Occupied(_)),
            "double free of slab {:p}",
            slab
        );
        slab.write(Slab::Free {
            next: self.free_list,
        });
        self.free_list = Some(NonNull::new_unchecked(slab));
        self.used -= 1;
    }

    /// Whether `ptr` points into the memory of this cache
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.region.contains(ptr)
    }
}
