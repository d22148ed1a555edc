use crate::traits::{AllocError, ElementAllocator};
use core::fmt::{Debug, Display, Formatter};
use core::mem;
use core::mem::MaybeUninit;
use core::ops::{Deref, DerefMut};
use core::ptr;
use core::ptr::NonNull;

/// A box that keeps its content in memory obtained from an [`ElementAllocator`]
///
/// # Generic Arguments
/// - `'alloc` is the lifetime of the allocator from which the memory was borrowed.
/// - `A` is the [`ElementAllocator`] implementation.
/// - `T` is either the allocator's element type or a slice of it.
///
/// Dropping the box drops its content and hands the memory back via
/// [`deallocate`](ElementAllocator::deallocate).
pub struct Box<'alloc, A: ElementAllocator, T: ?Sized> {
    /// The value that is managed by this box
    inner: NonNull<T>,
    /// Number of elements that were requested from the allocator
    count: usize,
    /// The allocator from which the memory was taken
    source_alloc: &'alloc A,
}

// general maybe-sized impl

impl<'alloc, A: ElementAllocator, T: ?Sized> Box<'alloc, A, T> {
    /// Consume the Box and leak the held value.
    ///
    /// The memory is never handed back to the allocator but the allocator still needs to outlive the reference.
    pub fn leak(self) -> &'alloc mut T {
        let result = self.inner;
        mem::forget(self);
        unsafe { &mut *result.as_ptr() }
    }

    /// Consume the Box, returning its raw parts.
    ///
    /// After calling this function, the caller is responsible for the memory previously managed by the Box.
    /// The easiest way to release it is to construct another box using [`from_raw()`](Box::from_raw) and then dropping
    /// it.
    pub fn into_raw(self) -> (NonNull<T>, usize, &'alloc A) {
        let result = (self.inner, self.count, self.source_alloc);
        mem::forget(self);
        result
    }

    /// Construct a box from the raw parts returned by [`into_raw()`](Box::into_raw).
    ///
    /// # Safety
    /// The parts must have been returned by `into_raw()` and must not have been used to construct another box.
    pub unsafe fn from_raw(inner: NonNull<T>, count: usize, source_alloc: &'alloc A) -> Self {
        Self {
            inner,
            count,
            source_alloc,
        }
    }
}

// single element impl

impl<'alloc, A: ElementAllocator> Box<'alloc, A, A::Element> {
    /// Store the given value in memory obtained from `allocator`.
    pub fn new(value: A::Element, allocator: &'alloc A) -> Result<Self, AllocError> {
        let result = Self::new_uninit(allocator)?;
        Ok(unsafe {
            result.inner.as_ptr().write(MaybeUninit::new(value));
            result.assume_init()
        })
    }

    /// Construct a new Box able to hold one element but with uninitialized content
    pub fn new_uninit(
        allocator: &'alloc A,
    ) -> Result<Box<'alloc, A, MaybeUninit<A::Element>>, AllocError> {
        let mem = allocator.allocate(1)?;
        Ok(Box {
            inner: mem.cast(),
            count: 1,
            source_alloc: allocator,
        })
    }
}

impl<'alloc, A: ElementAllocator> Box<'alloc, A, MaybeUninit<A::Element>> {
    /// Converts to `Box<A::Element>`
    ///
    /// # Safety
    /// As with [`MaybeUninit::assume_init`], it is up to the caller to guarantee that the value really is in an initialized state.
    /// Calling this when the content is not yet fully initialized causes immediate undefined behavior.
    pub unsafe fn assume_init(self) -> Box<'alloc, A, A::Element> {
        // prevent drop() being called which would deallocate the memory
        let old = mem::ManuallyDrop::new(self);

        Box {
            inner: old.inner.cast(),
            count: old.count,
            source_alloc: old.source_alloc,
        }
    }
}

// slice impl

impl<'alloc, A: ElementAllocator> Box<'alloc, A, [A::Element]> {
    /// Create a boxed slice of `len` elements where each element is produced by calling `f` with its index.
    ///
    /// The elements are placed contiguously which is not supported by every allocator.
    pub fn from_fn(
        len: usize,
        allocator: &'alloc A,
        mut f: impl FnMut(usize) -> A::Element,
    ) -> Result<Self, AllocError> {
        let mem = allocator.allocate(len)?;
        for i in 0..len {
            unsafe { mem.as_ptr().add(i).write(f(i)) };
        }

        let slice = ptr::slice_from_raw_parts_mut(mem.as_ptr(), len);
        Ok(Box {
            inner: unsafe { NonNull::new_unchecked(slice) },
            count: len,
            source_alloc: allocator,
        })
    }
}

// Drop impl

impl<'alloc, A: ElementAllocator, T: ?Sized> Drop for Box<'alloc, A, T> {
    fn drop(&mut self) {
        unsafe {
            ptr::drop_in_place(self.inner.as_ptr());
            self.source_alloc
                .deallocate(self.inner.cast::<A::Element>(), self.count)
        }
    }
}

// Deref and DerefMut impls

impl<'alloc, A: ElementAllocator, T: ?Sized> Deref for Box<'alloc, A, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        unsafe { self.inner.as_ref() }
    }
}

impl<'alloc, A: ElementAllocator, T: ?Sized> DerefMut for Box<'alloc, A, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { self.inner.as_mut() }
    }
}

// Display and Debug impls

impl<'alloc, A: ElementAllocator, T: ?Sized + Display> Display for Box<'alloc, A, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Display::fmt(&**self, f)
    }
}

impl<'alloc, A: ElementAllocator, T: ?Sized + Debug> Debug for Box<'alloc, A, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&**self, f)
    }
}
