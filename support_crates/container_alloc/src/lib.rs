//! Special purpose allocators for containers.
//!
//! Each allocator hands out storage for values of one element type and trades generality for a specific guarantee:
//!
//! - [`ArenaAllocator`] bumps through one region acquired from a [`PageSource`] and frees only in bulk.
//! - [`FixedBufferAllocator`] does the same with a buffer of `N` elements embedded in itself and never touches
//!   dynamic memory.
//! - [`SlabAllocator`] hands out single objects from page-sized caches, supports deallocation in any order and
//!   returns caches to the page source as soon as they are empty.
//!
//! None of the allocators synchronize internally.
//! They use interior mutability so that containers like [`Box`] can share them by reference.
//!
//! # Features
//! - `std`: implements `std::error::Error` for [`AllocError`].
#![no_std]

extern crate alloc;

// the `std::error::Error` impl derived for `AllocError` names `std`
#[cfg(feature = "std")]
extern crate std;

mod arena_allocator;
mod custom_box;
mod fixed_buffer_allocator;
pub mod page_source;
pub mod slab_allocator;
mod traits;

pub use arena_allocator::{ArenaAllocator, ArenaConfig};
pub use custom_box::Box;
pub use fixed_buffer_allocator::FixedBufferAllocator;
pub use page_source::{PageSource, RawRegion, SystemPages};
pub use slab_allocator::{SlabAllocator, SlabConfig};
pub use traits::{AllocError, ElementAllocator, Rebind};
