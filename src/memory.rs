//! Structs and code for memory management of stored values.

use core::{alloc::Layout, ptr::NonNull};

#[cfg(feature = "no_std")]
use ::alloc::alloc;
#[cfg(not(feature = "no_std"))]
use std::alloc;

use crate::error::AllocationError;

/// Memory manager controls allocation and deallocation of memory used by
/// [`CapabilityStore`](crate::CapabilityStore) entries.
///
/// Zero-sized layouts are never passed to a memory manager, so
/// implementations don't need to special-case them.
///
/// Default implementation is [`DefaultMemoryManager`].
pub trait ManageMemory {
    /// Allocates a block of memory with size and alignment specified by
    /// `layout` argument.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocationError>;

    /// Deallocates a block of memory of provided `layout` at the specified
    /// `address`.
    ///
    /// # Safety
    ///
    /// `address` must have been returned by [`ManageMemory::allocate`] of the
    /// same manager with the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, address: NonNull<u8>, layout: Layout);
}

/// Default [memory manager](ManageMemory) that uses the methods exposed by
/// [`alloc`] module.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMemoryManager;
impl ManageMemory for DefaultMemoryManager {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocationError> {
        // SAFETY: callers never pass zero-sized layouts
        let ptr = unsafe { alloc::alloc(layout) };
        NonNull::new(ptr).ok_or_else(|| AllocationError::for_layout(layout))
    }

    unsafe fn deallocate(&self, address: NonNull<u8>, layout: Layout) {
        alloc::dealloc(address.as_ptr(), layout);
    }
}

impl<M: ManageMemory + ?Sized> ManageMemory for &M {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocationError> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, address: NonNull<u8>, layout: Layout) {
        (**self).deallocate(address, layout)
    }
}

pub(crate) type DropFn = fn(*mut ());
pub(crate) const fn drop_fn<T>() -> DropFn {
    if core::mem::needs_drop::<T>() {
        |ptr: *mut ()| unsafe { core::ptr::drop_in_place(ptr as *mut T) }
    } else {
        |_: *mut ()| {}
    }
}

/// Moves `value` into memory obtained from `manager` and returns a pointer to
/// it.
///
/// Zero-sized values get a dangling, well aligned pointer and no allocation.
pub(crate) fn place<T, M: ManageMemory>(
    manager: &M,
    value: T,
) -> Result<NonNull<()>, AllocationError> {
    let layout = Layout::new::<T>();
    if layout.size() == 0 {
        core::mem::forget(value);
        return Ok(NonNull::<T>::dangling().cast());
    }
    let ptr = manager.allocate(layout)?.cast::<T>();
    unsafe {
        // SAFETY: freshly allocated for `layout`, which is the layout of `T`
        ptr.as_ptr().write(value);
    }
    Ok(ptr.cast())
}

/// Runs `drop` on a value previously [`place`]d with `manager` and releases
/// its memory.
///
/// # Safety
///
/// `ptr` must come from [`place`] with the same `manager`, `layout` must be
/// the layout of the placed type and `drop` its drop glue. The pointer is
/// dangling afterwards.
pub(crate) unsafe fn release<M: ManageMemory>(
    manager: &M,
    ptr: NonNull<()>,
    layout: Layout,
    drop: DropFn,
) {
    drop(ptr.as_ptr());
    if layout.size() != 0 {
        manager.deallocate(ptr.cast(), layout);
    }
}

#[cfg(all(test, not(feature = "no_std")))]
mod test {
    use super::*;
    use core::cell::Cell;
    use std::rc::Rc;

    struct DropCounter(Rc<Cell<usize>>);
    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn place_and_release_runs_drop_once() {
        let drops = Rc::new(Cell::new(0));
        let ptr = place(&DefaultMemoryManager, DropCounter(drops.clone())).unwrap();
        assert_eq!(drops.get(), 0);
        unsafe {
            release(
                &DefaultMemoryManager,
                ptr,
                Layout::new::<DropCounter>(),
                drop_fn::<DropCounter>(),
            );
        }
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn zero_sized_values_skip_allocator() {
        struct Refusing;
        impl ManageMemory for Refusing {
            fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocationError> {
                Err(AllocationError::for_layout(layout))
            }
            unsafe fn deallocate(&self, _: NonNull<u8>, _: Layout) {
                unreachable!("nothing was allocated")
            }
        }

        let ptr = place(&Refusing, ()).unwrap();
        unsafe { release(&Refusing, ptr, Layout::new::<()>(), drop_fn::<()>()) };
        assert!(place(&Refusing, 5u64).is_err());
    }
}
