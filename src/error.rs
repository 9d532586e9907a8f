//! Errors produced by the crate.

#[cfg(any(feature = "error_in_core", not(feature = "no_std")))]
use crate::common::Error;

use core::alloc::Layout;
use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::store::Handle;

/// Represents a class of errors returned when memory for a value or its
/// buffer can't be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationError {
    /// Tried allocating a buffer larger than `isize::MAX`.
    TooLarge,
    /// Allocation failure caused by either resource exhaustion or invalid
    /// arguments being provided to an allocator.
    Allocator {
        /// Requested size in bytes.
        size: usize,
        /// Requested alignment.
        align: usize,
    },
}

impl AllocationError {
    pub(crate) fn for_layout(layout: Layout) -> Self {
        AllocationError::Allocator {
            size: layout.size(),
            align: layout.align(),
        }
    }
}

impl Display for AllocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            AllocationError::TooLarge => {
                write!(f, "Tried allocating a buffer larger than `isize::MAX`")
            }
            AllocationError::Allocator { size, align } => write!(
                f,
                "Allocator error (size: {}, align: {})",
                size, align
            ),
        }
    }
}

#[cfg(any(not(feature = "no_std"), feature = "error_in_core"))]
impl Error for AllocationError {}

/// Error returned when a stored value is used outside of its `Live` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    /// The capability was invoked on a value that has already been destroyed.
    UseAfterDestroy(Handle),
    /// A value that has already been destroyed was destroyed again.
    DoubleDestroy(Handle),
    /// The handle wasn't issued by the store it was used with.
    UnknownHandle(Handle),
}

impl LifecycleError {
    /// Returns the handle the failed operation was called with.
    pub fn handle(&self) -> Handle {
        match self {
            LifecycleError::UseAfterDestroy(it)
            | LifecycleError::DoubleDestroy(it)
            | LifecycleError::UnknownHandle(it) => *it,
        }
    }
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            LifecycleError::UseAfterDestroy(handle) => {
                write!(f, "Attempted to use destroyed value {}", handle)
            }
            LifecycleError::DoubleDestroy(handle) => {
                write!(f, "Attempted to destroy value {} twice", handle)
            }
            LifecycleError::UnknownHandle(handle) => {
                write!(f, "Handle {} doesn't belong to this store", handle)
            }
        }
    }
}

#[cfg(any(not(feature = "no_std"), feature = "error_in_core"))]
impl Error for LifecycleError {}

/// Represents possible errors returned by the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityError {
    /// Memory for a value couldn't be obtained.
    Allocation(AllocationError),
    /// A value was used outside of its lifetime.
    Lifecycle(LifecycleError),
}

impl Display for CapabilityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CapabilityError::Allocation(it) => Display::fmt(it, f),
            CapabilityError::Lifecycle(it) => Display::fmt(it, f),
        }
    }
}

#[cfg(any(not(feature = "no_std"), feature = "error_in_core"))]
impl Error for CapabilityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CapabilityError::Allocation(it) => Some(it),
            CapabilityError::Lifecycle(it) => Some(it),
        }
    }
}

impl From<AllocationError> for CapabilityError {
    fn from(err: AllocationError) -> Self {
        CapabilityError::Allocation(err)
    }
}

impl From<LifecycleError> for CapabilityError {
    fn from(err: LifecycleError) -> Self {
        CapabilityError::Lifecycle(err)
    }
}

#[cfg(all(test, not(feature = "no_std")))]
mod test {
    use super::*;
    use crate::common::String;

    #[test]
    fn lifecycle_error_reports_handle() {
        let handle = Handle::new_unchecked(3, 7);
        let err = LifecycleError::DoubleDestroy(handle);
        assert_eq!(err.handle(), handle);
    }

    #[test]
    fn capability_error_wraps_source() {
        let err: CapabilityError = AllocationError::TooLarge.into();
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            String::from("Tried allocating a buffer larger than `isize::MAX`")
        );
    }
}
