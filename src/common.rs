//! Module re-exporting used types and polyfill to help with feature support.

#[cfg(not(feature = "no_std"))]
mod std_imports {
    pub use std::boxed::Box;
    pub use std::string::String;
    pub use std::sync::atomic::{AtomicUsize, Ordering};
    pub use std::vec::Vec;
}
#[cfg(not(feature = "no_std"))]
pub use std_imports::*;

#[cfg(feature = "no_std")]
mod nostd_imports {
    pub use ::alloc::boxed::Box;
    pub use ::alloc::string::String;
    pub use ::alloc::vec::Vec;
    pub use portable_atomic::{AtomicUsize, Ordering};
}
#[cfg(feature = "no_std")]
pub use nostd_imports::*;

#[cfg(feature = "error_in_core")]
pub use core::error::Error;
#[cfg(all(not(feature = "error_in_core"), not(feature = "no_std")))]
pub use std::error::Error;

pub(crate) mod sealed {
    /// A marker trait to seal implementation of crate traits.
    pub trait Sealed {}
}
pub(crate) use sealed::Sealed;
