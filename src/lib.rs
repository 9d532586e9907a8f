#![cfg_attr(feature = "no_std", no_std)]
#![cfg_attr(feature = "error_in_core", feature(error_in_core))]
#![warn(missing_docs)]
#![doc = include_str!("../doc/crate.md")]

#[cfg(feature = "no_std")]
extern crate alloc;

pub mod capability;
mod common;
pub mod details;
pub mod error;
pub mod memory;
mod number;
pub mod registry;
pub mod store;
mod text;

pub use capability::{invoke, table_of, to_c_string, CapabilityRef, ToCString, ToCStringTable, Traced};
pub use details::{DispatchDetails, Embedded};
pub use error::{AllocationError, CapabilityError, LifecycleError};
pub use memory::{DefaultMemoryManager, ManageMemory};
pub use number::NumberValue;
pub use registry::{DispatchRegistry, TypeTag};
pub use store::{CapabilityStore, Handle, ValueState};
pub use text::StringValue;
