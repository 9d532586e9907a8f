//! Implementation details for dispatch strategy marker structs.
//!
//! End-users aren't meant to interact with traits defined in this module
//! directly, they exist so [`CapabilityStore`](crate::CapabilityStore) can
//! share one code base between both ways of binding a stored value to its
//! [`ToCStringTable`].

use core::fmt::Debug;

use crate::capability::{table_of, ToCString, ToCStringTable};
use crate::common::Sealed;
use crate::registry::{DispatchRegistry, TypeTag};

/// Binds stored values to the table that implements the capability for them.
pub trait DispatchDetails: Sealed {
    /// Data kept next to each stored value to find its table.
    type Binding: Copy + Debug;

    /// Produces the binding of a value of type `T`.
    fn bind<T: ToCString + 'static>(&self) -> Self::Binding;

    /// Resolves a binding produced by [`bind`](DispatchDetails::bind) into a
    /// table.
    fn resolve(&self, binding: Self::Binding) -> &'static ToCStringTable;
}

/// Each stored value carries its own table, the capability is embedded in the
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Embedded;

impl Sealed for Embedded {}
impl DispatchDetails for Embedded {
    type Binding = &'static ToCStringTable;

    #[inline]
    fn bind<T: ToCString + 'static>(&self) -> Self::Binding {
        table_of::<T>()
    }

    #[inline]
    fn resolve(&self, binding: Self::Binding) -> &'static ToCStringTable {
        binding
    }
}

impl Sealed for DispatchRegistry {}

/// Each stored value carries only its [`TypeTag`], the table is looked up in
/// the registry on every call.
///
/// Binding a type that isn't registered panics, so unregistered values never
/// enter a store.
impl DispatchDetails for DispatchRegistry {
    type Binding = TypeTag;

    #[inline]
    fn bind<T: ToCString + 'static>(&self) -> Self::Binding {
        let tag = TypeTag::of::<T>();
        self.lookup(tag);
        tag
    }

    #[inline]
    fn resolve(&self, binding: Self::Binding) -> &'static ToCStringTable {
        self.lookup(binding)
    }
}
