//! External dispatch tables keyed by concrete type.

use core::any::TypeId;
use core::fmt::{Debug, Display, Formatter, Result as FmtResult};
use core::hash::{Hash, Hasher};

use hashbrown::HashMap;

use crate::capability::{table_of, ToCString, ToCStringTable};

/// Identity of a concrete type, used as the key of a [`DispatchRegistry`].
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    /// Returns the tag of type `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        TypeTag {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the tagged type.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the name of the tagged type.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl Debug for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_tuple("TypeTag").field(&self.name).finish()
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name)
    }
}

/// A table of [`ToCStringTable`]s looked up by the [`TypeTag`] of the value
/// being dispatched.
///
/// Types have to be [registered](DispatchRegistry::register) before values of
/// them are dispatched; looking up a type that wasn't registered is a
/// programming error and panics.
#[derive(Default, Clone)]
pub struct DispatchRegistry {
    tables: HashMap<TypeTag, &'static ToCStringTable>,
}

impl DispatchRegistry {
    /// Constructs an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the table of type `T`, returning `false` if it was already
    /// registered.
    pub fn register<T: ToCString + 'static>(&mut self) -> bool {
        let tag = TypeTag::of::<T>();
        let inserted = self.tables.insert(tag, table_of::<T>()).is_none();
        if inserted {
            tracing::debug!(type_name = tag.name(), "registered capability table");
        }
        inserted
    }

    /// Builder variant of [`register`](DispatchRegistry::register).
    pub fn with<T: ToCString + 'static>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// Returns `true` if type `T` has been registered.
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.tables.contains_key(&TypeTag::of::<T>())
    }

    /// Returns the table registered for `tag`, if any.
    pub fn try_lookup(&self, tag: TypeTag) -> Option<&'static ToCStringTable> {
        self.tables.get(&tag).copied()
    }

    /// Returns the table registered for `tag` and panics if there is none.
    pub fn lookup(&self, tag: TypeTag) -> &'static ToCStringTable {
        match self.try_lookup(tag) {
            Some(it) => it,
            None => {
                tracing::error!(type_name = tag.name(), "no capability table registered");
                panic!("no ToCString table registered for type `{}`", tag)
            }
        }
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if no types have been registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Debug for DispatchRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_set().entries(self.tables.keys()).finish()
    }
}

#[cfg(all(test, not(feature = "no_std")))]
mod test {
    use super::*;
    use crate::{NumberValue, StringValue};

    #[test]
    fn register_and_lookup() {
        let mut registry = DispatchRegistry::new();
        assert!(registry.register::<NumberValue>());
        assert!(!registry.register::<NumberValue>());
        assert!(registry.is_registered::<NumberValue>());
        assert!(!registry.is_registered::<StringValue>());
        assert_eq!(registry.len(), 1);

        let table = registry.lookup(TypeTag::of::<NumberValue>());
        assert_eq!(table.type_name(), core::any::type_name::<NumberValue>());
        assert!(registry.try_lookup(TypeTag::of::<StringValue>()).is_none());
    }

    #[test]
    #[should_panic(expected = "no ToCString table registered")]
    fn missing_entry_panics() {
        let registry = DispatchRegistry::new().with::<NumberValue>();
        registry.lookup(TypeTag::of::<StringValue>());
    }

    #[test]
    fn tags_compare_by_type() {
        assert_eq!(TypeTag::of::<StringValue>(), TypeTag::of::<StringValue>());
        assert_ne!(TypeTag::of::<StringValue>(), TypeTag::of::<NumberValue>());
        assert!(TypeTag::of::<NumberValue>().to_string().ends_with("NumberValue"));
    }
}
