//! The `ToCString` capability and the function tables used to dispatch it.
//!
//! A type conforms to the capability by implementing [`ToCString`]. Calls
//! made with a known type are resolved statically. When the concrete type has
//! to be erased, [`ToCStringTable`] provides the table of function pointers
//! for that type and [`CapabilityRef`] pairs it with a pointer to the value,
//! so it can be invoked without knowing what it points to.

use core::{alloc::Layout, fmt::Debug, marker::PhantomData, ptr::NonNull};

use crate::common::Box;
use crate::memory::{drop_fn, DropFn};

/// Conversion of a value into its text representation.
///
/// The returned text is borrowed from the value and can't outlive it.
///
/// # Example
///
/// ```rust
/// use capability_table::{to_c_string, ToCString};
///
/// struct Greeting;
/// impl ToCString for Greeting {
///     fn to_c_string(&self) -> &str {
///         "hello"
///     }
/// }
///
/// assert_eq!(to_c_string(&Greeting), "hello");
/// ```
pub trait ToCString {
    /// Returns the text representation of this value.
    fn to_c_string(&self) -> &str;
}

impl<T: ToCString + ?Sized> ToCString for &T {
    #[inline]
    fn to_c_string(&self) -> &str {
        (**self).to_c_string()
    }
}

impl<T: ToCString + ?Sized> ToCString for Box<T> {
    #[inline]
    fn to_c_string(&self) -> &str {
        (**self).to_c_string()
    }
}

/// Stable entry point of the capability: forwards to the implementation of
/// `T` and returns its result unchanged.
#[inline]
pub fn to_c_string<T: ToCString + ?Sized>(value: &T) -> &str {
    value.to_c_string()
}

/// Invokes the capability through an erased [`CapabilityRef`].
#[inline]
pub fn invoke<'a>(capability: CapabilityRef<'a>) -> &'a str {
    capability.to_c_string()
}

/// Table of function pointers implementing [`ToCString`] for one concrete
/// type, along with the layout and drop glue of that type.
///
/// A table can only be constructed for a type implementing [`ToCString`], so
/// every table is complete.
#[derive(Clone, Copy)]
pub struct ToCStringTable {
    to_c_string: unsafe fn(*const ()) -> *const str,
    type_name: fn() -> &'static str,
    layout: Layout,
    drop: DropFn,
}

impl ToCStringTable {
    /// Constructs the table for type `T`.
    pub const fn new<T: ToCString>() -> Self {
        ToCStringTable {
            to_c_string: erased_to_c_string::<T>,
            type_name: core::any::type_name::<T>,
            layout: Layout::new::<T>(),
            drop: drop_fn::<T>(),
        }
    }

    /// Calls the `to_c_string` entry of this table.
    ///
    /// # Safety
    ///
    /// `data` must point to a live value of the type this table was built for
    /// and that value must outlive `'a`.
    #[inline]
    pub unsafe fn invoke<'a>(&self, data: NonNull<()>) -> &'a str {
        &*(self.to_c_string)(data.as_ptr() as *const ())
    }

    /// Returns the name of the type this table was built for.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Returns the layout of the type this table was built for.
    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub(crate) fn drop_fn(&self) -> DropFn {
        self.drop
    }
}

impl Debug for ToCStringTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ToCStringTable")
            .field("type_name", &self.type_name())
            .field("layout", &self.layout)
            .finish()
    }
}

unsafe fn erased_to_c_string<T: ToCString>(data: *const ()) -> *const str {
    (*(data as *const T)).to_c_string() as *const str
}

struct StaticTable<T>(PhantomData<T>);
impl<T: ToCString> StaticTable<T> {
    const TABLE: &'static ToCStringTable = &ToCStringTable::new::<T>();
}

/// Returns the statically allocated [`ToCStringTable`] of type `T`.
///
/// Types that don't implement [`ToCString`] have no table:
///
/// ```compile_fail
/// capability_table::table_of::<u32>();
/// ```
#[inline]
pub fn table_of<T: ToCString>() -> &'static ToCStringTable {
    StaticTable::<T>::TABLE
}

/// A borrowed value of an erased type, invocable through its
/// [`ToCStringTable`].
#[derive(Clone, Copy)]
pub struct CapabilityRef<'a> {
    data: NonNull<()>,
    table: &'static ToCStringTable,
    _lifetime: PhantomData<&'a ()>,
}

impl<'a> CapabilityRef<'a> {
    /// Erases the type of `value`.
    ///
    /// ```compile_fail
    /// capability_table::CapabilityRef::new(&5u32);
    /// ```
    pub fn new<T: ToCString>(value: &'a T) -> Self {
        CapabilityRef {
            data: NonNull::from(value).cast(),
            table: table_of::<T>(),
            _lifetime: PhantomData,
        }
    }

    /// Constructs a reference from a data pointer and a table.
    ///
    /// # Safety
    ///
    /// `data` must point to a value of the type `table` was built for and the
    /// value must stay live and unmoved for `'a`.
    #[inline]
    pub unsafe fn from_raw_parts(data: NonNull<()>, table: &'static ToCStringTable) -> Self {
        CapabilityRef {
            data,
            table,
            _lifetime: PhantomData,
        }
    }

    /// Invokes the referenced value's `to_c_string` implementation.
    #[inline]
    pub fn to_c_string(&self) -> &'a str {
        // SAFETY: constructors guarantee `data` matches `table` for `'a`
        unsafe { self.table.invoke(self.data) }
    }

    /// Returns the name of the referenced value's concrete type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.table.type_name()
    }

    /// Returns the table this reference dispatches through.
    #[inline]
    pub fn table(&self) -> &'static ToCStringTable {
        self.table
    }
}

impl ToCString for CapabilityRef<'_> {
    #[inline]
    fn to_c_string(&self) -> &str {
        CapabilityRef::to_c_string(self)
    }
}

impl Debug for CapabilityRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CapabilityRef")
            .field("type_name", &self.type_name())
            .field("text", &self.to_c_string())
            .finish()
    }
}

impl<'a, T: ToCString> From<&'a T> for CapabilityRef<'a> {
    fn from(value: &'a T) -> Self {
        CapabilityRef::new(value)
    }
}

/// Wraps a conforming value and records every call to its `to_c_string`
/// implementation as a `tracing` event before forwarding to it.
///
/// Callers keep using the same entry point, only the implementation is
/// replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Traced<T> {
    inner: T,
}

impl<T> Traced<T> {
    /// Wraps `inner`.
    pub const fn new(inner: T) -> Self {
        Traced { inner }
    }

    /// Returns a reference to the wrapped value.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Unwraps the wrapped value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: ToCString> ToCString for Traced<T> {
    fn to_c_string(&self) -> &str {
        let text = self.inner.to_c_string();
        tracing::trace!(
            type_name = core::any::type_name::<T>(),
            len = text.len(),
            "to_c_string"
        );
        text
    }
}

#[cfg(all(test, not(feature = "no_std")))]
mod test {
    use super::*;
    use crate::{NumberValue, StringValue};

    #[test]
    fn dispatch_matches_direct_call() {
        let text = StringValue::create("Hello").unwrap();
        let number = NumberValue::new(-42);

        assert_eq!(to_c_string(&text), text.to_c_string());
        assert_eq!(to_c_string(&number), number.to_c_string());
        assert_eq!(invoke(CapabilityRef::new(&text)), text.to_c_string());
        assert_eq!(invoke(CapabilityRef::new(&number)), number.to_c_string());

        let table = table_of::<StringValue>();
        let data = NonNull::from(&text).cast();
        assert_eq!(unsafe { table.invoke(data) }, "Hello");
    }

    #[test]
    fn erased_references_mix_types() {
        let text = StringValue::create("seven").unwrap();
        let number = NumberValue::new(7);
        let values: [CapabilityRef<'_>; 2] = [(&text).into(), (&number).into()];

        let rendered: Vec<&str> = values.iter().map(|it| it.to_c_string()).collect();
        assert_eq!(rendered, ["seven", "7"]);
        assert!(values[0].type_name().ends_with("StringValue"));
        assert!(values[1].type_name().ends_with("NumberValue"));
    }

    #[test]
    fn trait_objects_dispatch() {
        let values: Vec<Box<dyn ToCString>> = vec![
            Box::new(StringValue::create("a").unwrap()),
            Box::new(NumberValue::new(1)),
        ];
        let rendered: Vec<&str> = values.iter().map(|it| to_c_string(it)).collect();
        assert_eq!(rendered, ["a", "1"]);
    }

    #[test]
    fn tables_describe_their_type() {
        assert_eq!(
            table_of::<NumberValue>().layout(),
            Layout::new::<NumberValue>()
        );
        assert_eq!(
            table_of::<StringValue>().type_name(),
            core::any::type_name::<StringValue>()
        );
    }

    #[test]
    fn traced_forwards_to_inner() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();

        let traced = Traced::new(StringValue::create("logged").unwrap());
        assert_eq!(to_c_string(&traced), traced.get_ref().to_c_string());
        assert_eq!(traced.into_inner().into_string(), "logged");
    }
}
