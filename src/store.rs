//! Arena of type-erased values conforming to [`ToCString`].

use core::{
    alloc::Layout,
    fmt::{Display, Formatter, Result as FmtResult},
    ptr::NonNull,
};

use crate::capability::{table_of, CapabilityRef, ToCString};
use crate::common::{AtomicUsize, Ordering, Vec};
use crate::details::{DispatchDetails, Embedded};
use crate::error::{AllocationError, LifecycleError};
use crate::memory::{self, DefaultMemoryManager, DropFn, ManageMemory};

static NEXT_STORE_ID: AtomicUsize = AtomicUsize::new(0);

/// Names a value stored in a [`CapabilityStore`].
///
/// Handles are only meaningful for the store that issued them and stay valid
/// names after the value is destroyed, so misuse can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    store: usize,
    index: usize,
}

impl Handle {
    pub(crate) fn new_unchecked(store: usize, index: usize) -> Self {
        Handle { store, index }
    }

    /// Returns the position of the named value in insertion order.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#{}@{}", self.index, self.store)
    }
}

/// Lifecycle state of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueState {
    /// The value can be dispatched to.
    Live,
    /// The value has been destroyed, its slot is a tombstone.
    Destroyed,
}

struct Entry<B> {
    data: NonNull<()>,
    binding: B,
    layout: Layout,
    drop: DropFn,
    type_name: &'static str,
}

enum Slot<B> {
    Live(Entry<B>),
    Destroyed { type_name: &'static str },
}

impl<B> Slot<B> {
    fn type_name(&self) -> &'static str {
        match self {
            Slot::Live(entry) => entry.type_name,
            Slot::Destroyed { type_name } => *type_name,
        }
    }
}

/// A container owning values of different types that all conform to
/// [`ToCString`], invocable through [`Handle`]s without knowing their types.
///
/// Type argument `D` selects how a value is bound to its
/// [`ToCStringTable`](crate::ToCStringTable): [`Embedded`] keeps the table in
/// the entry, [`DispatchRegistry`](crate::DispatchRegistry) looks it up by
/// type. Type argument `A` is the [memory manager](ManageMemory) stored values
/// are allocated with.
///
/// Destroyed values leave a tombstone behind, so using or destroying them
/// again is reported as a [`LifecycleError`] instead of touching released
/// memory. Slots are never reused. Values still live when the store is
/// dropped are destroyed with it.
///
/// # Example
///
/// ```rust
/// use capability_table::{CapabilityStore, LifecycleError, NumberValue, StringValue};
///
/// let mut store = CapabilityStore::new();
/// let text = store.push(StringValue::create("Hello").unwrap()).unwrap();
/// let number = store.push(NumberValue::new(42)).unwrap();
///
/// assert_eq!(store.to_c_string(text), "Hello");
/// assert_eq!(store.to_c_string(number), "42");
///
/// store.destroy(text);
/// assert_eq!(
///     store.try_to_c_string(text),
///     Err(LifecycleError::UseAfterDestroy(text))
/// );
/// ```
pub struct CapabilityStore<D: DispatchDetails = Embedded, A: ManageMemory = DefaultMemoryManager> {
    id: usize,
    dispatch: D,
    manager: A,
    slots: Vec<Slot<D::Binding>>,
    live_count: usize,
}

impl CapabilityStore {
    /// Creates an empty store with embedded tables and the default memory
    /// manager.
    pub fn new() -> Self {
        Self::with_manager(Embedded, DefaultMemoryManager)
    }

    /// Creates an empty store with room for `capacity` values before its slot
    /// list has to grow.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::TooLarge`] if the slot list for `capacity`
    /// values would exceed `isize::MAX` bytes, or
    /// [`AllocationError::Allocator`] if it can't be allocated.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocationError> {
        let layout = Layout::array::<Slot<<Embedded as DispatchDetails>::Binding>>(capacity)
            .map_err(|_| AllocationError::TooLarge)?;
        let mut result = Self::new();
        result
            .slots
            .try_reserve_exact(capacity)
            .map_err(|_| AllocationError::for_layout(layout))?;
        Ok(result)
    }
}

impl Default for CapabilityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DispatchDetails> CapabilityStore<D> {
    /// Creates an empty store using provided `dispatch` strategy and the
    /// default memory manager.
    pub fn with_dispatch(dispatch: D) -> Self {
        Self::with_manager(dispatch, DefaultMemoryManager)
    }
}

impl<D: DispatchDetails, A: ManageMemory> CapabilityStore<D, A> {
    /// Creates an empty store using provided `dispatch` strategy and memory
    /// `manager`.
    pub fn with_manager(dispatch: D, manager: A) -> Self {
        CapabilityStore {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            dispatch,
            manager,
            slots: Vec::new(),
            live_count: 0,
        }
    }

    /// Returns the dispatch strategy of this store.
    pub fn dispatch(&self) -> &D {
        &self.dispatch
    }

    /// Returns the memory manager of this store.
    pub fn manager(&self) -> &A {
        &self.manager
    }

    /// Moves `value` into the store and returns a [`Handle`] naming it.
    ///
    /// # Errors
    ///
    /// Returns an [`AllocationError`] if memory for the value or its slot
    /// can't be allocated. The store is left unchanged and `value` is
    /// dropped.
    ///
    /// # Panics
    ///
    /// Panics if the dispatch strategy has no table for `T`, which happens
    /// when `T` wasn't registered with a [`DispatchRegistry`](crate::DispatchRegistry).
    pub fn push<T: ToCString + 'static>(&mut self, value: T) -> Result<Handle, AllocationError> {
        self.slots
            .try_reserve(1)
            .map_err(|_| AllocationError::for_layout(Layout::new::<Slot<D::Binding>>()))?;

        let table = table_of::<T>();
        let binding = self.dispatch.bind::<T>();
        let data = memory::place(&self.manager, value)?;

        let handle = Handle::new_unchecked(self.id, self.slots.len());
        self.slots.push(Slot::Live(Entry {
            data,
            binding,
            layout: table.layout(),
            drop: table.drop_fn(),
            type_name: table.type_name(),
        }));
        self.live_count += 1;

        tracing::debug!(%handle, type_name = table.type_name(), "stored value");
        Ok(handle)
    }

    fn locate(&self, handle: Handle) -> Result<&Slot<D::Binding>, LifecycleError> {
        if handle.store != self.id {
            return Err(LifecycleError::UnknownHandle(handle));
        }
        self.slots
            .get(handle.index)
            .ok_or(LifecycleError::UnknownHandle(handle))
    }

    /// Returns the text of the value named by `handle` or a
    /// [`LifecycleError`] if it isn't live.
    ///
    /// Doesn't panic: every stored value had its table checked by
    /// [`push`](CapabilityStore::push) and the dispatch strategy can't be
    /// changed afterwards.
    pub fn try_to_c_string(&self, handle: Handle) -> Result<&str, LifecycleError> {
        match self.locate(handle)? {
            Slot::Live(entry) => {
                let table = self.dispatch.resolve(entry.binding);
                // SAFETY: `data` holds a live value of the type `binding` was
                // produced for, and it's only released through `&mut self`
                Ok(unsafe { table.invoke(entry.data) })
            }
            Slot::Destroyed { type_name } => {
                tracing::warn!(%handle, type_name, "use after destroy");
                Err(LifecycleError::UseAfterDestroy(handle))
            }
        }
    }

    /// Returns the text of the value named by `handle` and panics if it isn't
    /// live.
    pub fn to_c_string(&self, handle: Handle) -> &str {
        match self.try_to_c_string(handle) {
            Ok(it) => it,
            Err(err) => panic!("{}", err),
        }
    }

    /// Returns an erased reference to the value named by `handle` or a
    /// [`LifecycleError`] if it isn't live.
    ///
    /// Like [`try_to_c_string`](CapabilityStore::try_to_c_string), never
    /// panics.
    pub fn capability(&self, handle: Handle) -> Result<CapabilityRef<'_>, LifecycleError> {
        match self.locate(handle)? {
            Slot::Live(entry) => {
                let table = self.dispatch.resolve(entry.binding);
                // SAFETY: see `try_to_c_string`
                Ok(unsafe { CapabilityRef::from_raw_parts(entry.data, table) })
            }
            Slot::Destroyed { .. } => Err(LifecycleError::UseAfterDestroy(handle)),
        }
    }

    /// Destroys the value named by `handle`, leaving a tombstone in its place,
    /// or returns a [`LifecycleError`] if it isn't live.
    pub fn try_destroy(&mut self, handle: Handle) -> Result<(), LifecycleError> {
        if handle.store != self.id {
            return Err(LifecycleError::UnknownHandle(handle));
        }
        let slot = self
            .slots
            .get_mut(handle.index)
            .ok_or(LifecycleError::UnknownHandle(handle))?;

        let type_name = match slot {
            Slot::Live(entry) => entry.type_name,
            Slot::Destroyed { type_name } => {
                tracing::warn!(%handle, type_name = *type_name, "double destroy");
                return Err(LifecycleError::DoubleDestroy(handle));
            }
        };

        if let Slot::Live(entry) = core::mem::replace(slot, Slot::Destroyed { type_name }) {
            self.live_count -= 1;
            tracing::debug!(%handle, type_name, "destroyed value");
            // SAFETY: entry was created by `push` with this manager and is
            // no longer reachable through the slot list
            unsafe { memory::release(&self.manager, entry.data, entry.layout, entry.drop) };
        }
        Ok(())
    }

    /// Destroys the value named by `handle` and panics if it isn't live.
    pub fn destroy(&mut self, handle: Handle) {
        if let Err(err) = self.try_destroy(handle) {
            panic!("{}", err)
        }
    }

    /// Returns the lifecycle state of the value named by `handle`.
    pub fn state(&self, handle: Handle) -> Result<ValueState, LifecycleError> {
        Ok(match self.locate(handle)? {
            Slot::Live(_) => ValueState::Live,
            Slot::Destroyed { .. } => ValueState::Destroyed,
        })
    }

    /// Returns `true` if `handle` names a live value of this store.
    pub fn contains(&self, handle: Handle) -> bool {
        matches!(self.state(handle), Ok(ValueState::Live))
    }

    /// Returns the concrete type name of the value named by `handle`, which
    /// remains known after it's destroyed.
    pub fn type_name(&self, handle: Handle) -> Result<&'static str, LifecycleError> {
        self.locate(handle).map(Slot::type_name)
    }

    /// Returns an iterator over handles and texts of all live values in
    /// insertion order. Tables were checked by [`push`](CapabilityStore::push),
    /// so iterating doesn't panic.
    pub fn live(&self) -> impl Iterator<Item = (Handle, &str)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(move |(index, slot)| match slot {
                Slot::Live(entry) => {
                    let table = self.dispatch.resolve(entry.binding);
                    // SAFETY: see `try_to_c_string`
                    let text = unsafe { table.invoke(entry.data) };
                    Some((Handle::new_unchecked(self.id, index), text))
                }
                Slot::Destroyed { .. } => None,
            })
    }

    /// Returns the number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Returns `true` if there are no live values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Returns the number of handles issued by this store, including
    /// destroyed ones.
    #[inline]
    pub fn slots(&self) -> usize {
        self.slots.len()
    }
}

impl<D: DispatchDetails, A: ManageMemory> Drop for CapabilityStore<D, A> {
    fn drop(&mut self) {
        for slot in self.slots.drain(..) {
            if let Slot::Live(entry) = slot {
                // SAFETY: see `try_destroy`
                unsafe { memory::release(&self.manager, entry.data, entry.layout, entry.drop) };
            }
        }
        self.live_count = 0;
    }
}

#[cfg(feature = "debug")]
impl<D: DispatchDetails + core::fmt::Debug, A: ManageMemory> core::fmt::Debug
    for CapabilityStore<D, A>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct Slots<'a, B>(&'a [Slot<B>]);
        impl<B> core::fmt::Debug for Slots<'_, B> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.debug_list()
                    .entries(self.0.iter().map(|slot| match slot {
                        Slot::Live(entry) => (entry.type_name, ValueState::Live),
                        Slot::Destroyed { type_name } => (*type_name, ValueState::Destroyed),
                    }))
                    .finish()
            }
        }

        f.debug_struct("CapabilityStore")
            .field("id", &self.id)
            .field("dispatch", &self.dispatch)
            .field("live", &self.live_count)
            .field("slots", &Slots(&self.slots))
            .finish()
    }
}
