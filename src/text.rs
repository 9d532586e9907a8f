//! Owned text conforming to [`ToCString`].

use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

use crate::capability::ToCString;
use crate::common::{Box, String};
use crate::error::AllocationError;

/// A value owning an immutable text buffer.
///
/// The buffer lives exactly as long as the value: it's released by
/// [`destroy`](StringValue::destroy) or when the value goes out of scope, and
/// any text borrowed through [`to_c_string`](ToCString::to_c_string) can't
/// outlive it. `StringValue` isn't `Clone`, ownership of the buffer is
/// exclusive.
///
/// # Example
///
/// ```rust
/// use capability_table::{StringValue, ToCString};
///
/// let value = StringValue::create("Hello").expect("unable to allocate text");
/// assert_eq!(value.to_c_string(), "Hello");
/// value.destroy();
/// ```
#[derive(PartialEq, Eq, Hash)]
pub struct StringValue {
    text: Box<str>,
}

impl StringValue {
    /// Creates a new value holding a copy of `text`.
    ///
    /// The caller keeps ownership of `text`. Any text is accepted, including
    /// an empty one.
    ///
    /// # Errors
    ///
    /// Returns an [`AllocationError`] if a buffer for the copy can't be
    /// allocated.
    pub fn create(text: &str) -> Result<Self, AllocationError> {
        let mut buffer = String::new();
        buffer
            .try_reserve_exact(text.len())
            .map_err(|_| AllocationError::Allocator {
                size: text.len(),
                align: 1,
            })?;
        buffer.push_str(text);
        tracing::trace!(len = text.len(), "created StringValue");
        Ok(StringValue {
            text: buffer.into_boxed_str(),
        })
    }

    /// Creates a new value taking ownership of `text` without copying it.
    pub fn from_owned(text: String) -> Self {
        tracing::trace!(len = text.len(), "adopted StringValue");
        StringValue {
            text: text.into_boxed_str(),
        }
    }

    /// Returns the length of the held text in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the held text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Consumes this value and returns its buffer.
    pub fn into_string(self) -> String {
        self.text.into_string()
    }

    /// Destroys this value, releasing its buffer.
    ///
    /// Taking `self` by value means the value can't be used, or destroyed
    /// again, afterwards:
    ///
    /// ```compile_fail
    /// use capability_table::{StringValue, ToCString};
    ///
    /// let value = StringValue::create("Hello").unwrap();
    /// value.destroy();
    /// value.to_c_string();
    /// ```
    ///
    /// ```compile_fail
    /// use capability_table::StringValue;
    ///
    /// let value = StringValue::create("Hello").unwrap();
    /// value.destroy();
    /// value.destroy();
    /// ```
    pub fn destroy(self) {
        tracing::trace!(len = self.text.len(), "destroyed StringValue");
        drop(self)
    }
}

impl ToCString for StringValue {
    #[inline]
    fn to_c_string(&self) -> &str {
        &self.text
    }
}

impl From<String> for StringValue {
    fn from(text: String) -> Self {
        StringValue::from_owned(text)
    }
}

impl Display for StringValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.text)
    }
}

impl Debug for StringValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_tuple("StringValue").field(&&*self.text).finish()
    }
}

#[cfg(all(test, not(feature = "no_std")))]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn create_and_read() {
        let value = StringValue::create("Hello").unwrap();
        assert_eq!(value.to_c_string(), "Hello");
        assert_eq!(value.len(), 5);
        value.destroy();
    }

    #[test]
    fn empty_text() {
        let value = StringValue::create("").unwrap();
        assert_eq!(value.to_c_string(), "");
        assert!(value.is_empty());
    }

    #[test]
    fn input_stays_usable_after_create() {
        let input = String::from("borrowed");
        let value = StringValue::create(&input).unwrap();
        drop(value);
        assert_eq!(input, "borrowed");
    }

    #[test]
    fn owned_text_is_not_copied() {
        let input = String::from("moved");
        let address = input.as_ptr();
        let value = StringValue::from_owned(input);
        assert_eq!(value.to_c_string().as_ptr(), address);
    }

    #[test]
    fn format_directives_are_payload() {
        let value = StringValue::create("%s %n {}").unwrap();
        assert_eq!(value.to_string(), "%s %n {}");
        assert_eq!(format!("{:?}", value), "StringValue(\"%s %n {}\")");
    }

    proptest! {
        #[test]
        fn round_trip(text in any::<String>()) {
            let value = StringValue::create(&text).unwrap();
            prop_assert_eq!(value.to_c_string(), text.as_str());
            prop_assert_eq!(value.into_string(), text);
        }
    }
}
