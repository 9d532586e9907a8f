//! Integers conforming to [`ToCString`].

use core::fmt::{Debug, Display, Formatter, Result as FmtResult};

use crate::capability::ToCString;

const MAX_DIGITS: usize = 20;

/// A signed integer together with its decimal rendering.
///
/// The rendering is produced once on construction and stored inline, so
/// [`to_c_string`](ToCString::to_c_string) can lend it like
/// [`StringValue`](crate::StringValue) lends its buffer.
#[derive(Clone, Copy)]
pub struct NumberValue {
    value: i64,
    len: u8,
    digits: [u8; MAX_DIGITS],
}

impl NumberValue {
    /// Creates a new value for `value`.
    pub fn new(value: i64) -> Self {
        let mut buffer = itoa::Buffer::new();
        let rendered = buffer.format(value).as_bytes();

        let mut digits = [0u8; MAX_DIGITS];
        digits[..rendered.len()].copy_from_slice(rendered);
        NumberValue {
            value,
            len: rendered.len() as u8,
            digits,
        }
    }

    /// Returns the held integer.
    #[inline]
    pub fn value(&self) -> i64 {
        self.value
    }
}

impl ToCString for NumberValue {
    #[inline]
    fn to_c_string(&self) -> &str {
        let rendered = &self.digits[..self.len as usize];
        // SAFETY: filled from an `itoa` rendering, which is ASCII
        unsafe { core::str::from_utf8_unchecked(rendered) }
    }
}

impl From<i64> for NumberValue {
    fn from(value: i64) -> Self {
        NumberValue::new(value)
    }
}

impl PartialEq for NumberValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
impl Eq for NumberValue {}

impl Display for NumberValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.to_c_string())
    }
}

impl Debug for NumberValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_tuple("NumberValue").field(&self.value).finish()
    }
}

#[cfg(all(test, not(feature = "no_std")))]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn renders_extremes() {
        assert_eq!(NumberValue::new(0).to_c_string(), "0");
        assert_eq!(NumberValue::new(-1).to_c_string(), "-1");
        assert_eq!(
            NumberValue::new(i64::MIN).to_c_string(),
            "-9223372036854775808"
        );
        assert_eq!(
            NumberValue::new(i64::MAX).to_c_string(),
            "9223372036854775807"
        );
    }

    proptest! {
        #[test]
        fn matches_std_formatting(value in any::<i64>()) {
            let number = NumberValue::new(value);
            prop_assert_eq!(number.to_c_string(), value.to_string());
            prop_assert_eq!(number.value(), value);
        }
    }
}
