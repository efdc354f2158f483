//! Partition keys and the successor rule used by deep copies.

use std::fmt::Debug;

/// Suffix appended to string keys by [`PartitionKey::successor`].
pub const STRING_KEY_SUFFIX: &str = "_copy";

/// A value identifying one partition inside a [`Router`](crate::Router).
///
/// Keys are compared by equality only; ordering is irrelevant. A deep copy
/// of a partition is keyed by `key.successor()`.
///
/// # Successor law
///
/// For every implementor, `k.successor() != k`. The successor is
/// deterministic, so it does **not** guarantee uniqueness: copying the same
/// partition twice, or copying a partition whose successor key is already
/// taken, yields colliding keys. Callers that need distinct keys must check
/// for themselves.
///
/// # Floating-point keys
///
/// `f32` and `f64` are not keys: they are not `Eq` (`NaN != NaN`), so a
/// router could never find a partition keyed by `NaN`. Use an integer or
/// string key instead.
///
/// ```compile_fail
/// use partlog_core::{MessageLog, PartitionKey};
///
/// let _ = MessageLog::new(1, 1, 0.5f64);
/// let _ = 1.5f64.successor();
/// ```
pub trait PartitionKey: Clone + Eq + Debug + Send + Sync + 'static {
    /// Returns the key used for a deep copy of a partition keyed by `self`.
    #[must_use]
    fn successor(&self) -> Self;
}

macro_rules! impl_integer_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PartitionKey for $ty {
                fn successor(&self) -> Self {
                    self.wrapping_add(1)
                }
            }
        )*
    };
}

impl_integer_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl PartitionKey for String {
    fn successor(&self) -> Self {
        format!("{self}{STRING_KEY_SUFFIX}")
    }
}

impl PartitionKey for char {
    /// Next Unicode scalar value, skipping the surrogate range and wrapping
    /// from `char::MAX` to `'\0'`.
    fn successor(&self) -> Self {
        match *self {
            char::MAX => '\0',
            '\u{D7FF}' => '\u{E000}',
            c => char::from_u32(u32::from(c) + 1).unwrap_or('\0'),
        }
    }
}
