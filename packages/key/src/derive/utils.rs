//! Key comparison helpers

use subtle::ConstantTimeEq;

/// Constant-time equality for derived keys
///
/// Slices of different length compare unequal.
#[must_use]
#[inline]
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
