/// Aligns a number up to the next multiple of the specified alignment.
///
/// Returns `None` if the result does not fit in `usize`.
///
/// # Examples
///
/// ```
/// use podcont_bytes::align::align_up;
///
/// assert_eq!(align_up(0, 8), Some(0));
/// assert_eq!(align_up(1, 8), Some(8));
/// assert_eq!(align_up(12, 8), Some(16));
/// assert_eq!(align_up(16, 8), Some(16));
/// assert_eq!(align_up(usize::MAX, 8), None);
/// ```
///
/// # Panics
///
/// Panics in debug builds if `alignment` is not a non-zero power of 2.
#[inline]
pub const fn align_up(n: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    match n.checked_add(alignment - 1) {
        Some(v) => Some(v & !(alignment - 1)),
        None => None,
    }
}

/// Checks if a number is aligned to the specified alignment boundary.
///
/// # Examples
///
/// ```
/// use podcont_bytes::align::is_aligned;
///
/// assert!(is_aligned(0, 8));
/// assert!(!is_aligned(4, 8));
/// assert!(is_aligned(24, 8));
/// ```
#[inline]
pub const fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

/// Checks if a pointer is aligned to the specified alignment boundary.
#[inline]
pub fn is_ptr_aligned(ptr: *const u8, alignment: usize) -> bool {
    alignment.is_power_of_two() && is_aligned(ptr as usize, alignment)
}
