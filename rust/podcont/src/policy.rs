use crate::layout::SizeType;

/// Growth rule applied when an append finds the element array full.
///
/// The raw value is stored in the image header:
/// - a positive `k` grows the capacity by exactly `k` elements;
/// - a non-positive `-m` grows it to `2 * max(capacity + m, 1)`, so `m` acts as a
///   floor added before doubling.
///
/// Zero is not a valid rule and is normalized to `-1` (plain doubling with a floor
/// of one extra element).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpandPolicy(SizeType);

impl ExpandPolicy {
    /// Policy used when none is specified.
    pub const DEFAULT: ExpandPolicy = ExpandPolicy(-1);

    /// Creates a policy from its raw header value, normalizing zero.
    pub const fn new(raw: SizeType) -> ExpandPolicy {
        if raw == 0 {
            Self::DEFAULT
        } else {
            ExpandPolicy(raw)
        }
    }

    /// Returns the raw header value.
    #[inline]
    pub const fn raw(self) -> SizeType {
        self.0
    }

    /// Returns `true` for the fixed-increment flavor.
    #[inline]
    pub const fn is_additive(self) -> bool {
        self.0 > 0
    }

    /// Computes the capacity following `current`, or `None` on arithmetic overflow.
    pub fn next_capacity(self, current: usize) -> Option<usize> {
        if self.0 > 0 {
            current.checked_add(self.0 as usize)
        } else {
            let floor = self.0.unsigned_abs() as usize;
            current.checked_add(floor)?.max(1).checked_mul(2)
        }
    }
}

impl Default for ExpandPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<SizeType> for ExpandPolicy {
    fn from(raw: SizeType) -> Self {
        ExpandPolicy::new(raw)
    }
}
