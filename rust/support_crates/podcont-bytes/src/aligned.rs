use std::collections::TryReserveError;

use crate::align::{align_up, is_ptr_aligned};

/// A fixed-length, owned byte allocation whose first byte satisfies a caller-chosen
/// alignment.
///
/// Unlike a growable byte vector, the length of an `AlignedBytes` is set once at
/// creation and never changes: resizing means allocating a new instance and copying.
/// This makes it a suitable ownership token for a self-describing memory image that
/// is handed back and forth between a container and its caller.
///
/// The storage is an over-allocated `Vec<u8>` with a leading gap (`start`) that
/// brings the data pointer to the requested alignment. The inner vector is never
/// grown, so the data pointer stays stable for the lifetime of the instance, including
/// across moves.
pub struct AlignedBytes {
    /// The underlying byte vector, including the alignment gap at its start.
    inner: Vec<u8>,
    /// Offset of the aligned data within `inner`.
    start: usize,
    /// Alignment guaranteed for the data pointer (when non-empty).
    alignment: usize,
}

impl AlignedBytes {
    /// Creates an empty allocation.
    pub fn new() -> AlignedBytes {
        AlignedBytes {
            inner: Vec::new(),
            start: 0,
            alignment: 1,
        }
    }

    /// Creates a zero-filled allocation of `len` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two, or if the allocation fails.
    pub fn zeroed(len: usize, alignment: usize) -> AlignedBytes {
        Self::try_zeroed(len, alignment).expect("AlignedBytes allocation")
    }

    /// Creates a zero-filled allocation of `len` bytes, reporting allocation failure
    /// instead of aborting.
    ///
    /// # Panics
    ///
    /// Panics if `alignment` is not a power of two.
    pub fn try_zeroed(len: usize, alignment: usize) -> Result<AlignedBytes, TryReserveError> {
        Self::make(len, alignment)
    }

    /// Creates an allocation holding a copy of `data`, aligned to `alignment`.
    pub fn copy_from_slice(data: &[u8], alignment: usize) -> AlignedBytes {
        Self::try_copy_from_slice(data, alignment).expect("AlignedBytes allocation")
    }

    /// Fallible version of [`AlignedBytes::copy_from_slice`].
    pub fn try_copy_from_slice(
        data: &[u8],
        alignment: usize,
    ) -> Result<AlignedBytes, TryReserveError> {
        let mut bytes = Self::make(data.len(), alignment)?;
        bytes.as_mut_slice().copy_from_slice(data);
        Ok(bytes)
    }

    /// Returns the number of bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len() - self.start
    }

    /// Returns true if the allocation holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the alignment this allocation was created with.
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Returns a raw pointer to the first byte.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.as_slice().as_ptr()
    }

    /// Returns a mutable raw pointer to the first byte.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.as_mut_slice().as_mut_ptr()
    }

    /// Returns the bytes as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner[self.start..]
    }

    /// Returns the bytes as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.inner[self.start..]
    }

    /// Checks whether the byte at `offset` is aligned to `alignment`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is greater than the length.
    pub fn is_aligned_at(&self, offset: usize, alignment: usize) -> bool {
        assert!(offset <= self.len());
        is_ptr_aligned(self.as_slice()[offset..].as_ptr(), alignment)
    }

    /// Views `count` values of type `T` starting at byte `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds or `offset` is not suitably aligned for `T`.
    #[inline]
    pub fn typed_view<T>(&self, offset: usize, count: usize) -> &[T]
    where
        T: bytemuck::AnyBitPattern,
    {
        let end = offset + count * std::mem::size_of::<T>();
        bytemuck::cast_slice(&self.as_slice()[offset..end])
    }

    /// Mutable counterpart of [`AlignedBytes::typed_view`].
    #[inline]
    pub fn typed_view_mut<T>(&mut self, offset: usize, count: usize) -> &mut [T]
    where
        T: bytemuck::AnyBitPattern + bytemuck::NoUninit,
    {
        let end = offset + count * std::mem::size_of::<T>();
        bytemuck::cast_slice_mut(&mut self.as_mut_slice()[offset..end])
    }
}

impl AlignedBytes {
    fn make(len: usize, alignment: usize) -> Result<AlignedBytes, TryReserveError> {
        let alignment = alignment.max(1);
        assert!(alignment.is_power_of_two());

        if len == 0 {
            return Ok(AlignedBytes {
                inner: Vec::new(),
                start: 0,
                alignment,
            });
        }

        // Saturation makes an impossible request fail in `try_reserve_exact`.
        let vec_capacity = len.saturating_add(alignment - 1);
        let mut vec = Vec::<u8>::new();
        vec.try_reserve_exact(vec_capacity)?;

        let p = vec.as_ptr() as usize;
        let aligned = align_up(p, alignment).expect("aligned pointer");
        let start = aligned - p;
        // Within the reserved capacity, so the buffer does not move.
        vec.resize(start + len, 0);
        debug_assert_eq!(vec.as_ptr() as usize, p);

        Ok(AlignedBytes {
            inner: vec,
            start,
            alignment,
        })
    }
}

impl std::ops::Deref for AlignedBytes {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl std::ops::DerefMut for AlignedBytes {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl AsRef<[u8]> for AlignedBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Clone for AlignedBytes {
    fn clone(&self) -> AlignedBytes {
        AlignedBytes::copy_from_slice(self.as_slice(), self.alignment)
    }
}

impl std::fmt::Debug for AlignedBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBytes")
            .field("len", &self.len())
            .field("alignment", &self.alignment)
            .field("internal_offset", &self.start)
            .field("internal_cap", &self.inner.capacity())
            .finish_non_exhaustive()
    }
}

impl Default for AlignedBytes {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for AlignedBytes {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for AlignedBytes {}
