//! Byte layout of a container image: `[Header][padding][element array]`.

use std::marker::PhantomData;

use podcont_bytes::align::align_up;

/// Integer type of the header counters, fixed at 32 bits so the image layout does
/// not depend on the pointer width of the producing process.
pub type SizeType = i32;

/// Metadata record stored at offset 0 of every container image.
///
/// The record is only ever written field by field, so any padding bytes between
/// `user_info` and the counters keep the zero value they received at allocation.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Header<H> {
    pub(crate) user_info: H,
    pub(crate) expand_policy: SizeType,
    pub(crate) n_objects: SizeType,
    pub(crate) booked_bytes: SizeType,
}

impl<H> Header<H> {
    /// Caller-defined tag describing the stored data.
    #[inline]
    pub fn user_info(&self) -> &H {
        &self.user_info
    }

    /// Raw expansion policy value, see [`crate::ExpandPolicy`].
    #[inline]
    pub fn expand_policy(&self) -> SizeType {
        self.expand_policy
    }

    /// Number of live elements.
    #[inline]
    pub fn n_objects(&self) -> SizeType {
        self.n_objects
    }

    /// Total length in bytes of the image this header belongs to.
    #[inline]
    pub fn booked_bytes(&self) -> SizeType {
        self.booked_bytes
    }
}

/// Compile-time layout of a container image holding elements `T` tagged with `H`.
pub struct ImageLayout<T, H>(PhantomData<(T, H)>);

impl<T, H> ImageLayout<T, H> {
    /// Size of the header record.
    pub const HEADER_SIZE: usize = std::mem::size_of::<Header<H>>();

    /// Size of one element. Zero-sized element types are rejected.
    pub const ELEMENT_SIZE: usize = {
        assert!(
            std::mem::size_of::<T>() != 0,
            "zero-sized element types are not supported"
        );
        std::mem::size_of::<T>()
    };

    /// Offset of the first element: the header size rounded up to the element
    /// alignment.
    pub const DATA_OFFSET: usize = match align_up(Self::HEADER_SIZE, std::mem::align_of::<T>()) {
        Some(offset) => offset,
        None => panic!("header size overflow"),
    };

    /// Alignment required from the base of the image.
    pub const BUFFER_ALIGNMENT: usize = {
        let h = std::mem::align_of::<Header<H>>();
        let t = std::mem::align_of::<T>();
        if h > t { h } else { t }
    };

    /// Largest capacity whose image still fits the 32-bit booked size.
    pub const MAX_CAPACITY: usize =
        (SizeType::MAX as usize - Self::DATA_OFFSET) / Self::ELEMENT_SIZE;

    /// Image length needed for `capacity` elements, or `None` when it exceeds
    /// [`ImageLayout::MAX_CAPACITY`].
    #[inline]
    pub fn booked_bytes(capacity: usize) -> Option<usize> {
        if capacity > Self::MAX_CAPACITY {
            return None;
        }
        Some(Self::DATA_OFFSET + capacity * Self::ELEMENT_SIZE)
    }

    /// Number of elements an image of `len` bytes can hold.
    #[inline]
    pub fn capacity_for(len: usize) -> usize {
        len.saturating_sub(Self::DATA_OFFSET) / Self::ELEMENT_SIZE
    }
}
