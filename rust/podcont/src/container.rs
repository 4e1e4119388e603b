use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};
use podcont_bytes::AlignedBytes;
use podcont_common::{Error, Result, verify_arg, verify_data};

use crate::{
    layout::{Header, ImageLayout, SizeType},
    policy::ExpandPolicy,
};

/// A growable array of plain-data elements that lives, together with its metadata,
/// in a single contiguous byte allocation.
///
/// The allocation (the container *image*) is laid out as
/// `[Header<H>][padding][T; capacity]`, where the header carries a caller-defined
/// tag of type `H`, the growth rule, the live element count and the image length.
/// Because both `T` and `H` are [`Pod`], the image can be written to a file or
/// handed to another process as an opaque byte range, and a container can be
/// rebuilt over it without any decoding step (see [`Container::from_bytes`]).
///
/// The capacity is never stored: it is always derived from the image length.
///
/// Ownership of the image can be moved out with [`Container::release`], after
/// which the container is *detached*: it reports zero length and capacity, its
/// accessors return `None` and its mutating operations fail until
/// [`Container::reset`] attaches a fresh image.
pub struct Container<T, H> {
    buf: AlignedBytes,
    _marker: PhantomData<(T, H)>,
}

impl<T: Pod, H: Pod> Container<T, H> {
    /// Creates an empty container with zero capacity and the default growth rule.
    ///
    /// The image still holds the header, so this allocates a few bytes.
    pub fn new() -> Container<T, H> {
        Container {
            buf: Self::empty_image(ExpandPolicy::DEFAULT),
            _marker: PhantomData,
        }
    }

    /// Creates an empty container able to hold `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<Container<T, H>> {
        Self::with_capacity_and_policy(capacity, ExpandPolicy::DEFAULT)
    }

    /// Creates an empty container able to hold `capacity` elements, growing by
    /// `policy` once full.
    pub fn with_capacity_and_policy(
        capacity: usize,
        policy: impl Into<ExpandPolicy>,
    ) -> Result<Container<T, H>> {
        let mut container = Container::new();
        container.reserve(capacity)?;
        container.header_mut().expand_policy = policy.into().raw();
        Ok(container)
    }

    /// Rebuilds a container over an image previously produced by a container of the
    /// same `T` and `H`, taking ownership of it. No bytes are copied.
    ///
    /// When `expected_len` is given, it is compared with the image length recorded
    /// in the header and a mismatch fails with a size-mismatch error (see
    /// [`podcont_common::Error::is_size_mismatch`]). Images that are too short, whose
    /// header contradicts their length or element count, or whose base is not
    /// aligned to [`ImageLayout::BUFFER_ALIGNMENT`] are rejected as well.
    pub fn from_bytes(bytes: AlignedBytes, expected_len: Option<usize>) -> Result<Container<T, H>> {
        Self::validate_image(&bytes, expected_len)?;
        let mut container = Container {
            buf: bytes,
            _marker: PhantomData,
        };
        let header = container.header_mut();
        header.expand_policy = ExpandPolicy::new(header.expand_policy).raw();
        log::debug!(
            "adopted container image: {} bytes, {} of {} elements",
            container.size_in_bytes(),
            container.len(),
            container.capacity()
        );
        Ok(container)
    }

    /// Rebuilds a container over a copy of `bytes`, leaving the source untouched.
    ///
    /// Performs the same validation as [`Container::from_bytes`]. The source slice
    /// does not need to be aligned.
    pub fn copy_from_bytes(bytes: &[u8], expected_len: Option<usize>) -> Result<Container<T, H>> {
        let copy = AlignedBytes::try_copy_from_slice(bytes, Self::alignment())
            .map_err(|_| Error::allocation(bytes.len()))?;
        Self::from_bytes(copy, expected_len)
    }

    /// Returns the number of live elements.
    #[inline]
    pub fn len(&self) -> usize {
        match self.header() {
            Some(header) => header.n_objects as usize,
            None => 0,
        }
    }

    /// Returns true if the container holds no live elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of elements the current image can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        ImageLayout::<T, H>::capacity_for(self.buf.len())
    }

    /// Returns true if the image was released and no new one attached.
    #[inline]
    pub fn is_detached(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns the image header, or `None` when detached.
    #[inline]
    pub fn header(&self) -> Option<&Header<H>> {
        if self.is_detached() {
            return None;
        }
        // SAFETY: an attached image is at least `DATA_OFFSET >= HEADER_SIZE` bytes long
        // and its base is aligned to `BUFFER_ALIGNMENT >= align_of::<Header<H>>()`
        // (checked on creation and adoption). Every field is `Pod` or `i32`, so any
        // bit pattern is a valid value.
        Some(unsafe { &*(self.buf.as_ptr() as *const Header<H>) })
    }

    /// Returns the caller-defined tag, or `None` when detached.
    #[inline]
    pub fn user_info(&self) -> Option<&H> {
        self.header().map(Header::user_info)
    }

    /// Replaces the caller-defined tag.
    pub fn set_user_info(&mut self, user_info: H) -> Result<()> {
        self.ensure_attached("set_user_info")?;
        self.header_mut().user_info = user_info;
        Ok(())
    }

    /// Returns the growth rule, or `None` when detached.
    #[inline]
    pub fn expand_policy(&self) -> Option<ExpandPolicy> {
        self.header().map(|header| ExpandPolicy::new(header.expand_policy))
    }

    /// Replaces the growth rule.
    pub fn set_expand_policy(&mut self, policy: impl Into<ExpandPolicy>) -> Result<()> {
        self.ensure_attached("set_expand_policy")?;
        self.header_mut().expand_policy = policy.into().raw();
        Ok(())
    }

    /// Reallocates the image to hold exactly `capacity` elements.
    ///
    /// The old image is copied byte for byte into the new one (up to the shorter of
    /// the two lengths) and released afterwards, so a failed allocation leaves the
    /// container unchanged. Requesting fewer elements than currently live truncates
    /// the element count; the dropped elements are discarded without running any
    /// destructor.
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        self.ensure_attached("reserve")?;
        let new_len = ImageLayout::<T, H>::booked_bytes(capacity)
            .ok_or_else(|| Error::capacity_overflow(capacity))?;
        let mut image = AlignedBytes::try_zeroed(new_len, Self::alignment())
            .map_err(|_| Error::allocation(new_len))?;
        let old_len = self.buf.len();
        let copied = old_len.min(new_len);
        image[..copied].copy_from_slice(&self.buf[..copied]);
        self.buf = image;

        let header = self.header_mut();
        header.booked_bytes = new_len as SizeType;
        if header.n_objects as usize > capacity {
            log::warn!(
                "reserve({capacity}) truncates the container from {} elements",
                header.n_objects
            );
            header.n_objects = capacity as SizeType;
        }
        log::debug!("container image reallocated: {old_len} -> {new_len} bytes");
        Ok(())
    }

    /// Grows the image according to the growth rule.
    pub fn expand(&mut self) -> Result<()> {
        self.ensure_attached("expand")?;
        let current = self.capacity();
        let next = self
            .expand_policy()
            .unwrap_or_default()
            .next_capacity(current)
            .ok_or_else(|| Error::capacity_overflow(current))?;
        self.reserve(next)
    }

    /// Reallocates the image to hold exactly the live elements.
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        self.reserve(self.len())
    }

    /// Appends a copy of `value`, growing the image first if it is full, and returns
    /// the stored element.
    pub fn push_back(&mut self, value: T) -> Result<&mut T> {
        let index = self.next_free_slot()?;
        self.set_len(index + 1);
        let slot = &mut self.as_mut_slice()[index];
        *slot = value;
        Ok(slot)
    }

    /// Appends an element constructed in place: the slot is reset to all zeroes and
    /// handed to `init`, which fills in the fields.
    pub fn emplace_back<F>(&mut self, init: F) -> Result<&mut T>
    where
        F: FnOnce(&mut T),
    {
        let index = self.next_free_slot()?;
        self.set_len(index + 1);
        let slot = &mut self.as_mut_slice()[index];
        *slot = T::zeroed();
        init(slot);
        Ok(slot)
    }

    /// Appends all of `values`, growing the image by the growth rule until they fit.
    pub fn extend_from_slice(&mut self, values: &[T]) -> Result<()> {
        self.ensure_attached("extend_from_slice")?;
        let start = self.len();
        let required = start
            .checked_add(values.len())
            .ok_or_else(|| Error::capacity_overflow(usize::MAX))?;
        if required > self.capacity() {
            let policy = self.expand_policy().unwrap_or_default();
            let mut target = self.capacity();
            while target < required {
                target = policy
                    .next_capacity(target)
                    .ok_or_else(|| Error::capacity_overflow(required))?;
            }
            self.reserve(target)?;
        }
        self.set_len(required);
        self.as_mut_slice()[start..].copy_from_slice(values);
        Ok(())
    }

    /// Resets the live count to zero without touching the capacity.
    ///
    /// When `drop_elements` is true the live elements are dropped in reverse order
    /// first. `Pod` types carry no drop glue, so this only matters as a statement of
    /// intent; the image bytes are left as they are.
    pub fn clear(&mut self, drop_elements: bool) {
        if self.is_detached() {
            return;
        }
        if drop_elements {
            for element in self.as_mut_slice().iter_mut().rev() {
                // SAFETY: the element is live and the count is reset right below, so
                // it is never observed as live again.
                unsafe { std::ptr::drop_in_place(element) };
            }
        }
        self.set_len(0);
    }

    /// Returns the element at `index`, or `None` when out of bounds.
    #[inline]
    pub fn at(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Mutable counterpart of [`Container::at`].
    #[inline]
    pub fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Returns the element at `index` without bounds checking.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`Container::len`].
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        // SAFETY: the caller guarantees `index < len`, so the container is attached
        // and the slot lies within the live, aligned element array.
        unsafe { &*self.data_ptr().add(index) }
    }

    /// Mutable counterpart of [`Container::get_unchecked`].
    ///
    /// # Safety
    ///
    /// `index` must be less than [`Container::len`].
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        // SAFETY: see `get_unchecked`.
        unsafe { &mut *self.data_mut_ptr().add(index) }
    }

    /// Returns the first element, or `None` when empty.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    /// Returns the last element, or `None` when empty.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Returns the live elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        if self.is_detached() {
            return &[];
        }
        self.buf.typed_view(ImageLayout::<T, H>::DATA_OFFSET, self.len())
    }

    /// Returns the live elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.is_detached() {
            return &mut [];
        }
        let len = self.len();
        self.buf.typed_view_mut(ImageLayout::<T, H>::DATA_OFFSET, len)
    }

    /// Returns an iterator over the live elements.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Returns the full image: header, padding and every allocated element slot.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Returns the address of the image (dangling when detached).
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }

    /// Returns the length of the image in bytes.
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.buf.len()
    }

    /// Moves the image out to the caller, leaving the container detached.
    ///
    /// Returns `None` if the container was already detached.
    pub fn release(&mut self) -> Option<AlignedBytes> {
        if self.is_detached() {
            return None;
        }
        let image = std::mem::take(&mut self.buf);
        log::debug!("released container image of {} bytes", image.len());
        Some(image)
    }

    /// Consumes the container, returning its image (empty when detached).
    pub fn into_bytes(self) -> AlignedBytes {
        self.buf
    }

    /// Drops the current image, if any, and attaches a fresh empty one with zero
    /// capacity and the default growth rule.
    pub fn reset(&mut self) {
        self.buf = Self::empty_image(ExpandPolicy::DEFAULT);
    }
}

impl<T: Pod, H: Pod> Container<T, H> {
    #[inline]
    fn alignment() -> usize {
        ImageLayout::<T, H>::BUFFER_ALIGNMENT
    }

    fn empty_image(policy: ExpandPolicy) -> AlignedBytes {
        let len = ImageLayout::<T, H>::DATA_OFFSET;
        let mut image = AlignedBytes::zeroed(len, Self::alignment());
        // SAFETY: freshly allocated, `len >= HEADER_SIZE` bytes, aligned for the header.
        let header = unsafe { &mut *(image.as_mut_ptr() as *mut Header<H>) };
        header.expand_policy = policy.raw();
        header.booked_bytes = len as SizeType;
        image
    }

    /// Checks an image before adoption. The header is read only once the length and
    /// alignment are known to be sufficient.
    fn validate_image(bytes: &AlignedBytes, expected_len: Option<usize>) -> Result<()> {
        let data_offset = ImageLayout::<T, H>::DATA_OFFSET;
        verify_data!(bytes, bytes.len() >= data_offset);
        verify_arg!(bytes, bytes.is_aligned_at(0, Self::alignment()));
        verify_data!(bytes, bytes.len() <= SizeType::MAX as usize);

        // SAFETY: length and alignment verified above; all fields accept any bits.
        let header = unsafe { &*(bytes.as_ptr() as *const Header<H>) };
        let booked = header.booked_bytes;
        verify_data!(booked_bytes, booked >= 0);
        if let Some(expected) = expected_len
            && expected != booked as usize
        {
            return Err(Error::size_mismatch(expected, booked as usize));
        }
        verify_data!(booked_bytes, booked as usize == bytes.len());
        let capacity = ImageLayout::<T, H>::capacity_for(bytes.len());
        let n_objects = header.n_objects;
        verify_data!(n_objects, n_objects >= 0 && n_objects as usize <= capacity);
        Ok(())
    }

    fn ensure_attached(&self, operation: &str) -> Result<()> {
        if self.is_detached() {
            return Err(Error::invalid_operation(format!(
                "{operation} on a detached container"
            )));
        }
        Ok(())
    }

    /// Returns the index of the first non-live slot, expanding when the image is full.
    #[inline]
    fn next_free_slot(&mut self) -> Result<usize> {
        self.ensure_attached("append")?;
        if self.len() == self.capacity() {
            self.expand()?;
        }
        Ok(self.len())
    }

    /// Must only be called on an attached container.
    #[inline]
    fn header_mut(&mut self) -> &mut Header<H> {
        debug_assert!(!self.is_detached());
        // SAFETY: see `header`; exclusive access follows from `&mut self`.
        unsafe { &mut *(self.buf.as_mut_ptr() as *mut Header<H>) }
    }

    #[inline]
    fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.header_mut().n_objects = len as SizeType;
    }

    #[inline]
    fn data_ptr(&self) -> *const T {
        self.buf
            .as_ptr()
            .wrapping_add(ImageLayout::<T, H>::DATA_OFFSET) as *const T
    }

    #[inline]
    fn data_mut_ptr(&mut self) -> *mut T {
        self.buf
            .as_mut_ptr()
            .wrapping_add(ImageLayout::<T, H>::DATA_OFFSET) as *mut T
    }
}

impl<T: Pod, H: Pod> Default for Container<T, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod, H: Pod> Clone for Container<T, H> {
    fn clone(&self) -> Self {
        Container {
            buf: self.buf.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Pod + std::fmt::Debug, H: Pod + std::fmt::Debug> std::fmt::Debug for Container<T, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("user_info", &self.user_info())
            .field("expand_policy", &self.expand_policy())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("size_in_bytes", &self.size_in_bytes())
            .field("elements", &self.as_slice())
            .finish()
    }
}

impl<T: Pod, H: Pod> std::ops::Index<usize> for Container<T, H> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Pod, H: Pod> std::ops::IndexMut<usize> for Container<T, H> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<'a, T: Pod, H: Pod> IntoIterator for &'a Container<T, H> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
