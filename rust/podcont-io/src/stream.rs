//! Append-only stream of container images.
//!
//! Layout: the 8-byte [`MAGIC`], followed by zero or more records. Each record is
//! `size: u32 LE`, `size` payload bytes (one container image), and
//! `checksum: u32 LE` of the payload (see [`crate::checksum`]).

use std::{
    fs::File,
    io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Read, Write},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use bytemuck::Pod;
use podcont::{Container, ImageLayout, SizeType};
use podcont_bytes::AlignedBytes;
use podcont_common::{Error, Result, verify_arg};

use crate::checksum;

pub const MAGIC: &[u8; 8] = b"PODCIMG1";

/// Largest record payload, the size limit of a container image.
pub const MAX_RECORD_SIZE: usize = SizeType::MAX as usize;

/// Bytes requested from the underlying reader per step while reading a record body.
const READ_CHUNK: u64 = 1 << 20;

/// Writes container images as checksummed records.
///
/// [`ImageStreamWriter::seal`] consumes the writer, so no record can follow it.
pub struct ImageStreamWriter<W: Write> {
    inner: W,
    records: u64,
}

impl ImageStreamWriter<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path.display().to_string(), e))?;
        Self::new(BufWriter::new(file))
    }

    /// Seals the stream and syncs the underlying file to disk.
    pub fn seal_and_sync(self) -> Result<()> {
        let writer = self.seal()?;
        let file = writer
            .into_inner()
            .map_err(|e| Error::io("image stream", e.into_error()))?;
        file.sync_all().map_err(|e| Error::io("image stream", e))?;
        Ok(())
    }
}

impl<W: Write> ImageStreamWriter<W> {
    pub fn new(mut writer: W) -> Result<Self> {
        writer
            .write_all(MAGIC)
            .map_err(|e| Error::io("image stream header", e))?;
        Ok(ImageStreamWriter {
            inner: writer,
            records: 0,
        })
    }

    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Appends one image as a record.
    pub fn append(&mut self, image: &[u8]) -> Result<()> {
        if image.len() > MAX_RECORD_SIZE {
            return Err(Error::invalid_arg(
                "image",
                format!("{} bytes exceed the record limit", image.len()),
            ));
        }
        let size = image.len() as u32;
        let record = self.records;
        let context = || format!("image record {record}");
        let writer = &mut self.inner;
        writer
            .write_u32::<LittleEndian>(size)
            .map_err(|e| Error::io(context(), e))?;
        writer.write_all(image).map_err(|e| Error::io(context(), e))?;
        writer
            .write_u32::<LittleEndian>(checksum::compute(image))
            .map_err(|e| Error::io(context(), e))?;
        self.records += 1;
        log::trace!("appended image record {record} ({size} bytes)");
        Ok(())
    }

    /// Appends the image of `container`.
    pub fn append_container<T: Pod, H: Pod>(&mut self, container: &Container<T, H>) -> Result<()> {
        if container.is_detached() {
            return Err(Error::invalid_operation("append of a detached container"));
        }
        self.append(container.as_bytes())
    }

    /// Flushes and returns the underlying writer.
    pub fn seal(self) -> Result<W> {
        let mut writer = self.inner;
        writer.flush().map_err(|e| Error::io("image stream", e))?;
        log::debug!("sealed image stream with {} records", self.records);
        Ok(writer)
    }
}

/// Reads the records of an image stream back into aligned buffers.
pub struct ImageStreamReader<R: Read> {
    inner: R,
    alignment: usize,
    records: u64,
    done: bool,
}

impl ImageStreamReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P, alignment: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path.display().to_string(), e))?;
        Self::new(BufReader::new(file), alignment)
    }
}

impl<R: Read> ImageStreamReader<R> {
    /// Wraps `reader` and validates the stream magic. Images are returned in
    /// buffers aligned to `alignment`, which must be a power of two.
    pub fn new(mut reader: R, alignment: usize) -> Result<Self> {
        verify_arg!(alignment, alignment.is_power_of_two());
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).map_err(|e| match e.kind() {
            IoErrorKind::UnexpectedEof => Error::invalid_format("image stream", "missing magic"),
            _ => Error::io("image stream header", e),
        })?;
        if &magic != MAGIC {
            return Err(Error::invalid_format("image stream", "bad magic"));
        }
        Ok(ImageStreamReader {
            inner: reader,
            alignment,
            records: 0,
            done: false,
        })
    }

    pub fn records_read(&self) -> u64 {
        self.records
    }

    /// Reads the next image. Returns `None` at a clean end of stream.
    pub fn next_image(&mut self) -> Result<Option<AlignedBytes>> {
        if self.done {
            return Ok(None);
        }
        let name = format!("image record {}", self.records);
        let size = match self.read_record_size(&name) {
            Ok(Some(size)) => size,
            Ok(None) => {
                self.done = true;
                return Ok(None);
            }
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };
        let result = self.read_record_body(size, &name);
        match result {
            Ok(image) => {
                self.records += 1;
                Ok(Some(image))
            }
            Err(e) => {
                self.done = true;
                Err(e)
            }
        }
    }

    /// Reads the next image and adopts it as a container.
    pub fn next_container<T: Pod, H: Pod>(&mut self) -> Result<Option<Container<T, H>>> {
        if self.alignment < ImageLayout::<T, H>::BUFFER_ALIGNMENT {
            return Err(Error::invalid_arg(
                "alignment",
                format!(
                    "stream alignment {} is below the {} required by the container",
                    self.alignment,
                    ImageLayout::<T, H>::BUFFER_ALIGNMENT
                ),
            ));
        }
        self.next_image()?
            .map(|image| {
                let len = image.len();
                Container::from_bytes(image, Some(len))
            })
            .transpose()
    }

    /// Reads the size prefix; a stream ending exactly here is a clean end.
    fn read_record_size(&mut self, name: &str) -> Result<Option<usize>> {
        let mut prefix = [0u8; 4];
        let mut filled = 0;
        while filled < prefix.len() {
            match self.inner.read(&mut prefix[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => return Err(Error::invalid_format(name, "truncated size prefix")),
                Ok(n) => filled += n,
                Err(e) if e.kind() == IoErrorKind::Interrupted => {}
                Err(e) => return Err(Error::io(name, e)),
            }
        }
        let size = u32::from_le_bytes(prefix) as usize;
        if size > MAX_RECORD_SIZE {
            return Err(Error::invalid_format(
                name,
                format!("record size {size} exceeds the {MAX_RECORD_SIZE}-byte limit"),
            ));
        }
        Ok(Some(size))
    }

    /// Reads the payload and checksum of a record whose size prefix claims `size`
    /// bytes. Memory grows with the bytes actually received, not with the claim.
    fn read_record_body(&mut self, size: usize, name: &str) -> Result<AlignedBytes> {
        let truncated = |e: std::io::Error| match e.kind() {
            IoErrorKind::UnexpectedEof => Error::invalid_format(name, "truncated record"),
            _ => Error::io(name, e),
        };
        let mut payload = Vec::new();
        while payload.len() < size {
            let want = READ_CHUNK.min((size - payload.len()) as u64);
            let received = self
                .inner
                .by_ref()
                .take(want)
                .read_to_end(&mut payload)
                .map_err(|e| Error::io(name, e))?;
            if received == 0 {
                return Err(Error::invalid_format(
                    name,
                    format!("truncated record: {} of {size} bytes", payload.len()),
                ));
            }
        }
        let expected = self.inner.read_u32::<LittleEndian>().map_err(truncated)?;
        checksum::validate_buffer(&payload, expected, name)?;
        AlignedBytes::try_copy_from_slice(&payload, self.alignment)
            .map_err(|_| Error::allocation(size))
    }
}

impl<R: Read> Iterator for ImageStreamReader<R> {
    type Item = Result<AlignedBytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_image().transpose()
    }
}
