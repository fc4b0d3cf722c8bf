//! Read-only container access.

use crate::error::{StorageError, StorageResult};
use crate::section::SectionHandle;
use crate::writer::{CONTAINER_MAGIC, CONTAINER_VERSION, FOOTER_SIZE, HEADER_SIZE};
use memmap2::Mmap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Location and size of a section within a container file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionInfo {
    /// Byte offset of the section from the start of the file.
    pub offset: u64,
    /// Section length in bytes.
    pub len: u64,
}

/// Opens a finalized section container for reading.
///
/// The section directory is parsed once at open time. Sections can then
/// be read into owned buffers or memory-mapped via
/// [`map_section`](ContainerReader::map_section); mapped sections borrow
/// nothing from the reader and outlive it independently.
///
/// # Thread Safety
///
/// Reads lock an internal file handle, so a shared reader can serve
/// concurrent `read_section` calls.
#[derive(Debug)]
pub struct ContainerReader {
    path: PathBuf,
    file: RwLock<File>,
    size: u64,
    sections: HashMap<String, SectionInfo>,
}

impl ContainerReader {
    /// Opens a container file and parses its section directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidFormat`] if the file is not a
    /// container, is truncated, or carries an unsupported version.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let mut file = File::open(path)?;
        let size = file.metadata()?.len();

        if size < HEADER_SIZE + FOOTER_SIZE {
            return Err(StorageError::invalid_format("container file too small"));
        }

        let mut header = [0u8; 6];
        file.read_exact(&mut header)?;
        if header[0..4] != CONTAINER_MAGIC {
            return Err(StorageError::invalid_format("bad container magic"));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version > CONTAINER_VERSION {
            return Err(StorageError::invalid_format(format!(
                "unsupported container version: {version}"
            )));
        }

        let mut footer = [0u8; 8];
        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        file.read_exact(&mut footer)?;
        let dir_offset = u64::from_le_bytes(footer);

        if dir_offset < HEADER_SIZE || dir_offset > size - FOOTER_SIZE {
            return Err(StorageError::invalid_format("directory offset out of range"));
        }

        let dir_len = (size - FOOTER_SIZE - dir_offset) as usize;
        let mut dir = vec![0u8; dir_len];
        file.seek(SeekFrom::Start(dir_offset))?;
        file.read_exact(&mut dir)?;

        let sections = Self::parse_directory(&dir, dir_offset)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
            size,
            sections,
        })
    }

    fn take<'a>(dir: &'a [u8], cursor: &mut usize, n: usize) -> StorageResult<&'a [u8]> {
        let end = cursor
            .checked_add(n)
            .filter(|&e| e <= dir.len())
            .ok_or_else(|| StorageError::invalid_format("truncated section directory"))?;
        let bytes = &dir[*cursor..end];
        *cursor = end;
        Ok(bytes)
    }

    fn parse_directory(dir: &[u8], dir_offset: u64) -> StorageResult<HashMap<String, SectionInfo>> {
        let mut cursor = 0usize;

        let count_bytes = Self::take(dir, &mut cursor, 4)?;
        let count = u32::from_le_bytes(count_bytes.try_into().unwrap_or([0; 4]));

        let mut sections = HashMap::with_capacity(count as usize);
        for _ in 0..count {
            let len_bytes = Self::take(dir, &mut cursor, 2)?;
            let name_len = usize::from(u16::from_le_bytes([len_bytes[0], len_bytes[1]]));

            let name_bytes = Self::take(dir, &mut cursor, name_len)?;
            let name = std::str::from_utf8(name_bytes)
                .map_err(|_| StorageError::invalid_format("section name is not UTF-8"))?
                .to_string();

            let offset_bytes = Self::take(dir, &mut cursor, 8)?;
            let offset = u64::from_le_bytes(offset_bytes.try_into().unwrap_or([0; 8]));
            let size_bytes = Self::take(dir, &mut cursor, 8)?;
            let len = u64::from_le_bytes(size_bytes.try_into().unwrap_or([0; 8]));

            if offset < HEADER_SIZE || offset.saturating_add(len) > dir_offset {
                return Err(StorageError::invalid_format(format!(
                    "section {name} extends beyond payload area"
                )));
            }
            if sections.insert(name.clone(), SectionInfo { offset, len }).is_some() {
                return Err(StorageError::DuplicateSection { name });
            }
        }

        Ok(sections)
    }

    /// Returns the path of the container file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether a section with this name exists.
    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Returns the location of a section.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::SectionNotFound`] if the name is unknown.
    pub fn section(&self, name: &str) -> StorageResult<SectionInfo> {
        self.sections
            .get(name)
            .copied()
            .ok_or_else(|| StorageError::section_not_found(name))
    }

    /// Reads an entire section into an owned buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is unknown or the read fails.
    pub fn read_section(&self, name: &str) -> StorageResult<Vec<u8>> {
        let info = self.section(name)?;
        self.read_range(info.offset, info.len as usize)
    }

    /// Reads `len` bytes starting at `offset` within a section.
    ///
    /// Used to peek fixed-size headers of large sections without mapping
    /// or copying the whole section.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadPastEnd`] if the range does not fit
    /// inside the section.
    pub fn read_section_at(&self, name: &str, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let info = self.section(name)?;
        let end = offset.saturating_add(len as u64);
        if end > info.len {
            return Err(StorageError::ReadPastEnd {
                name: name.to_string(),
                offset,
                len,
                size: info.len,
            });
        }
        self.read_range(info.offset + offset, len)
    }

    /// Memory-maps a section and returns an owning handle to its bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is unknown or the mapping fails.
    pub fn map_section(&self, name: &str) -> StorageResult<SectionHandle> {
        let info = self.section(name)?;

        let offset = usize::try_from(info.offset)
            .map_err(|_| StorageError::invalid_format("section offset exceeds address space"))?;
        let len = usize::try_from(info.len)
            .map_err(|_| StorageError::invalid_format("section length exceeds address space"))?;

        let file = self.file.read();
        // Safety: the container file is written once and never modified
        // after `ContainerWriter::finish`; the mapping outlives no writer.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&*file)? };

        if mmap.len() < offset + len {
            return Err(StorageError::invalid_format(
                "container file shorter than its directory claims",
            ));
        }

        Ok(SectionHandle::new(mmap, offset, len))
    }

    fn read_range(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        debug_assert!(offset.saturating_add(len as u64) <= self.size);

        if len == 0 {
            return Ok(Vec::new());
        }

        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer)?;

        Ok(buffer)
    }
}
