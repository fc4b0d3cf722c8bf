//! Write-once container builder.

use crate::error::{StorageError, StorageResult};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Magic bytes identifying a section container file.
pub const CONTAINER_MAGIC: [u8; 4] = *b"FSMC";

/// Current container format version.
pub const CONTAINER_VERSION: u16 = 1;

/// Size of the container header: magic (4) + version (2).
pub(crate) const HEADER_SIZE: u64 = 6;

/// Size of the trailing directory-offset field.
pub(crate) const FOOTER_SIZE: u64 = 8;

#[derive(Debug)]
struct SectionEntry {
    name: String,
    offset: u64,
    len: u64,
}

/// Builds a section container file.
///
/// Sections are written back to back in call order; each name may be
/// written exactly once. [`finish`](ContainerWriter::finish) appends the
/// section directory and syncs the file. A writer that is dropped without
/// `finish` leaves an unreadable file behind.
///
/// # Example
///
/// ```no_run
/// use ftsegmap_storage::ContainerWriter;
/// use std::path::Path;
///
/// let mut writer = ContainerWriter::create(Path::new("index.bin")).unwrap();
/// writer.write_section("ftseg", &[1, 2, 3]).unwrap();
/// writer.finish().unwrap();
/// ```
#[derive(Debug)]
pub struct ContainerWriter {
    path: PathBuf,
    file: File,
    sections: Vec<SectionEntry>,
    cursor: u64,
}

impl ContainerWriter {
    /// Creates a new container file at the given path, truncating any
    /// existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the header cannot
    /// be written.
    pub fn create(path: &Path) -> StorageResult<Self> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        file.write_all(&CONTAINER_MAGIC)?;
        file.write_all(&CONTAINER_VERSION.to_le_bytes())?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sections: Vec::new(),
            cursor: HEADER_SIZE,
        })
    }

    /// Writes one named section.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DuplicateSection`] if the name was already
    /// written, or an I/O error.
    pub fn write_section(&mut self, name: &str, data: &[u8]) -> StorageResult<()> {
        if self.sections.iter().any(|s| s.name == name) {
            return Err(StorageError::DuplicateSection {
                name: name.to_string(),
            });
        }
        if name.is_empty() || name.len() > usize::from(u16::MAX) {
            return Err(StorageError::invalid_format("invalid section name length"));
        }

        self.file.write_all(data)?;
        self.sections.push(SectionEntry {
            name: name.to_string(),
            offset: self.cursor,
            len: data.len() as u64,
        });
        self.cursor += data.len() as u64;

        Ok(())
    }

    /// Returns the path of the container being written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finalizes the container: writes the section directory and the
    /// trailing directory offset, then syncs everything to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or syncing fails.
    pub fn finish(mut self) -> StorageResult<()> {
        let dir_offset = self.cursor;

        let mut dir = Vec::new();
        let count = u32::try_from(self.sections.len())
            .map_err(|_| StorageError::invalid_format("too many sections"))?;
        dir.extend_from_slice(&count.to_le_bytes());
        for entry in &self.sections {
            let name_bytes = entry.name.as_bytes();
            dir.extend_from_slice(&(name_bytes.len() as u16).to_le_bytes());
            dir.extend_from_slice(name_bytes);
            dir.extend_from_slice(&entry.offset.to_le_bytes());
            dir.extend_from_slice(&entry.len.to_le_bytes());
        }

        self.file.write_all(&dir)?;
        self.file.write_all(&dir_offset.to_le_bytes())?;
        self.file.sync_all()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_writes_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.bin");

        let writer = ContainerWriter::create(&path).unwrap();
        drop(writer);

        let data = std::fs::read(&path).unwrap();
        assert_eq!(&data[0..4], &CONTAINER_MAGIC);
        assert_eq!(u16::from_le_bytes([data[4], data[5]]), CONTAINER_VERSION);
    }

    #[test]
    fn duplicate_section_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.bin");

        let mut writer = ContainerWriter::create(&path).unwrap();
        writer.write_section("a", b"one").unwrap();

        let result = writer.write_section("a", b"two");
        assert!(matches!(result, Err(StorageError::DuplicateSection { .. })));
    }

    #[test]
    fn empty_section_name_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.bin");

        let mut writer = ContainerWriter::create(&path).unwrap();
        let result = writer.write_section("", b"data");
        assert!(matches!(result, Err(StorageError::InvalidFormat { .. })));
    }

    #[test]
    fn writer_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.bin");

        let writer = ContainerWriter::create(&path).unwrap();
        assert_eq!(writer.path(), path);
    }
}
