use crate::error::CatalogMergeError;
use std::fs::File;
use std::io::BufReader;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::Path;

/// Signature of an OLE compound document: encrypted OOXML packages and legacy `.xls` files.
const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Byte source of a workbook: a local file or an in-memory buffer
pub(crate) enum WorkbookSource {
    /// Local file reader
    Local(BufReader<File>),
    /// In-memory workbook bytes
    Memory(Cursor<Vec<u8>>),
}

impl WorkbookSource {
    pub(crate) fn open(path: &Path) -> Result<WorkbookSource, CatalogMergeError> {
        let file = File::open(path)?;
        Ok(WorkbookSource::Local(BufReader::new(file)))
    }

    pub(crate) fn from_bytes(bytes: Vec<u8>) -> WorkbookSource {
        WorkbookSource::Memory(Cursor::new(bytes))
    }

    /// Checks whether the source is an OLE compound document rather than a zip package.
    /// Leaves the cursor at the start of the source.
    pub(crate) fn is_compound_document(&mut self) -> Result<bool, CatalogMergeError> {
        let mut signature = [0u8; 8];
        let mut filled = 0usize;
        while filled < signature.len() {
            match self.read(&mut signature[filled..])? {
                0 => break,
                count => filled += count,
            }
        }
        self.seek(SeekFrom::Start(0))?;
        Ok(filled == signature.len() && signature == OLE_SIGNATURE)
    }
}

impl Read for WorkbookSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            WorkbookSource::Local(reader) => reader.read(buf),
            WorkbookSource::Memory(reader) => reader.read(buf),
        }
    }
}

impl Seek for WorkbookSource {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            WorkbookSource::Local(reader) => reader.seek(pos),
            WorkbookSource::Memory(reader) => reader.seek(pos),
        }
    }
}
