use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use thiserror::Error;

pub const MAGIC: &[u8; 4] = b"GCDE";
pub const VERSION: u32 = 1;
/// magic + version + checksum kind
pub const FILE_HEADER_SIZE: u64 = 10;

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("invalid magic number")]
    InvalidMagic,
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u32),
    #[error("unknown checksum kind: {0}")]
    UnknownChecksumKind(u16),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Integrity scheme declared once in the file header and applied to every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    None,
    Crc32,
}

impl ChecksumKind {
    pub fn from_raw(raw: u16) -> Result<Self, HeaderError> {
        match raw {
            0 => Ok(ChecksumKind::None),
            1 => Ok(ChecksumKind::Crc32),
            other => Err(HeaderError::UnknownChecksumKind(other)),
        }
    }

    pub fn as_raw(self) -> u16 {
        match self {
            ChecksumKind::None => 0,
            ChecksumKind::Crc32 => 1,
        }
    }

    /// Bytes appended after each block's payload.
    pub fn trailer_size(self) -> u64 {
        match self {
            ChecksumKind::None => 0,
            ChecksumKind::Crc32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub checksum: ChecksumKind,
}

impl FileHeader {
    pub fn new(checksum: ChecksumKind) -> Self {
        Self {
            magic: *MAGIC,
            version: VERSION,
            checksum,
        }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u16::<LittleEndian>(self.checksum.as_raw())?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self, HeaderError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(HeaderError::InvalidMagic);
        }
        let version = reader.read_u32::<LittleEndian>()?;
        if version != VERSION {
            return Err(HeaderError::UnsupportedVersion(version));
        }
        let checksum = ChecksumKind::from_raw(reader.read_u16::<LittleEndian>()?)?;
        Ok(Self {
            magic,
            version,
            checksum,
        })
    }
}
