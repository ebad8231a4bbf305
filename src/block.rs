use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{self, Read, Write};
use thiserror::Error;

use crate::header::FileHeader;

#[derive(Error, Debug)]
pub enum BlockError {
    #[error("unknown block type: {0}")]
    UnknownBlockType(u16),
    #[error("unknown compression: {0}")]
    UnknownCompression(u16),
    #[error("checksum mismatch in {0} block")]
    ChecksumMismatch(BlockType),
    #[error("expected {expected} block, found {found}")]
    UnexpectedBlock {
        expected: BlockType,
        found: BlockType,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Closed set of block kinds a file may contain.
///
/// A well-formed file carries them in this order: file metadata, printer
/// metadata, zero or more thumbnails, one or more gcode blocks, print
/// metadata, slicer metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    FileMetadata,
    GCode,
    SlicerMetadata,
    PrinterMetadata,
    PrintMetadata,
    Thumbnail,
}

impl BlockType {
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(BlockType::FileMetadata),
            1 => Some(BlockType::GCode),
            2 => Some(BlockType::SlicerMetadata),
            3 => Some(BlockType::PrinterMetadata),
            4 => Some(BlockType::PrintMetadata),
            5 => Some(BlockType::Thumbnail),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u16 {
        match self {
            BlockType::FileMetadata => 0,
            BlockType::GCode => 1,
            BlockType::SlicerMetadata => 2,
            BlockType::PrinterMetadata => 3,
            BlockType::PrintMetadata => 4,
            BlockType::Thumbnail => 5,
        }
    }

    /// Size of the per-type parameter words sitting between the block header
    /// and the payload.  Metadata and gcode blocks carry an encoding word,
    /// thumbnails carry format, width and height.
    pub fn parameters_size(self) -> u64 {
        match self {
            BlockType::Thumbnail => 6,
            _ => 2,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::FileMetadata => write!(f, "file metadata"),
            BlockType::GCode => write!(f, "gcode"),
            BlockType::SlicerMetadata => write!(f, "slicer metadata"),
            BlockType::PrinterMetadata => write!(f, "printer metadata"),
            BlockType::PrintMetadata => write!(f, "print metadata"),
            BlockType::Thumbnail => write!(f, "thumbnail"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Deflate,
}

impl Compression {
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Compression::None),
            1 => Some(Compression::Deflate),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u16 {
        match self {
            Compression::None => 0,
            Compression::Deflate => 1,
        }
    }
}

/// Per-block header.  `compressed_size` is stored on disk only when the
/// block is compressed; for uncompressed blocks it is 0.
#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub block_type: BlockType,
    pub compression: Compression,
    pub uncompressed_size: u32,
    pub compressed_size: u32,
}

impl BlockHeader {
    pub fn new(
        block_type: BlockType,
        compression: Compression,
        uncompressed_size: u32,
        compressed_size: u32,
    ) -> Self {
        Self {
            block_type,
            compression,
            uncompressed_size,
            compressed_size,
        }
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self, BlockError> {
        let raw_type = reader.read_u16::<LittleEndian>()?;
        let block_type =
            BlockType::from_raw(raw_type).ok_or(BlockError::UnknownBlockType(raw_type))?;
        let raw_compression = reader.read_u16::<LittleEndian>()?;
        let compression = Compression::from_raw(raw_compression)
            .ok_or(BlockError::UnknownCompression(raw_compression))?;
        let uncompressed_size = reader.read_u32::<LittleEndian>()?;
        let compressed_size = match compression {
            Compression::None => 0,
            _ => reader.read_u32::<LittleEndian>()?,
        };
        Ok(Self {
            block_type,
            compression,
            uncompressed_size,
            compressed_size,
        })
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.block_type.as_raw())?;
        writer.write_u16::<LittleEndian>(self.compression.as_raw())?;
        writer.write_u32::<LittleEndian>(self.uncompressed_size)?;
        if self.compression != Compression::None {
            writer.write_u32::<LittleEndian>(self.compressed_size)?;
        }
        Ok(())
    }

    /// Encoded header bytes, exactly as written to disk.  The block checksum
    /// covers these bytes plus parameters plus payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(12);
        let _ = self.write(&mut buf);
        buf
    }

    /// Payload bytes as stored on disk (compressed size when compressed).
    pub fn stored_data_size(&self) -> u64 {
        match self.compression {
            Compression::None => u64::from(self.uncompressed_size),
            _ => u64::from(self.compressed_size),
        }
    }

    /// Parameters plus stored payload; everything between the header and the
    /// checksum trailer.
    pub fn content_size(&self) -> u64 {
        self.block_type.parameters_size() + self.stored_data_size()
    }

    /// Everything following the header: parameters, payload, checksum.
    pub fn tail_size(&self, file_header: &FileHeader) -> u64 {
        self.content_size() + file_header.checksum.trailer_size()
    }
}
