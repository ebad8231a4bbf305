//! Typed payload decoders, one per block kind.
//!
//! Each `read_data` expects the stream cursor to sit immediately after the
//! block header (where [`crate::stream::read_next_block_header`] leaves it)
//! and consumes parameters, payload and checksum trailer, leaving the cursor
//! at the next block header.  Checksums are verified at header-read time,
//! never here.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Seek, SeekFrom, Write};
use thiserror::Error;

use crate::block::{BlockHeader, BlockType, Compression};
use crate::compression::{decompress, CompressionError};
use crate::header::FileHeader;
use crate::stream::write_block;

/// `key = value` text lines.
pub const METADATA_ENCODING_INI: u16 = 0;
/// Plain UTF-8 instruction lines.
pub const GCODE_ENCODING_PLAIN: u16 = 0;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("unsupported {block} encoding: {encoding}")]
    UnsupportedEncoding { block: BlockType, encoding: u16 },
    #[error(transparent)]
    Compression(#[from] CompressionError),
    #[error("payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("malformed metadata line: {0:?}")]
    MalformedMetadata(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Reads the stored payload, skips the checksum trailer and restores the
/// declared uncompressed bytes.
fn read_payload_bytes<R: Read + Seek>(
    reader: &mut R,
    file_header: &FileHeader,
    header: &BlockHeader,
) -> Result<Vec<u8>, PayloadError> {
    let mut stored = vec![0u8; header.stored_data_size() as usize];
    reader.read_exact(&mut stored)?;
    reader.seek(SeekFrom::Current(file_header.checksum.trailer_size() as i64))?;
    Ok(decompress(
        header.compression,
        &stored,
        header.uncompressed_size as usize,
    )?)
}

// ── Metadata ─────────────────────────────────────────────────────────────────

/// Ordered `(key, value)` pairs shared by the four metadata block kinds.
/// Keys are not required to be unique; [`MetadataBlock::lookup`] returns the
/// first match.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetadataBlock {
    pub entries: Vec<(String, String)>,
}

impl MetadataBlock {
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn read_data<R: Read + Seek>(
        reader: &mut R,
        file_header: &FileHeader,
        header: &BlockHeader,
    ) -> Result<Self, PayloadError> {
        let encoding = reader.read_u16::<LittleEndian>()?;
        if encoding != METADATA_ENCODING_INI {
            return Err(PayloadError::UnsupportedEncoding {
                block: header.block_type,
                encoding,
            });
        }
        let text = String::from_utf8(read_payload_bytes(reader, file_header, header)?)?;
        let mut entries = Vec::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| PayloadError::MalformedMetadata(line.to_string()))?;
            entries.push((key.trim().to_string(), value.trim().to_string()));
        }
        Ok(Self { entries })
    }

    fn to_ini(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    /// Writes this metadata as a block of the given kind, checksummed per the
    /// file header.
    pub fn write_data<W: Write>(
        &self,
        writer: &mut W,
        file_header: &FileHeader,
        block_type: BlockType,
        compression: Compression,
    ) -> io::Result<()> {
        let mut parameters = Vec::with_capacity(2);
        parameters.write_u16::<LittleEndian>(METADATA_ENCODING_INI)?;
        write_block(
            writer,
            file_header,
            block_type,
            compression,
            &parameters,
            self.to_ini().as_bytes(),
        )
    }
}

// ── Thumbnail ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFormat {
    Png,
    Jpg,
    Qoi,
}

impl ThumbnailFormat {
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(ThumbnailFormat::Png),
            1 => Some(ThumbnailFormat::Jpg),
            2 => Some(ThumbnailFormat::Qoi),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u16 {
        match self {
            ThumbnailFormat::Png => 0,
            ThumbnailFormat::Jpg => 1,
            ThumbnailFormat::Qoi => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ThumbnailFormat::Png => "PNG",
            ThumbnailFormat::Jpg => "JPG",
            ThumbnailFormat::Qoi => "QOI",
        }
    }
}

/// Raw encoded preview image.  `format` is kept as the on-disk word so an
/// unrecognised value survives a read; renderers fall back to the PNG label.
#[derive(Debug, Clone)]
pub struct ThumbnailBlock {
    pub format: u16,
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

impl ThumbnailBlock {
    pub fn new(format: ThumbnailFormat, width: u16, height: u16, data: Vec<u8>) -> Self {
        Self {
            format: format.as_raw(),
            width,
            height,
            data,
        }
    }

    pub fn image_format(&self) -> Option<ThumbnailFormat> {
        ThumbnailFormat::from_raw(self.format)
    }

    pub fn read_data<R: Read + Seek>(
        reader: &mut R,
        file_header: &FileHeader,
        header: &BlockHeader,
    ) -> Result<Self, PayloadError> {
        let format = reader.read_u16::<LittleEndian>()?;
        let width = reader.read_u16::<LittleEndian>()?;
        let height = reader.read_u16::<LittleEndian>()?;
        let data = read_payload_bytes(reader, file_header, header)?;
        Ok(Self {
            format,
            width,
            height,
            data,
        })
    }

    pub fn write_data<W: Write>(
        &self,
        writer: &mut W,
        file_header: &FileHeader,
        compression: Compression,
    ) -> io::Result<()> {
        let mut parameters = Vec::with_capacity(6);
        parameters.write_u16::<LittleEndian>(self.format)?;
        parameters.write_u16::<LittleEndian>(self.width)?;
        parameters.write_u16::<LittleEndian>(self.height)?;
        write_block(
            writer,
            file_header,
            BlockType::Thumbnail,
            compression,
            &parameters,
            &self.data,
        )
    }
}

// ── GCode ────────────────────────────────────────────────────────────────────

/// One chunk of the instruction stream: newline-delimited machine
/// instructions, possibly interleaved with comments and blank lines.
#[derive(Debug, Clone)]
pub struct GCodeBlock {
    pub text: String,
}

impl GCodeBlock {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn read_data<R: Read + Seek>(
        reader: &mut R,
        file_header: &FileHeader,
        header: &BlockHeader,
    ) -> Result<Self, PayloadError> {
        let encoding = reader.read_u16::<LittleEndian>()?;
        if encoding != GCODE_ENCODING_PLAIN {
            return Err(PayloadError::UnsupportedEncoding {
                block: header.block_type,
                encoding,
            });
        }
        let text = String::from_utf8(read_payload_bytes(reader, file_header, header)?)?;
        Ok(Self { text })
    }

    pub fn write_data<W: Write>(
        &self,
        writer: &mut W,
        file_header: &FileHeader,
        compression: Compression,
    ) -> io::Result<()> {
        let mut parameters = Vec::with_capacity(2);
        parameters.write_u16::<LittleEndian>(GCODE_ENCODING_PLAIN)?;
        write_block(
            writer,
            file_header,
            BlockType::GCode,
            compression,
            &parameters,
            self.text.as_bytes(),
        )
    }
}
