//! Block-stream primitives — validation, traversal and writing.
//!
//! # Reading
//! [`read_next_block_header`] decodes the header at the cursor and, when
//! asked, verifies the block checksum by hashing header, parameters and
//! payload against the stored trailer, then repositions the cursor just past
//! the header so a payload decoder can take over.  [`skip_block_payload`]
//! advances past a block without decoding it.
//!
//! # Validation
//! [`is_valid`] confirms magic and version, and with verification enabled
//! walks every block in the file checking its checksum.  The cursor position
//! after a successful call is unspecified; callers reposition explicitly.
//!
//! # Writing
//! [`write_block`] assembles header + parameters + payload, compressing and
//! checksumming per the file header.  The typed payloads in
//! [`crate::payload`] build on it.
//!
//! # Endianness
//! All on-disk integers are little-endian; see `header.rs` and `block.rs`
//! for field-level layout.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;
use std::io::{self, Read, Seek, SeekFrom, Write};
use thiserror::Error;
use tracing::{debug, trace};

use crate::block::{BlockError, BlockHeader, BlockType, Compression};
use crate::compression::{compress, DEFAULT_COMPRESSION_LEVEL};
use crate::header::{ChecksumKind, FileHeader, HeaderError};

#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Structural validation.
///
/// Always checks magic and version.  With `verify_checksum` set it also
/// walks the whole block stream verifying every block's checksum trailer.
pub fn is_valid<R: Read + Seek>(reader: &mut R, verify_checksum: bool) -> Result<(), StreamError> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;
    let file_header = FileHeader::read(&mut *reader)?;
    if !verify_checksum {
        return Ok(());
    }
    let mut position = reader.stream_position()?;
    while position < file_size {
        let header = read_next_block_header(reader, &file_header, true)?;
        skip_block_payload(reader, &file_header, &header)?;
        position = reader.stream_position()?;
        trace!(block = %header.block_type, position, "validated block");
    }
    Ok(())
}

/// Reads the next block header.  With `verify_checksum` set (and a file
/// header that declares checksums) the block's checksum is verified before
/// returning; the cursor ends up just past the header either way.
pub fn read_next_block_header<R: Read + Seek>(
    reader: &mut R,
    file_header: &FileHeader,
    verify_checksum: bool,
) -> Result<BlockHeader, BlockError> {
    let header = BlockHeader::read(&mut *reader)?;
    debug!(
        block = %header.block_type,
        uncompressed = header.uncompressed_size,
        stored = header.stored_data_size(),
        "read block header"
    );
    if verify_checksum && file_header.checksum == ChecksumKind::Crc32 {
        verify_block_checksum(reader, &header)?;
    }
    Ok(header)
}

/// Convenience form of [`read_next_block_header`] that fails unless the
/// discovered type matches `expected`.
pub fn read_next_block_header_of_type<R: Read + Seek>(
    reader: &mut R,
    file_header: &FileHeader,
    expected: BlockType,
    verify_checksum: bool,
) -> Result<BlockHeader, BlockError> {
    let header = read_next_block_header(reader, file_header, verify_checksum)?;
    if header.block_type != expected {
        return Err(BlockError::UnexpectedBlock {
            expected,
            found: header.block_type,
        });
    }
    Ok(header)
}

/// Advances the cursor past a block's parameters, payload and checksum
/// without decoding anything.
pub fn skip_block_payload<R: Seek>(
    reader: &mut R,
    file_header: &FileHeader,
    header: &BlockHeader,
) -> Result<(), BlockError> {
    reader.seek(SeekFrom::Current(header.tail_size(file_header) as i64))?;
    Ok(())
}

fn verify_block_checksum<R: Read + Seek>(
    reader: &mut R,
    header: &BlockHeader,
) -> Result<(), BlockError> {
    let content_start = reader.stream_position()?;
    let mut hasher = Hasher::new();
    hasher.update(&header.to_bytes());
    let mut remaining = header.content_size();
    let mut buf = [0u8; 8192];
    while remaining > 0 {
        let take = remaining.min(buf.len() as u64) as usize;
        reader.read_exact(&mut buf[..take])?;
        hasher.update(&buf[..take]);
        remaining -= take as u64;
    }
    let stored = reader.read_u32::<LittleEndian>()?;
    if hasher.finalize() != stored {
        return Err(BlockError::ChecksumMismatch(header.block_type));
    }
    reader.seek(SeekFrom::Start(content_start))?;
    Ok(())
}

// ── Writing ──────────────────────────────────────────────────────────────────

/// Writes one complete block: header, parameters, payload (compressed per
/// `compression`) and, when the file header declares CRC32, the checksum
/// trailer covering all of the above.
pub fn write_block<W: Write>(
    writer: &mut W,
    file_header: &FileHeader,
    block_type: BlockType,
    compression: Compression,
    parameters: &[u8],
    payload: &[u8],
) -> io::Result<()> {
    debug_assert_eq!(parameters.len() as u64, block_type.parameters_size());
    let stored = compress(compression, payload, DEFAULT_COMPRESSION_LEVEL);
    let header = BlockHeader::new(
        block_type,
        compression,
        payload.len() as u32,
        stored.len() as u32,
    );
    let mut block = header.to_bytes();
    block.extend_from_slice(parameters);
    block.extend_from_slice(&stored);
    writer.write_all(&block)?;
    if file_header.checksum == ChecksumKind::Crc32 {
        let mut hasher = Hasher::new();
        hasher.update(&block);
        writer.write_u32::<LittleEndian>(hasher.finalize())?;
    }
    Ok(())
}
