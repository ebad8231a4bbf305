//! Binary → ASCII conversion.
//!
//! [`binary_to_ascii`] walks the block stream in its mandated order and
//! re-renders each payload into the legacy textual convention: a producer
//! banner, `; key = value` metadata lines, base64-wrapped thumbnail regions
//! and the instruction stream with noise lines removed.
//!
//! The traversal reads forward once and backtracks once: the header that
//! terminates the thumbnail loop is the first gcode block, so its offset is
//! saved and the instruction stream is re-entered from that saved position.
//! The same discipline applies inside the instruction loop, where the offset
//! is re-saved before each speculative header read so the terminating
//! non-gcode block is left for the print-metadata expectation.
//!
//! The reverse direction is declared but not implemented; see
//! [`ascii_to_binary`].

mod sequence;
mod text;

use base64::{engine::general_purpose, Engine as _};
use std::io::{self, Read, Seek, SeekFrom, Write};
use thiserror::Error;
use tracing::trace;

use crate::block::{BlockError, BlockType};
use crate::header::{FileHeader, HeaderError};
use crate::payload::{GCodeBlock, MetadataBlock, PayloadError, ThumbnailBlock, ThumbnailFormat};
use crate::stream::{self, StreamError};
use sequence::Expect;

/// Comment lines in the textual convention wrap base64 data at this width.
const MAX_ROW_LENGTH: usize = 78;

/// Closed taxonomy of conversion failures.  None of them are retriable; the
/// output sink holds whatever was written before the failure and callers
/// should discard it.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("not a valid binary gcode file: {0}")]
    InvalidFormat(#[source] HeaderError),
    #[error("invalid block sequence: unexpected {found} block")]
    InvalidSequence { found: BlockType },
    #[error("checksum mismatch in {0} block")]
    ChecksumMismatch(BlockType),
    #[error("cannot decode block stream: {0}")]
    Decode(Box<dyn std::error::Error + Send + Sync>),
    #[error("write error: {0}")]
    Write(#[source] io::Error),
}

impl From<HeaderError> for ConvertError {
    fn from(err: HeaderError) -> Self {
        ConvertError::InvalidFormat(err)
    }
}

impl From<PayloadError> for ConvertError {
    fn from(err: PayloadError) -> Self {
        ConvertError::Decode(Box::new(err))
    }
}

impl From<BlockError> for ConvertError {
    fn from(err: BlockError) -> Self {
        match err {
            BlockError::ChecksumMismatch(block) => ConvertError::ChecksumMismatch(block),
            BlockError::UnexpectedBlock { found, .. } => ConvertError::InvalidSequence { found },
            other => ConvertError::Decode(Box::new(other)),
        }
    }
}

impl From<StreamError> for ConvertError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Header(e) => e.into(),
            StreamError::Block(e) => e.into(),
            StreamError::Io(e) => ConvertError::Decode(Box::new(e)),
        }
    }
}

fn cursor_failed(err: io::Error) -> ConvertError {
    ConvertError::Decode(Box::new(err))
}

fn advance(expect: Expect, found: BlockType) -> Result<Expect, ConvertError> {
    expect
        .accept(found)
        .ok_or(ConvertError::InvalidSequence { found })
}

/// Converts a binary gcode stream into its ascii textual form.
///
/// The input is validated first (with per-block checksum verification when
/// `verify_checksum` is set), then converted in a single pass plus one
/// rewind.  On failure the sink is left in a partial state; nothing is
/// rolled back.
pub fn binary_to_ascii<R, W>(
    src: &mut R,
    dst: &mut W,
    verify_checksum: bool,
) -> Result<(), ConvertError>
where
    R: Read + Seek,
    W: Write,
{
    stream::is_valid(src, verify_checksum)?;

    let file_size = src.seek(SeekFrom::End(0)).map_err(cursor_failed)?;
    src.seek(SeekFrom::Start(0)).map_err(cursor_failed)?;
    let file_header = FileHeader::read(&mut *src)?;
    let mut expect = Expect::FileMetadata;

    // file metadata: rendered as a single producer banner
    let header = stream::read_next_block_header(src, &file_header, verify_checksum)?;
    expect = advance(expect, header.block_type)?;
    let file_metadata = MetadataBlock::read_data(src, &file_header, &header)?;
    render_banner(dst, &file_metadata)?;

    // printer metadata
    let header = stream::read_next_block_header(src, &file_header, verify_checksum)?;
    expect = advance(expect, header.block_type)?;
    let printer_metadata = MetadataBlock::read_data(src, &file_header, &header)?;
    render_metadata(dst, &printer_metadata)?;

    // thumbnails; `restore` always names the offset of the last header read,
    // so when the loop terminates it points at the first gcode block
    let mut restore = src.stream_position().map_err(cursor_failed)?;
    let mut header = stream::read_next_block_header(src, &file_header, verify_checksum)?;
    while header.block_type == BlockType::Thumbnail {
        expect = advance(expect, header.block_type)?;
        let thumbnail = ThumbnailBlock::read_data(src, &file_header, &header)?;
        render_thumbnail(dst, &thumbnail)?;
        restore = src.stream_position().map_err(cursor_failed)?;
        header = stream::read_next_block_header(src, &file_header, verify_checksum)?;
    }
    trace!(restore, "thumbnail loop terminated");

    // instruction stream, re-entered from the restore point so the
    // terminating header above is re-derived under a strict expectation
    emit(dst, "\n")?;
    src.seek(SeekFrom::Start(restore)).map_err(cursor_failed)?;
    let mut header =
        stream::read_next_block_header_of_type(src, &file_header, BlockType::GCode, verify_checksum)?;
    loop {
        expect = advance(expect, header.block_type)?;
        let gcode = GCodeBlock::read_data(src, &file_header, &header)?;
        render_gcode(dst, &gcode)?;
        restore = src.stream_position().map_err(cursor_failed)?;
        if restore == file_size {
            break;
        }
        header = stream::read_next_block_header(src, &file_header, verify_checksum)?;
        if header.block_type != BlockType::GCode {
            // not consumed: rewind so the tail section re-reads it
            src.seek(SeekFrom::Start(restore)).map_err(cursor_failed)?;
            break;
        }
    }

    // print metadata
    let header = stream::read_next_block_header(src, &file_header, verify_checksum)?;
    expect = advance(expect, header.block_type)?;
    let print_metadata = MetadataBlock::read_data(src, &file_header, &header)?;
    emit(dst, "\n")?;
    render_metadata(dst, &print_metadata)?;

    // slicer metadata
    let header = stream::read_next_block_header(src, &file_header, verify_checksum)?;
    expect = advance(expect, header.block_type)?;
    let slicer_metadata = MetadataBlock::read_data(src, &file_header, &header)?;
    emit(dst, "\n; prusaslicer_config = begin\n")?;
    render_metadata(dst, &slicer_metadata)?;
    emit(dst, "; prusaslicer_config = end\n\n")?;

    debug_assert_eq!(expect, Expect::Done);
    Ok(())
}

/// Reverse direction placeholder.  The textual → binary path is not
/// implemented: the call succeeds without reading or writing anything, and
/// its behavior must not be relied upon for round-tripping.
pub fn ascii_to_binary<R, W>(_src: &mut R, _dst: &mut W) -> Result<(), ConvertError>
where
    R: Read,
    W: Write,
{
    Ok(())
}

// ── Renderers ────────────────────────────────────────────────────────────────

fn emit<W: Write>(dst: &mut W, line: &str) -> Result<(), ConvertError> {
    dst.write_all(line.as_bytes()).map_err(ConvertError::Write)
}

fn render_banner<W: Write>(dst: &mut W, metadata: &MetadataBlock) -> Result<(), ConvertError> {
    let producer = metadata.lookup("Producer").unwrap_or("Unknown");
    emit(dst, &format!("; generated by {producer}\n\n\n"))
}

fn render_metadata<W: Write>(dst: &mut W, metadata: &MetadataBlock) -> Result<(), ConvertError> {
    for (key, value) in &metadata.entries {
        emit(dst, &format!("; {key} = {value}\n"))?;
    }
    Ok(())
}

fn render_thumbnail<W: Write>(dst: &mut W, thumbnail: &ThumbnailBlock) -> Result<(), ConvertError> {
    let label = match thumbnail.image_format() {
        Some(ThumbnailFormat::Jpg) => "thumbnail_JPG",
        Some(ThumbnailFormat::Qoi) => "thumbnail_QOI",
        // unknown formats render under the PNG label
        _ => "thumbnail",
    };
    let encoded = general_purpose::STANDARD.encode(&thumbnail.data);
    emit(
        dst,
        &format!(
            "\n;\n; {label} begin {}x{} {}\n",
            thumbnail.width,
            thumbnail.height,
            encoded.len()
        ),
    )?;
    // base64 output is pure ASCII, so byte-width splits are char-safe
    let mut rest = encoded.as_str();
    while rest.len() > MAX_ROW_LENGTH {
        let (row, tail) = rest.split_at(MAX_ROW_LENGTH);
        emit(dst, &format!("; {row}\n"))?;
        rest = tail;
    }
    if !rest.is_empty() {
        emit(dst, &format!("; {rest}\n"))?;
    }
    emit(dst, &format!("; {label} end\n;\n"))
}

fn render_gcode<W: Write>(dst: &mut W, block: &GCodeBlock) -> Result<(), ConvertError> {
    let cleaned = text::strip_noise(&block.text);
    if cleaned.is_empty() {
        return Ok(());
    }
    emit(dst, &cleaned)
}
