use miniz_oxide::deflate::compress_to_vec;
use miniz_oxide::inflate::decompress_to_vec_with_limit;
use thiserror::Error;

use crate::block::Compression;

/// Default deflate level for newly written blocks.
pub const DEFAULT_COMPRESSION_LEVEL: u8 = 6;

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("corrupt deflate stream: {0}")]
    Corrupt(String),
    #[error("decompressed size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

pub fn compress(kind: Compression, data: &[u8], level: u8) -> Vec<u8> {
    match kind {
        Compression::None => data.to_vec(),
        Compression::Deflate => compress_to_vec(data, level),
    }
}

/// Restores a block payload to its declared uncompressed size.  The size
/// declared in the block header is authoritative; a payload that inflates to
/// anything else is rejected.
pub fn decompress(
    kind: Compression,
    data: &[u8],
    uncompressed_size: usize,
) -> Result<Vec<u8>, CompressionError> {
    let out = match kind {
        Compression::None => data.to_vec(),
        Compression::Deflate => decompress_to_vec_with_limit(data, uncompressed_size)
            .map_err(|e| CompressionError::Corrupt(format!("{:?}", e.status)))?,
    };
    if out.len() != uncompressed_size {
        return Err(CompressionError::SizeMismatch {
            expected: uncompressed_size,
            actual: out.len(),
        });
    }
    Ok(out)
}
