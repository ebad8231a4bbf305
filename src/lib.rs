pub mod block;
pub mod compression;
pub mod convert;
pub mod header;
pub mod payload;
pub mod stream;

pub use block::{BlockHeader, BlockType, Compression};
pub use convert::{ascii_to_binary, binary_to_ascii, ConvertError};
pub use header::{ChecksumKind, FileHeader};
pub use payload::{GCodeBlock, MetadataBlock, ThumbnailBlock, ThumbnailFormat};
