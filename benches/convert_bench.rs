use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::Cursor;

use bgcode::block::BlockType;
use bgcode::header::{ChecksumKind, FileHeader};
use bgcode::payload::{GCodeBlock, MetadataBlock, ThumbnailBlock, ThumbnailFormat};
use bgcode::{binary_to_ascii, Compression};

fn build_sample(lines: usize, compression: Compression) -> Vec<u8> {
    let file_header = FileHeader::new(ChecksumKind::Crc32);
    let mut cur = Cursor::new(Vec::new());
    file_header.write(&mut cur).unwrap();

    MetadataBlock::new([("Producer", "BenchSlicer 1.0")])
        .write_data(&mut cur, &file_header, BlockType::FileMetadata, compression)
        .unwrap();
    MetadataBlock::new([("printer_model", "MK4"), ("nozzle_diameter", "0.4")])
        .write_data(&mut cur, &file_header, BlockType::PrinterMetadata, compression)
        .unwrap();
    ThumbnailBlock::new(ThumbnailFormat::Png, 220, 124, vec![0x5A; 9000])
        .write_data(&mut cur, &file_header, compression)
        .unwrap();

    let mut blob = String::new();
    for i in 0..lines {
        blob.push_str(&format!("G1 X{} Y{} E1.5\n", i % 200, i % 180));
        if i % 40 == 0 {
            blob.push_str("; layer change\n\n");
        }
    }
    GCodeBlock::new(blob)
        .write_data(&mut cur, &file_header, compression)
        .unwrap();

    MetadataBlock::new([("estimated printing time", "2h 11m")])
        .write_data(&mut cur, &file_header, BlockType::PrintMetadata, compression)
        .unwrap();
    MetadataBlock::new([("layer_height", "0.2"), ("fill_density", "15%")])
        .write_data(&mut cur, &file_header, BlockType::SlicerMetadata, compression)
        .unwrap();
    cur.into_inner()
}

fn bench_decode(c: &mut Criterion) {
    let plain = build_sample(20_000, Compression::None);
    let deflated = build_sample(20_000, Compression::Deflate);

    c.bench_function("binary_to_ascii_verified", |b| {
        b.iter(|| {
            let mut src = Cursor::new(black_box(&plain));
            let mut out = Vec::with_capacity(plain.len());
            binary_to_ascii(&mut src, &mut out, true).unwrap();
            out
        })
    });

    c.bench_function("binary_to_ascii_unverified", |b| {
        b.iter(|| {
            let mut src = Cursor::new(black_box(&plain));
            let mut out = Vec::with_capacity(plain.len());
            binary_to_ascii(&mut src, &mut out, false).unwrap();
            out
        })
    });

    c.bench_function("binary_to_ascii_deflate", |b| {
        b.iter(|| {
            let mut src = Cursor::new(black_box(&deflated));
            let mut out = Vec::with_capacity(plain.len());
            binary_to_ascii(&mut src, &mut out, true).unwrap();
            out
        })
    });
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
