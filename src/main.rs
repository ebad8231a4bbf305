use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::PathBuf;

use bgcode::block::BlockType;
use bgcode::header::FileHeader;
use bgcode::payload::MetadataBlock;
use bgcode::stream;

#[derive(Parser)]
#[command(name = "bgcode", about = "The binary G-code (.bgcode) format CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a .bgcode file to plain ascii gcode
    Decode {
        input: PathBuf,
        /// Output path (defaults to the input with a .gcode extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Skip per-block checksum verification
        #[arg(long)]
        no_verify: bool,
    },
    /// Validate file structure and block checksums
    Check {
        input: PathBuf,
    },
    /// Print the block table
    Info {
        input: PathBuf,
    },
    /// Print the metadata sections
    Meta {
        input: PathBuf,
        /// Emit JSON instead of key = value lines
        #[arg(long)]
        json: bool,
    },
}

#[derive(Default, serde::Serialize)]
struct MetadataDump {
    file: Option<MetadataBlock>,
    printer: Option<MetadataBlock>,
    print: Option<MetadataBlock>,
    slicer: Option<MetadataBlock>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        // ── Decode ───────────────────────────────────────────────────────────
        Commands::Decode {
            input,
            output,
            no_verify,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("gcode"));
            let mut src = BufReader::new(File::open(&input)?);
            let mut dst = BufWriter::new(File::create(&output)?);
            bgcode::binary_to_ascii(&mut src, &mut dst, !no_verify)?;
            dst.flush()?;
            println!("Converted: {}", output.display());
        }

        // ── Check ────────────────────────────────────────────────────────────
        Commands::Check { input } => {
            let mut src = BufReader::new(File::open(&input)?);
            stream::is_valid(&mut src, true)?;
            println!("OK: {}", input.display());
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            let mut src = BufReader::new(File::open(&input)?);
            let file_size = src.seek(SeekFrom::End(0))?;
            src.seek(SeekFrom::Start(0))?;
            let file_header = FileHeader::read(&mut src)?;

            println!("── .bgcode file ─────────────────────────────────────────");
            println!("  Path       {}", input.display());
            println!("  Version    {}", file_header.version);
            println!("  Checksum   {:?}", file_header.checksum);
            println!(
                "{:<4} {:<18} {:>12} {:>12}  Compression",
                "#", "Block", "Size", "Stored"
            );

            let mut index = 0usize;
            while src.stream_position()? < file_size {
                let header = stream::read_next_block_header(&mut src, &file_header, false)?;
                println!(
                    "{:<4} {:<18} {:>12} {:>12}  {:?}",
                    index,
                    header.block_type.to_string(),
                    header.uncompressed_size,
                    header.stored_data_size(),
                    header.compression
                );
                stream::skip_block_payload(&mut src, &file_header, &header)?;
                index += 1;
            }
        }

        // ── Meta ─────────────────────────────────────────────────────────────
        Commands::Meta { input, json } => {
            let mut src = BufReader::new(File::open(&input)?);
            let file_size = src.seek(SeekFrom::End(0))?;
            src.seek(SeekFrom::Start(0))?;
            let file_header = FileHeader::read(&mut src)?;

            let mut dump = MetadataDump::default();
            while src.stream_position()? < file_size {
                let header = stream::read_next_block_header(&mut src, &file_header, false)?;
                let slot = match header.block_type {
                    BlockType::FileMetadata => Some(&mut dump.file),
                    BlockType::PrinterMetadata => Some(&mut dump.printer),
                    BlockType::PrintMetadata => Some(&mut dump.print),
                    BlockType::SlicerMetadata => Some(&mut dump.slicer),
                    _ => None,
                };
                match slot {
                    Some(slot) => {
                        *slot = Some(MetadataBlock::read_data(&mut src, &file_header, &header)?)
                    }
                    None => stream::skip_block_payload(&mut src, &file_header, &header)?,
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&dump)?);
            } else {
                print_section("file", &dump.file);
                print_section("printer", &dump.printer);
                print_section("print", &dump.print);
                print_section("slicer", &dump.slicer);
            }
        }
    }

    Ok(())
}

fn print_section(name: &str, metadata: &Option<MetadataBlock>) {
    let Some(metadata) = metadata else { return };
    println!("[{name}]");
    for (key, value) in &metadata.entries {
        println!("{key} = {value}");
    }
}
