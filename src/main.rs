//! CramSeek CLI entry point
//!
//! Inspect CRAM files and run indexed region queries from the command line.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use cram_seek::core::{IoStrategy, QueryResult, ReaderOptions, ValidationStringency};
use cram_seek::formats::{is_cram_file, sam_header_text};
use cram_seek::{Container, Reader, ReaderBuilder};
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// Validation stringency (CLI enum)
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum StringencyArg {
    /// Fail on the first malformed structure
    #[default]
    #[value(name = "strict")]
    Strict,
    /// Warn and continue
    #[value(name = "lenient")]
    Lenient,
    /// Continue silently
    #[value(name = "silent")]
    Silent,
}

impl From<StringencyArg> for ValidationStringency {
    fn from(arg: StringencyArg) -> Self {
        match arg {
            StringencyArg::Strict => ValidationStringency::Strict,
            StringencyArg::Lenient => ValidationStringency::Lenient,
            StringencyArg::Silent => ValidationStringency::Silent,
        }
    }
}

#[derive(Parser)]
#[command(name = "cram-seek")]
#[command(about = "Indexed random-access reader for CRAM files")]
#[command(version)]
#[command(author = "CramSeek Contributors")]
struct Cli {
    /// How malformed containers and checksum mismatches are handled
    #[arg(long, global = true, default_value = "strict")]
    stringency: StringencyArg,

    /// Parse BAI indices once and keep them in memory
    #[arg(long = "index-cache", global = true)]
    index_cache: bool,

    /// Memory-map index files instead of buffered reads
    #[arg(long = "mmap-index", global = true)]
    mmap_index: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether files are CRAM
    Check {
        /// Files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the file definition and SAM header
    Header {
        /// Input CRAM file
        input: PathBuf,
    },
    /// List data containers
    Containers {
        /// Input CRAM file
        input: PathBuf,
        /// Also list the blocks of each container
        #[arg(long)]
        blocks: bool,
    },
    /// List containers overlapping a position
    Query {
        /// Input CRAM file
        input: PathBuf,
        /// Reference sequence name
        sequence: String,
        /// 1-based alignment start
        start: u32,
        /// Index file (default: <input>.crai or <input>.bai)
        #[arg(short = 'i', long)]
        index: Option<PathBuf>,
        /// Stop after this many containers
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// List containers after the last mapped one
    Unmapped {
        /// Input CRAM file
        input: PathBuf,
        /// Index file (default: <input>.crai or <input>.bai)
        #[arg(short = 'i', long)]
        index: Option<PathBuf>,
    },
}

fn reader_options(cli: &Cli) -> ReaderOptions {
    ReaderOptions {
        validation_stringency: cli.stringency.into(),
        enable_index_caching: cli.index_cache,
        index_io_strategy: if cli.mmap_index {
            IoStrategy::MemoryMapped
        } else {
            IoStrategy::Auto
        },
        ..Default::default()
    }
}

fn open_reader(input: &PathBuf, index: Option<PathBuf>, options: ReaderOptions) -> anyhow::Result<Reader> {
    let builder: ReaderBuilder = Reader::builder().file(input.clone()).options(options);
    let builder = match index {
        Some(path) => builder.index_file(path),
        None => builder.discover_index(),
    };
    builder
        .build()
        .with_context(|| format!("Failed to open {:?}", input))
}

fn print_container(container: &Container) {
    let h = &container.header;
    println!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        container.offset, h.reference_id, h.alignment_start, h.alignment_span, h.record_count, h.block_count
    );
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();
    let options = reader_options(&cli);

    match cli.command {
        Commands::Check { files } => {
            let mut cram = 0;
            for file in &files {
                let is_cram = is_cram_file(file).with_context(|| format!("Failed to read {:?}", file))?;
                if is_cram {
                    cram += 1;
                }
                println!("{}\t{}", file.display(), if is_cram { "CRAM" } else { "not CRAM" });
            }
            eprintln!("\n=== Format Check ===");
            eprintln!("Files checked:   {}", files.len());
            eprintln!("CRAM files:      {}", cram);
        }

        Commands::Header { input } => {
            let mut reader = open_reader(&input, None, options)?;
            let header = reader.file_header()?;
            eprintln!("CRAM version:    {}", header.version());
            eprintln!("Sequences:       {}", header.sam.reference_sequences().len());
            eprintln!("Data offset:     {}", header.data_offset);
            let text = sam_header_text(&header.sam)?;
            std::io::stdout().write_all(&text)?;
        }

        Commands::Containers { input, blocks } => {
            let stringency = options.validation_stringency;
            let mut reader = open_reader(&input, None, options)?;
            let mut total = 0usize;
            let mut records = 0i64;
            println!("#offset\tref\tstart\tspan\trecords\tblocks");
            for container in reader.iterator()? {
                let container = container?;
                print_container(&container);
                if blocks {
                    for block in container.blocks(stringency)? {
                        println!(
                            "\t{:?}\t{:?}\tid={}\t{}->{} bytes",
                            block.content_type,
                            block.method,
                            block.content_id,
                            block.data.len(),
                            block.raw_size
                        );
                    }
                }
                total += 1;
                records += container.header.record_count as i64;
            }
            eprintln!("\n=== Container Statistics ===");
            eprintln!("Containers:      {}", total);
            eprintln!("Records:         {}", records);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Query { input, sequence, start: position, index, limit } => {
            let mut reader = open_reader(&input, index, options)?;
            let result = reader.query_alignment_start(&sequence, position)?;
            let outcome = match &result {
                QueryResult::Empty => "no index entry",
                QueryResult::NotFound => "no overlapping container",
                QueryResult::Positioned(_) => "positioned",
            };

            let mut shown = 0usize;
            println!("#offset\tref\tstart\tspan\trecords\tblocks");
            for container in result.take(limit.unwrap_or(usize::MAX)) {
                print_container(&container?);
                shown += 1;
            }
            eprintln!("\n=== Query Statistics ===");
            eprintln!("Region:          {}:{}", sequence, position);
            eprintln!("Outcome:         {}", outcome);
            eprintln!("Containers:      {}", shown);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Unmapped { input, index } => {
            let mut reader = open_reader(&input, index, options)?;
            let mut shown = 0usize;
            println!("#offset\tref\tstart\tspan\trecords\tblocks");
            for container in reader.query_unmapped()? {
                print_container(&container?);
                shown += 1;
            }
            eprintln!("\n=== Unmapped Statistics ===");
            eprintln!("Containers:      {}", shown);
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}
