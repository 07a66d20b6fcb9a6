//! Ad hoc inspection of an overlap store from the command line: dump
//! records or print the counts-sidecar summary of a file written by this
//! crate. Not part of the library surface — a thin `clap` wrapper over
//! [`ovstore::ov_file::OvFile`] for manual debugging, in the spirit of the
//! teacher's one-binary-per-tool `src/bin/*.rs` layout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ovstore::ov_file::{OvFile, OvFileMode};
use ovstore::record::Overlap;

/// Payload word count used by this build of the tool. Fixed the same way
/// the library's own `Word` width is fixed: at compile time.
const PAYLOAD_WORDS: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "ovtool", about = "Inspect an overlap record-store file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every record in a store file, one per line.
    Dump {
        /// Path to the store file.
        path: String,
        /// Treat the file as full-shape, block-compressed (default:
        /// normal-shape, uncompressed).
        #[arg(long)]
        full: bool,
        /// Print at most this many records.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the counts sidecar for a store file without opening the
    /// main file (`FullCounts` mode, see the format's `<path>.counts`).
    Stat {
        /// Path to the store file whose `<path>.counts` sidecar is read.
        path: String,
    },
}

fn dump(path: &str, full: bool, limit: Option<usize>) -> Result<()> {
    let mode = if full { OvFileMode::Full } else { OvFileMode::Normal };
    let mut file = OvFile::<PAYLOAD_WORDS>::open(path, mode).with_context(|| format!("opening '{path}'"))?;

    let mut o = Overlap::<PAYLOAD_WORDS>::zero();
    let mut printed = 0usize;
    while !file.read_overlap(&mut o)? {
        println!("{}\t{}\t{:?}", o.a_id, o.b_id, o.dat);
        printed += 1;
        if limit.is_some_and(|n| printed >= n) {
            break;
        }
    }
    log::info!("printed {printed} record(s) from '{path}'");
    Ok(())
}

fn stat(path: &str) -> Result<()> {
    let counts = OvFile::<PAYLOAD_WORDS>::open_counts(path).with_context(|| format!("reading counts sidecar for '{path}'"))?;
    println!("total records: {}", counts.total());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Dump { path, full, limit } => dump(&path, full, limit),
        Commands::Stat { path } => stat(&path),
    }
}
