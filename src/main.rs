use clap::{Parser, Subcommand};
use s3pkit::archive::{
    for_each_archive, inspect, pack_files, unpack_all, ArchiveListing, Batch, UnpackOptions,
};
use s3pkit::fs::read_file;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "s3p", version, about = "Pack and unpack S3P audio archives")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack raw audio files into a single .s3p archive, in argument order
    Pack {
        output: PathBuf,
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
    },
    /// Unpack each archive into a sibling `<archive>.out/` directory
    Unpack {
        /// Extension for extracted payloads
        #[arg(short, long, default_value = "wma")]
        extension: String,
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
    },
    /// Print the index of each archive
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {

        // ── Pack ─────────────────────────────────────────────────────────────
        Commands::Pack { output, inputs } => {
            println!("Packing {} files", inputs.len());
            match pack_files(&output, &inputs) {
                Ok(_) => {
                    println!("Created: {}", output.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!(output = %output.display(), "pack failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }

        // ── Unpack ───────────────────────────────────────────────────────────
        Commands::Unpack { extension, inputs } => {
            let opts = UnpackOptions { extension, ..UnpackOptions::default() };
            let batch = unpack_all(&inputs, &opts);
            for (path, report) in &batch.done {
                println!("{}: {} payload(s) -> {}",
                    path.display(), report.files.len(), report.output_dir.display());
            }
            exit_code(&batch)
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { json, inputs } => {
            let batch = for_each_archive(&inputs, |path| {
                let listing = inspect(&read_file(path)?)?;
                if json {
                    let text = serde_json::to_string_pretty(&listing)
                        .map_err(std::io::Error::from)?;
                    println!("{text}");
                } else {
                    print_listing(path, &listing);
                }
                Ok(())
            });
            exit_code(&batch)
        }
    }
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A batch fails only if no archive in it succeeded.
fn exit_code<T>(batch: &Batch<T>) -> ExitCode {
    if batch.usable() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn print_listing(path: &Path, listing: &ArchiveListing) {
    println!("Archive: {}  ({} B, {} entries, trailer {})",
        path.display(),
        listing.file_size,
        listing.entry_count,
        match (&listing.trailer_hex, listing.trailer_present) {
            (Some(hex), true)  => format!("ok {hex}"),
            (Some(hex), false) => format!("unexpected {hex}"),
            (None, _)          => "missing".to_string(),
        });
    println!("{:>6} {:>10} {:>10} {:>9} {:>10}  CRC32", "Entry", "Offset", "Length", "Start", "Raw");
    for e in &listing.entries {
        println!("{:>6} {:>10} {:>10} {:>9} {:>10}  {:08x}",
            e.index, e.offset, e.length, e.filestart, e.raw_length, e.crc32);
    }
}
