//! Duke Sheets SST CLI - shared string table inspection tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use duke_sheets_sst::{
    encode_sst, plan_frames, DedupKey, SstOptions, SstReader, SstRecords, StringTable,
    UnicodeString,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sst")]
#[command(
    author,
    version,
    about = "Inspect and verify the shared string table of .xls files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the strings of the shared string table
    Dump {
        /// Input .xls file
        input: PathBuf,

        /// Print JSON instead of one string per line
        #[arg(long)]
        json: bool,

        /// Print at most N strings
        #[arg(short, long)]
        limit: Option<usize>,

        /// Deduplicate on text only, ignoring formatting runs
        #[arg(long)]
        legacy_keys: bool,

        /// Keep colliding entries verbatim instead of padding them
        #[arg(long)]
        no_padding: bool,
    },

    /// Show the frame plan a writer would produce for the file's table
    Plan {
        /// Input .xls file
        input: PathBuf,
    },

    /// Re-encode the table and compare it with the file's own frames
    Verify {
        /// Input .xls file
        input: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Dump {
            input,
            json,
            limit,
            legacy_keys,
            no_padding,
        } => {
            let options = SstOptions {
                dedup_key: if legacy_keys {
                    DedupKey::TextOnly
                } else {
                    DedupKey::Full
                },
                pad_duplicates: !no_padding,
                ..Default::default()
            };
            dump(&input, &options, json, limit)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Plan { input } => {
            show_plan(&input)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Verify { input } => verify(&input),
    }
}

fn read_table(input: &Path, options: &SstOptions) -> Result<StringTable> {
    SstReader::read_file(input, options)
        .with_context(|| format!("Failed to read SST from '{}'", input.display()))
}

fn read_records(input: &Path) -> Result<Option<SstRecords>> {
    SstReader::read_records_file(input)
        .with_context(|| format!("Failed to read records from '{}'", input.display()))
}

fn dump(input: &Path, options: &SstOptions, json: bool, limit: Option<usize>) -> Result<()> {
    let table = read_table(input, options)?;
    let shown: Vec<&UnicodeString> = table
        .as_slice()
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    let mut out = io::stdout().lock();
    if json {
        let doc = serde_json::json!({
            "total": table.total_reference_count(),
            "unique": table.unique_count(),
            "strings": shown,
        });
        serde_json::to_writer_pretty(&mut out, &doc).context("Failed to write JSON")?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "# {} unique, {} total references",
        table.unique_count(),
        table.total_reference_count()
    )?;
    for (i, s) in shown.iter().enumerate() {
        let mut notes = Vec::new();
        if s.is_wide() {
            notes.push("wide".to_string());
        }
        if s.is_rich_text() {
            notes.push(format!("{} runs", s.format_runs().len()));
        }
        if s.has_extension() {
            notes.push(format!("{} ext bytes", s.extension_data().len()));
        }
        if notes.is_empty() {
            writeln!(out, "{i}\t{:?}", s.text())?;
        } else {
            writeln!(out, "{i}\t{:?}\t[{}]", s.text(), notes.join(", "))?;
        }
    }
    Ok(())
}

fn show_plan(input: &Path) -> Result<()> {
    let table = read_table(input, &SstOptions::default())?;
    let plan = plan_frames(&table);

    println!("File: {}", input.display());
    println!("Strings: {} unique", table.unique_count());
    println!("Frames: {}", plan.frame_count());
    for (i, len) in plan.frame_lengths().iter().enumerate() {
        let record = if i == 0 { "SST" } else { "CONTINUE" };
        println!(
            "  {i:>4} {record:<8} payload {len:>5}  body {:>5}",
            plan.record_body_len(i).unwrap_or(0)
        );
    }
    println!("Total: {} bytes", plan.total_record_bytes());

    if let Some(records) = read_records(input)? {
        println!("File frames: {}", 1 + records.continuations.len());
        if let Some(ext) = records.ext_sst().context("Failed to parse EXTSST")? {
            println!(
                "EXTSST: {} buckets of {} strings",
                ext.buckets.len(),
                ext.strings_per_bucket
            );
        }
    }
    Ok(())
}

fn verify(input: &Path) -> Result<ExitCode> {
    let Some(records) = read_records(input)? else {
        println!("{}: no SST record", input.display());
        return Ok(ExitCode::SUCCESS);
    };

    // keep colliding entries as stored so the bytes can match
    let options = SstOptions {
        pad_duplicates: false,
        ..Default::default()
    };
    let table = records
        .decode(&options)
        .with_context(|| format!("Failed to decode SST in '{}'", input.display()))?;
    let encoded = encode_sst(&table).context("Failed to re-encode SST")?;

    let frames = records.frames();
    let original: Vec<&[u8]> = std::iter::once(frames.head)
        .chain(frames.continuation_bodies())
        .collect();

    match first_difference(&original, &encoded) {
        None => {
            println!(
                "{}: OK ({} strings, {} frames)",
                input.display(),
                table.unique_count(),
                encoded.len()
            );
            Ok(ExitCode::SUCCESS)
        }
        Some((frame, offset)) => {
            println!(
                "{}: frames differ at frame {frame}, offset {offset} ({} frames in file, {} re-encoded)",
                input.display(),
                original.len(),
                encoded.len()
            );
            Ok(ExitCode::from(1))
        }
    }
}

/// First (frame, offset) where the two frame lists disagree.
fn first_difference(original: &[&[u8]], encoded: &[Vec<u8>]) -> Option<(usize, usize)> {
    for i in 0..original.len().max(encoded.len()) {
        let a = original.get(i).copied().unwrap_or_default();
        let b = encoded.get(i).map(Vec::as_slice).unwrap_or_default();
        if a != b {
            let offset = a
                .iter()
                .zip(b)
                .position(|(x, y)| x != y)
                .unwrap_or(a.len().min(b.len()));
            return Some((i, offset));
        }
    }
    None
}
