//! `zipfence` command-line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use zipfence::{
    ArchiveReader, Cli, HttpRangeReader, LocalFileReader, MemoryReader, ReadAt, extract_with,
    fs::LocalFs,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    if cli.is_http_url() {
        let reader = Arc::new(HttpRangeReader::new(cli.source.clone()).await?);
        process(reader.clone(), &cli).await?;

        if !cli.is_quiet() {
            eprintln!("Total bytes transferred: {}", format_size(reader.transferred_bytes()));
        }
    } else if cli.is_stdin() {
        let reader = MemoryReader::from_async_read(tokio::io::stdin())
            .await
            .context("failed to read archive from stdin")?;
        process(Arc::new(reader), &cli).await?;
    } else {
        let reader = LocalFileReader::new(Path::new(&cli.source))?;
        process(Arc::new(reader), &cli).await?;
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    let default = if cli.is_very_quiet() {
        "error"
    } else if cli.is_quiet() {
        "warn"
    } else {
        "info"
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .try_init();
}

async fn process<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    if cli.list || cli.verbose {
        return list_entries(reader, cli.verbose).await;
    }

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let request = cli.to_request().cancellation(token);
    let outcome = extract_with(reader, &request, &LocalFs)
        .await
        .with_context(|| format!("failed to extract {}", cli.source))?;

    if !cli.is_quiet() {
        println!(
            "extracted {} of {} entries ({}) into {}",
            outcome.extracted_count,
            outcome.entries_total,
            format_size(outcome.bytes_written),
            request.output_root.display()
        );
        if outcome.oversized_skipped > 0 {
            println!("skipped {} entries over the size ceiling", outcome.oversized_skipped);
        }
        if outcome.count_ceiling_hit {
            println!("stopped at the file count ceiling");
        }
    }

    if !outcome.any_extracted() && !cli.is_very_quiet() {
        eprintln!("nothing matched in {}", cli.source);
    }

    Ok(())
}

/// Print archive contents, one name per line or as a table with `-v`.
async fn list_entries<R: ReadAt>(reader: Arc<R>, verbose: bool) -> Result<()> {
    if reader.size() == 0 {
        return Ok(());
    }
    let archive = ArchiveReader::open(reader).await?;

    if !verbose {
        for entry in archive.entries() {
            println!("{}", entry.name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let (mut total_length, mut total_compressed, mut files) = (0u64, 0u64, 0usize);
    for entry in archive.entries() {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _) = entry.mod_time();
        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.length,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.length),
            year,
            month,
            day,
            hour,
            minute,
            entry.name
        );
        if !entry.is_directory_marker() {
            total_length = total_length.saturating_add(entry.length);
            total_compressed = total_compressed.saturating_add(entry.compressed_size);
            files += 1;
        }
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {}  {:>21}  {} files",
        total_length,
        total_compressed,
        ratio(total_compressed, total_length),
        "",
        files
    );
    Ok(())
}

/// Space saved by compression, as a right-aligned percentage.
///
/// Entries that grew under compression show `0%`.
fn ratio(compressed: u64, length: u64) -> String {
    if length == 0 {
        return format!("{:>4}%", 0);
    }
    let kept = (u128::from(compressed) * 100 / u128::from(length)).min(100);
    format!("{:>4}%", 100 - kept)
}

fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match size {
        s if s >= GB => format!("{:.2} GB", s as f64 / GB as f64),
        s if s >= MB => format!("{:.2} MB", s as f64 / MB as f64),
        s if s >= KB => format!("{:.2} KB", s as f64 / KB as f64),
        s => format!("{s} bytes"),
    }
}
