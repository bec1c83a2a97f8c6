mod cli;

use dvrindex::{config, playback::SeekResolver};
use dvrindex_store::{IndexStore, OpenMode, SegmentList};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "dvrindex=trace,dvrindex_store=trace,dvrindex_common=debug".to_string()
        } else {
            "dvrindex=info,dvrindex_store=warn".to_string()
        }
    });

    // Logs go to stderr so JSON output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Dump { index, json } => dump_index(&index, json),
        Commands::Lookup { index, time } => lookup(&index, time),
        Commands::Verify { index, json } => verify_index(&index, json),
        Commands::Recover { index } => recover_index(&index),
        Commands::Append {
            index,
            time,
            offset,
        } => append_entry(&index, time, offset),
        Commands::Segments { manifest, json } => list_segments(&manifest, json),
        Commands::Seek {
            manifest,
            time,
            json,
        } => seek(&manifest, time, cli.config.as_deref(), json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("dvrindex {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn dump_index(index: &Path, json: bool) -> Result<()> {
    let store = IndexStore::open(index, OpenMode::Playback)
        .with_context(|| format!("Failed to open index {:?}", index))?;
    let entries = store.entries()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("{}\t{}", entry.timestamp, entry.offset);
        }
    }
    Ok(())
}

fn lookup(index: &Path, time: u64) -> Result<()> {
    let store = IndexStore::open(index, OpenMode::Playback)
        .with_context(|| format!("Failed to open index {:?}", index))?;
    let offset = store
        .lookup_by_time(time)
        .with_context(|| format!("No offset for time {}", time))?;
    println!("{}", offset);
    Ok(())
}

fn verify_index(index: &Path, json: bool) -> Result<()> {
    let report = IndexStore::verify(index)
        .with_context(|| format!("Failed to read index {:?}", index))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Index: {}", index.display());
        println!("  Entries:        {}", report.entries);
        println!("  Trailing bytes: {}", report.trailing_bytes);
        if let (Some(first), Some(last)) = (report.first_timestamp, report.last_timestamp) {
            println!("  Time range:     {} - {}", first, last);
        }
    }

    if let Some(at) = report.first_regression {
        anyhow::bail!("Timestamp order broken at record {}", at);
    }
    if report.trailing_bytes > 0 {
        tracing::warn!(
            "{} has a torn trailing record; run `dvrindex recover` to truncate it",
            index.display()
        );
    }
    Ok(())
}

fn recover_index(index: &Path) -> Result<()> {
    if !index.exists() {
        anyhow::bail!("Index file not found: {:?}", index);
    }

    let mut store = IndexStore::open(index, OpenMode::Record)
        .with_context(|| format!("Failed to recover index {:?}", index))?;
    let recovered = store.recovered_bytes();
    let entries = store.len()?;
    store.close()?;

    if recovered > 0 {
        println!(
            "Truncated {} bytes; {} entries kept",
            recovered, entries
        );
    } else {
        println!("Index is intact; {} entries", entries);
    }
    Ok(())
}

fn append_entry(index: &Path, time: u64, offset: u64) -> Result<()> {
    let mut store = IndexStore::open(index, OpenMode::Record)
        .with_context(|| format!("Failed to open index {:?}", index))?;
    store
        .write(time, offset)
        .with_context(|| format!("Failed to append to {:?}", index))?;
    store.close()?;
    Ok(())
}

fn list_segments(manifest: &Path, json: bool) -> Result<()> {
    let list = SegmentList::load(manifest)
        .with_context(|| format!("Failed to load manifest {:?}", manifest))?;

    if json {
        let segments: Vec<_> = list
            .segments()
            .iter()
            .map(|s| {
                serde_json::json!({
                    "path": s.path().as_str(),
                    "start_time": s.start_time(),
                    "end_time": s.end_time(),
                    "entries": s.entries().ok().map(|e| e.len()),
                })
            })
            .collect();
        let doc = serde_json::json!({
            "finished": list.is_finished(),
            "segments": segments,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!(
        "Recording: {} ({} segments, {})",
        manifest.display(),
        list.len(),
        if list.is_finished() { "finished" } else { "in progress" }
    );
    for segment in list.segments() {
        let entries = match segment.entries() {
            Ok(entries) => entries.len().to_string(),
            Err(e) => format!("index unavailable: {}", e),
        };
        println!(
            "  {}  [{} - {}]  {}",
            segment.path(),
            segment.start_time(),
            segment.end_time(),
            entries
        );
    }
    Ok(())
}

fn seek(manifest: &Path, time: u64, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let resolver = SeekResolver::open(manifest, &config.playback)
        .with_context(|| format!("Failed to load manifest {:?}", manifest))?;
    let target = resolver
        .seek(time)
        .with_context(|| format!("Cannot seek to {}", time))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&target)?);
    } else {
        println!("{}\t{}", target.path.display(), target.offset);
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(path)?;
    println!("Configuration is valid");
    println!("  Index extension:  {}", config.recording.index_extension);
    println!("  Manifest name:    {}", config.recording.manifest_name);
    println!("  Max segment size: {} bytes", config.recording.max_segment_bytes);
    println!(
        "  Max duration:     {}",
        config.recording.max_segment_duration
    );
    println!("  Clamp seeks:      {}", config.playback.clamp_to_nearest);
    Ok(())
}
