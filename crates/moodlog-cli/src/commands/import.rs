//! Import and export command implementations

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use moodlog_core::{db::Database, export::ExportFormat, import::import_journal_csv, ImportStats};

pub fn cmd_import(db: &Database, user: &str, file: &Path) -> Result<ImportStats> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;

    println!("📥 Importing journal from {}...", file.display());

    let stats = import_journal_csv(db, user, BufReader::new(csv_file))
        .with_context(|| format!("Failed to import {}", file.display()))?;

    let details = format!(
        "file={} imported={} skipped={}",
        file.display(),
        stats.imported,
        stats.skipped
    );
    db.log_audit(user, "import", Some("journal"), None, Some(&details))?;

    println!("   Imported: {}", stats.imported);
    if stats.skipped > 0 {
        println!("   Skipped (already imported): {}", stats.skipped);
    }
    println!("✅ Import complete");

    Ok(stats)
}

pub fn cmd_export(db: &Database, user: &str, format: &str, output: Option<&Path>) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let data = db.export_journal(user, format)?;

    match output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            file.write_all(data.as_bytes())?;

            let count = db.journal_stats(user)?.total_entries;
            println!(
                "✅ Exported {} entries as {} to {}",
                count,
                format,
                path.display()
            );
        }
        None => {
            // Write to stdout
            print!("{}", data);
        }
    }

    Ok(())
}
