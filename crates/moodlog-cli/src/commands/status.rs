//! Status-related command implementations (status, audit, reset)

use std::path::Path;

use anyhow::{Context, Result};
use moodlog_core::db::Database;

use super::{open_db, truncate};

pub fn cmd_status(db_path: &Path, user: &str, no_encrypt: bool) -> Result<()> {
    use moodlog_core::db::DB_KEY_ENV;
    use std::fs;

    println!();
    println!("📊 Moodlog Status");
    println!("   ─────────────────────────────────────────────────────────────");

    // Database path
    println!("   Database: {}", db_path.display());

    // Check if database file exists and get size
    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    // Check encryption status
    let has_key = std::env::var(DB_KEY_ENV).is_ok();
    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else if has_key {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ❌ Encryption: REQUIRED but {} not set", DB_KEY_ENV);
    }

    // Try to open the database and show stats
    if db_path.exists() {
        match open_db(db_path, no_encrypt) {
            Ok(db) => {
                if db.is_encrypted() {
                    println!("   🔒 Opened with encryption key");
                } else {
                    println!("   ⚠️  Opened without encryption");
                }
                if let Ok(stats) = db.journal_stats(user) {
                    println!();
                    println!("   User: {}", user);
                    println!("   Entries: {}", stats.total_entries);
                    if let (Some(first), Some(last)) = (stats.first_entry, stats.last_entry) {
                        println!("   Range: {} → {}", first, last);
                    }
                    println!("   Reasons: {}", stats.distinct_reasons);
                    println!("   Breathing sessions: {}", stats.breathing_sessions);
                }
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {}", e);
                if !no_encrypt && !has_key {
                    println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
                } else if has_key {
                    println!("      (Check if {} is correct)", DB_KEY_ENV);
                }
            }
        }
    }

    println!();
    Ok(())
}

pub fn cmd_audit(db: &Database, limit: i64) -> Result<()> {
    let entries = db.list_audit_log(None, limit)?;

    if entries.is_empty() {
        println!("Audit log is empty.");
        return Ok(());
    }

    println!();
    println!("📜 Audit Log");
    println!("   ─────────────────────────────────────────────────────────────");

    for entry in entries {
        let target = match (&entry.entity_type, entry.entity_id) {
            (Some(kind), Some(id)) => format!("{} #{}", kind, id),
            (Some(kind), None) => kind.clone(),
            _ => String::new(),
        };
        println!(
            "   {}  {:<24} {:<14} {}",
            entry.timestamp,
            truncate(&entry.user_id, 24),
            entry.action,
            target
        );
    }

    Ok(())
}

/// Reset the database (soft or hard)
pub fn cmd_reset(db_path: &Path, soft: bool, yes: bool, no_encrypt: bool) -> Result<()> {
    use std::fs;
    use std::io::{self, Write};

    if soft {
        // Soft reset: clear journal data but keep the audit trail
        if !db_path.exists() {
            anyhow::bail!("Database not found: {}", db_path.display());
        }

        if !yes {
            print!("⚠️  This will delete all journal entries and breathing sessions.\n");
            print!("   The audit log will be preserved.\n\n");
            print!("Are you sure? [y/N] ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Ok(());
            }
        }

        let db = open_db(db_path, no_encrypt)?;
        db.soft_reset()?;

        println!("✅ Database soft reset complete.");
        println!("   Cleared: journal entries, reasons, breathing sessions");
        println!("   Preserved: audit log");
    } else {
        // Hard reset: delete and re-initialize
        if !yes {
            print!("⚠️  This will DELETE the entire database and start fresh.\n");
            print!("   All entries and the audit log will be lost.\n\n");
            print!("Are you sure? [y/N] ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Ok(());
            }
        }

        if db_path.exists() {
            fs::remove_file(db_path)
                .with_context(|| format!("Failed to delete database: {}", db_path.display()))?;
            // WAL sidecars sit next to the file with a suffix appended
            for suffix in ["-wal", "-shm", "-journal"] {
                let mut sidecar = db_path.as_os_str().to_owned();
                sidecar.push(suffix);
                let _ = fs::remove_file(sidecar);
            }
        }

        super::cmd_init(db_path, no_encrypt)?;

        println!("\n✅ Database hard reset complete.");
    }

    Ok(())
}
