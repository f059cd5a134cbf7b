//! Journal entry command implementations

use anyhow::{Context, Result};
use moodlog_core::db::Database;
use moodlog_core::models::{
    suggested_reasons, JournalEntry, JournalEntryUpdate, JournalFilter, NewJournalEntry,
};

use super::{parse_date_arg, today, truncate};

/// Options for `journal list`
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub limit: i64,
    pub from: Option<String>,
    pub to: Option<String>,
    pub reason: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            from: None,
            to: None,
            reason: None,
        }
    }
}

/// Fetch an entry that belongs to `user`
fn owned_entry(db: &Database, user: &str, id: i64) -> Result<JournalEntry> {
    db.get_journal_entry(id)?
        .filter(|entry| entry.user_id == user)
        .with_context(|| format!("Journal entry not found: {}", id))
}

fn mood_bar(score: i32) -> String {
    let filled = score.clamp(0, 10) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

pub fn cmd_journal_list(db: &Database, user: &str, opts: &ListOptions) -> Result<()> {
    let filter = JournalFilter {
        from: opts
            .from
            .as_deref()
            .map(|s| parse_date_arg(s, "--from"))
            .transpose()?,
        to: opts
            .to
            .as_deref()
            .map(|s| parse_date_arg(s, "--to"))
            .transpose()?,
        reason: opts.reason.clone(),
        limit: Some(opts.limit),
        offset: None,
    };

    let entries = db.list_journal_entries(user, &filter)?;

    if entries.is_empty() {
        println!("No journal entries found. Add one with:");
        println!("  moodlog journal add --mood 7 --reasons Exercise");
        return Ok(());
    }

    println!();
    println!("📓 Journal ({} entries)", entries.len());
    println!("   ─────────────────────────────────────────────────────────────");

    for entry in &entries {
        let reasons = if entry.reasons.is_empty() {
            String::new()
        } else {
            format!("  [{}]", entry.reasons.join(", "))
        };
        println!(
            "   #{:<5} {}  {} {:>2}/10{}",
            entry.id,
            entry.entry_date,
            mood_bar(entry.mood_score),
            entry.mood_score,
            reasons
        );
        if let Some(ref content) = entry.content {
            println!("          {}", truncate(content, 60));
        }
    }

    Ok(())
}

pub fn cmd_journal_add(
    db: &Database,
    user: &str,
    mood: i32,
    reasons: Vec<String>,
    date: Option<&str>,
    note: Option<&str>,
) -> Result<i64> {
    let entry_date = match date {
        Some(s) => parse_date_arg(s, "--date")?,
        None => today(),
    };

    let entry = NewJournalEntry {
        entry_date,
        mood_score: mood,
        reasons,
        content: note.map(str::to_string),
    };

    let id = db
        .create_journal_entry(user, &entry)
        .context("Failed to add journal entry")?;

    println!("✅ Added entry #{} for {} (mood {}/10)", id, entry_date, mood);
    Ok(id)
}

pub fn cmd_journal_show(db: &Database, user: &str, id: i64) -> Result<()> {
    let entry = owned_entry(db, user, id)?;

    println!();
    println!("📓 Entry #{}", entry.id);
    println!("   ─────────────────────────────");
    println!("   Date:    {}", entry.entry_date);
    println!("   Mood:    {} {}/10", mood_bar(entry.mood_score), entry.mood_score);
    if !entry.reasons.is_empty() {
        println!("   Reasons: {}", entry.reasons.join(", "));
    }
    if let Some(ref content) = entry.content {
        println!();
        for line in content.lines() {
            println!("   {}", line);
        }
    }
    println!();
    println!("   Created: {}", entry.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(updated) = entry.updated_at {
        println!("   Updated: {}", updated.format("%Y-%m-%d %H:%M"));
    }

    Ok(())
}

pub fn cmd_journal_edit(
    db: &Database,
    user: &str,
    id: i64,
    mood: Option<i32>,
    reasons: Option<Vec<String>>,
    date: Option<&str>,
    note: Option<String>,
) -> Result<()> {
    owned_entry(db, user, id)?;

    let update = JournalEntryUpdate {
        entry_date: date.map(|s| parse_date_arg(s, "--date")).transpose()?,
        mood_score: mood,
        reasons,
        content: note,
    };

    if update.is_empty() {
        anyhow::bail!("Nothing to change. Pass --mood, --reasons, --date or --note.");
    }

    let entry = db.update_journal_entry(id, &update)?;
    println!(
        "✅ Updated entry #{} ({}, mood {}/10)",
        entry.id, entry.entry_date, entry.mood_score
    );

    Ok(())
}

pub fn cmd_journal_delete(db: &Database, user: &str, id: i64) -> Result<()> {
    owned_entry(db, user, id)?;

    db.delete_journal_entry(id)?;
    println!("🗑️  Deleted entry #{}", id);

    Ok(())
}

pub fn cmd_reasons(db: &Database, user: &str) -> Result<()> {
    let counts = db.reason_counts(user)?;
    let suggestions = suggested_reasons(counts.iter().map(|rc| rc.reason.as_str()));

    if counts.is_empty() {
        println!("No reasons recorded yet.");
    } else {
        println!();
        println!("🏷️  Reasons");
        println!("   ─────────────────────────────");

        for rc in &counts {
            println!("   {:<20} {:>4}", truncate(&rc.reason, 20), rc.count);
        }
    }

    if !suggestions.is_empty() {
        println!();
        println!("   Suggestions: {}", suggestions.join(", "));
    }

    Ok(())
}
