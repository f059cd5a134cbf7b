//! Breathing exercise command implementations

use anyhow::{Context, Result};
use moodlog_core::breathing::{validate_cycles, BreathingPattern};
use moodlog_core::db::Database;
use moodlog_core::models::NewBreathingSession;

use super::{parse_date_arg, today};

fn parse_pattern(name: &str) -> Result<BreathingPattern> {
    name.parse::<BreathingPattern>().map_err(anyhow::Error::msg)
}

fn format_secs(ms: u64) -> String {
    format!("{:.1}s", ms as f64 / 1000.0)
}

pub fn cmd_breathe_patterns() -> Result<()> {
    println!();
    println!("🌬️  Breathing Patterns");
    println!("   ─────────────────────────────────────────────────────────────");

    for pattern in BreathingPattern::ALL {
        let counts: Vec<String> = pattern
            .phases()
            .iter()
            .map(|p| format_secs(p.duration_ms as u64))
            .collect();
        println!(
            "   {:<18} {:<20} {}",
            pattern.as_str(),
            pattern.title(),
            counts.join(" · ")
        );
        println!("   {:<18} {}", "", pattern.description());
    }

    Ok(())
}

pub fn cmd_breathe_show(pattern: &str, cycles: u32) -> Result<()> {
    let pattern = parse_pattern(pattern)?;
    let cycles = validate_cycles(cycles).context("Invalid --cycles")?;

    println!();
    println!("🌬️  {} × {} cycles", pattern.title(), cycles);
    println!("   ─────────────────────────────");

    for step in pattern.schedule(cycles) {
        println!(
            "   cycle {:>2}  {:>7}  {:<10} {}",
            step.cycle + 1,
            format_secs(step.offset_ms),
            step.kind,
            format_secs(step.duration_ms as u64)
        );
    }

    let total = pattern.session_duration(cycles);
    println!();
    println!("   Total: {}", format_secs(total.as_millis() as u64));

    Ok(())
}

pub fn cmd_breathe_log(
    db: &Database,
    user: &str,
    pattern: &str,
    cycles: u32,
    date: Option<&str>,
) -> Result<i64> {
    let session = NewBreathingSession {
        pattern: parse_pattern(pattern)?,
        cycles: validate_cycles(cycles).context("Invalid --cycles")?,
        completed_on: match date {
            Some(s) => parse_date_arg(s, "--date")?,
            None => today(),
        },
    };

    let id = db
        .log_breathing_session(user, &session)
        .context("Failed to log breathing session")?;

    println!(
        "✅ Logged {} ({} cycles, {}) on {}",
        session.pattern.title(),
        cycles,
        format_secs(session.pattern.session_duration(cycles).as_millis() as u64),
        session.completed_on
    );
    Ok(id)
}
