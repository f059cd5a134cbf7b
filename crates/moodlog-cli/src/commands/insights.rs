//! Mood insights and streak command implementations

use anyhow::Result;
use chrono::NaiveDate;
use moodlog_core::db::Database;
use moodlog_core::insights::{insights_for_user, StreakSummary};

use super::truncate;

pub fn cmd_insights(db: &Database, user: &str, min_entries: usize) -> Result<()> {
    let insights = insights_for_user(db, user)?;

    if !insights.has_data() {
        println!("No journal entries yet. Insights appear once you start logging.");
        return Ok(());
    }

    println!();
    println!("🔎 Mood Insights");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Average mood: {:.1}/10 across {} entries",
        insights.overall_average_mood, insights.entries_analyzed
    );

    match (
        insights.best_reason(min_entries),
        insights.worst_reason(min_entries),
    ) {
        (Some(best), Some(worst)) => {
            println!();
            println!(
                "   😊 Best:  {} ({:+.1}, avg {:.1} over {} entries)",
                best.reason, best.deviation, best.average_mood, best.entries_count
            );
            if worst.reason != best.reason {
                println!(
                    "   😞 Worst: {} ({:+.1}, avg {:.1} over {} entries)",
                    worst.reason, worst.deviation, worst.average_mood, worst.entries_count
                );
            }
        }
        _ => {
            println!();
            println!(
                "   💡 No reason has {} or more entries yet; highlights will appear as you log more.",
                min_entries
            );
        }
    }

    let ranked = insights.ranked_reasons();
    if !ranked.is_empty() {
        println!();
        println!("   {:<20} {:>9} {:>8}", "Reason", "Deviation", "Entries");
        for r in ranked {
            println!(
                "   {:<20} {:>+9.2} {:>8}",
                truncate(&r.reason, 20),
                r.deviation,
                r.entries_count
            );
        }
    }

    Ok(())
}

fn print_streak(label: &str, streak: &StreakSummary, today: NaiveDate) {
    let flame = if streak.active_on(today) { "🔥" } else { "  " };
    println!(
        "   {} {:<10} current {:>3} day(s)   longest {:>3}   active days {:>4}",
        flame, label, streak.current_streak, streak.longest_streak, streak.active_days
    );
    if let Some(last) = streak.last_active {
        println!("                 last active {}", last);
    }
}

pub fn cmd_streak(db: &Database, user: &str, today: NaiveDate) -> Result<()> {
    let journal = db.journal_streak(user, today)?;
    let breathing = db.breathing_streak(user, today)?;

    println!();
    println!("📅 Streaks");
    println!("   ─────────────────────────────────────────────────────────────");
    print_streak("Journal", &journal, today);
    print_streak("Breathing", &breathing, today);

    if journal.current_streak > 0 && !journal.active_on(today) {
        println!();
        println!("   💡 Log an entry today to keep your journal streak going.");
    }

    Ok(())
}
