//! Moodlog CLI - Mood journal with insights
//!
//! Usage:
//!   moodlog init                         Initialize database
//!   moodlog journal add --mood 7 -r Work Add a journal entry
//!   moodlog insights                     Show how reasons relate to mood
//!   moodlog serve --port 3000            Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let user = cli.user.as_str();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Status => commands::cmd_status(&cli.db, user, cli.no_encrypt),
        Commands::Journal { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_journal_list(&db, user, &commands::ListOptions::default()),
                Some(JournalAction::List {
                    limit,
                    from,
                    to,
                    reason,
                }) => {
                    let opts = commands::ListOptions {
                        limit,
                        from,
                        to,
                        reason,
                    };
                    commands::cmd_journal_list(&db, user, &opts)
                }
                Some(JournalAction::Add {
                    mood,
                    reasons,
                    date,
                    note,
                }) => commands::cmd_journal_add(
                    &db,
                    user,
                    mood,
                    reasons,
                    date.as_deref(),
                    note.as_deref(),
                )
                .map(|_| ()),
                Some(JournalAction::Show { id }) => commands::cmd_journal_show(&db, user, id),
                Some(JournalAction::Edit {
                    id,
                    mood,
                    reasons,
                    date,
                    note,
                }) => commands::cmd_journal_edit(
                    &db,
                    user,
                    id,
                    mood,
                    reasons,
                    date.as_deref(),
                    note,
                ),
                Some(JournalAction::Delete { id }) => commands::cmd_journal_delete(&db, user, id),
            }
        }
        Commands::Reasons => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_reasons(&db, user)
        }
        Commands::Insights { min_entries } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_insights(&db, user, min_entries)
        }
        Commands::Streak => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_streak(&db, user, commands::today())
        }
        Commands::Breathe { action } => match action {
            None | Some(BreatheAction::Patterns) => commands::cmd_breathe_patterns(),
            Some(BreatheAction::Show { pattern, cycles }) => {
                commands::cmd_breathe_show(&pattern, cycles)
            }
            Some(BreatheAction::Log {
                pattern,
                cycles,
                date,
            }) => {
                let db = commands::open_db(&cli.db, cli.no_encrypt)?;
                commands::cmd_breathe_log(&db, user, &pattern, cycles, date.as_deref()).map(|_| ())
            }
        },
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, user, &file).map(|_| ())
        }
        Commands::Export { format, output } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_export(&db, user, &format, output.as_deref())
        }
        Commands::Audit { limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_audit(&db, limit)
        }
        Commands::Reset { soft, yes } => commands::cmd_reset(&cli.db, soft, yes, cli.no_encrypt),
        Commands::Serve {
            port,
            host,
            no_auth,
            static_dir,
        } => {
            commands::cmd_serve(
                &cli.db,
                &host,
                port,
                no_auth,
                cli.no_encrypt,
                static_dir.as_deref(),
            )
            .await
        }
    }
}
