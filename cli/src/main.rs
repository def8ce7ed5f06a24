mod config;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use jotter_core::notify::ConsoleNotifier;
use jotter_core::storage::{Database, SqliteNoteRepository};
use jotter_core::{Note, NoteId, NoteService};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "jotter")]
#[command(about = "Minimal note keeping: create, search, share", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a new note
    Add {
        /// Note content
        content: String,

        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// Show a single note
    Show {
        id: String,
    },

    /// List notes page by page
    List {
        #[arg(short, long, default_value_t = 1)]
        page: i64,

        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },

    /// Search notes by content or tag
    Search {
        #[arg(default_value = "")]
        term: String,
    },

    /// Filter notes by tag and/or updated-at date range
    Filter {
        /// Exact tag to require
        #[arg(short, long)]
        tag: Option<String>,

        /// Start of the range (RFC3339 or YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End of the range (RFC3339 or YYYY-MM-DD, inclusive)
        #[arg(long)]
        until: Option<String>,
    },

    /// Edit a note's content and/or tags
    Edit {
        id: String,

        /// Replacement content (blank keeps the old content)
        #[arg(short, long)]
        content: Option<String>,

        /// Replacement tags; pass an empty string to clear them
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// Mark a note as deleted (recoverable until purged)
    Delete {
        id: String,
    },

    /// Physically remove a note
    Purge {
        id: String,
    },

    /// Share a note by email and/or with another user
    Share {
        id: String,

        /// Email address to send the note to
        #[arg(short, long)]
        email: Option<String>,

        /// Internal user reference to share with
        #[arg(short, long)]
        user: Option<String>,
    },
}

fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    log::debug!(
        "database {} mail account {}",
        config.db_path.display(),
        config.mail_user
    );

    let db = Database::new(&config.db_path);
    let conn = db.get_or_create()?;
    let service = NoteService::new(SqliteNoteRepository::new(conn), ConsoleNotifier::new());

    match cli.command {
        Commands::Add { content, tags } => {
            let note = service.create(&content, tags.as_deref())?;
            println!("Added note {}", note.id);
        }
        Commands::Show { id } => {
            let note = service.get_by_id(&NoteId::from(id))?;
            print_note(&note);
        }
        Commands::List { page, limit } => {
            let listing = service.list(page, limit)?;
            if listing.items.is_empty() {
                println!("No notes on page {}", listing.current_page);
            }
            for note in &listing.items {
                print_note(note);
            }
            println!(
                "Page {} of {}",
                listing.current_page, listing.total_pages
            );
        }
        Commands::Search { term } => {
            let hits = service.search(&term)?;
            print_notes(&hits);
        }
        Commands::Filter { tag, from, until } => {
            let start = from
                .as_deref()
                .map(|raw| parse_bound(raw, false))
                .transpose()?;
            let end = until
                .as_deref()
                .map(|raw| parse_bound(raw, true))
                .transpose()?;
            let hits = service.filter(tag.as_deref(), start, end)?;
            print_notes(&hits);
        }
        Commands::Edit { id, content, tags } => {
            let note = service.update(&NoteId::from(id), content.as_deref(), tags.as_deref())?;
            print_note(&note);
        }
        Commands::Delete { id } => {
            service.soft_delete(&NoteId::from(id))?;
            println!("Note deleted (purge to remove permanently)");
        }
        Commands::Purge { id } => {
            service.purge(&NoteId::from(id))?;
            println!("Note purged");
        }
        Commands::Share { id, email, user } => {
            let receipt = service.share(&NoteId::from(id), email.as_deref(), user.as_deref())?;
            if let Some(user) = receipt.shared_with_user {
                println!("Shared with user {user}");
            }
            if let Some(address) = receipt.emailed_to {
                println!("Sent to {address}");
            }
        }
    }

    Ok(())
}

fn print_note(note: &Note) {
    println!("{}  [{}]", note.id, note.updated_at.format("%Y-%m-%d %H:%M"));
    println!("  {}", note.content);
    if !note.tags.is_empty() {
        println!("  tags: {}", note.tags.join(", "));
    }
    if !note.shared_with.is_empty() {
        println!("  shared with: {}", note.shared_with.join(", "));
    }
}

fn print_notes(notes: &[Note]) {
    if notes.is_empty() {
        println!("No notes found");
        return;
    }
    for note in notes {
        print_note(note);
    }
}

/// Parse a date bound as RFC3339 or a bare date; bare dates expand to
/// the start or end of that day so the range stays inclusive.
fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("unrecognized date '{raw}' (expected RFC3339 or YYYY-MM-DD)"))?;
    let time = if end_of_day {
        NaiveTime::from_hms_opt(23, 59, 59)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .unwrap_or_default();

    Ok(date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bound_bare_date() {
        let start = parse_bound("2026-01-15", false).unwrap();
        let end = parse_bound("2026-01-15", true).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-01-15T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-01-15T23:59:59+00:00");
    }

    #[test]
    fn test_parse_bound_rfc3339() {
        let parsed = parse_bound("2026-01-15T10:30:00+02:00", false).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-01-15T08:30:00+00:00");
    }

    #[test]
    fn test_parse_bound_garbage() {
        assert!(parse_bound("next tuesday", false).is_err());
    }
}
