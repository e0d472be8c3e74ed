//! `muster` — command-line front end for the intervention session register.
//!
//! ```text
//! muster add --subject Maths --theme Fractions --invited 20 --attended 15 \
//!            --facilitator "A. Botha" --photo class.jpg
//! muster list --window weekly --subject Maths
//! muster delete 3
//! muster export document --out report.xml --window monthly
//! muster sync
//! muster serve
//! ```

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "muster", about = "Intervention session register")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Log a new intervention session.
  Add {
    /// Session date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    date:        Option<String>,
    /// Grade label: R, 8, 9, 10, 11 or 12.
    #[arg(long)]
    grade:       Option<String>,
    #[arg(long)]
    subject:     String,
    #[arg(long)]
    theme:       String,
    /// Start time (HH:MM).
    #[arg(long)]
    start:       Option<String>,
    /// End time (HH:MM).
    #[arg(long)]
    end:         Option<String>,
    #[arg(long)]
    invited:     u32,
    #[arg(long)]
    attended:    u32,
    #[arg(long)]
    facilitator: String,
    /// Path to a photo to attach.
    #[arg(long)]
    photo:       Option<PathBuf>,
    /// Path to an attendance sheet to attach; repeatable.
    #[arg(long)]
    sheet:       Vec<PathBuf>,
  },

  /// List sessions matching the filters.
  List {
    /// all, weekly, monthly, quarterly or yearly.
    #[arg(long, default_value = "all")]
    window:      String,
    /// Accepted grade label; repeatable.
    #[arg(long)]
    grade:       Vec<String>,
    /// Accepted subject; repeatable.
    #[arg(long)]
    subject:     Vec<String>,
    /// Accepted theme; repeatable.
    #[arg(long)]
    theme:       Vec<String>,
    /// Accepted facilitator; repeatable.
    #[arg(long)]
    facilitator: Vec<String>,
  },

  /// Delete the session currently at the given ordinal (cascades to its
  /// attachments).
  Delete { ordinal: usize },

  /// Export the filtered view to a file.
  Export {
    /// table (delimited text) or document (word-processing XML).
    format:      String,
    #[arg(long, short)]
    out:         PathBuf,
    #[arg(long, default_value = "all")]
    window:      String,
    #[arg(long)]
    grade:       Vec<String>,
    #[arg(long)]
    subject:     Vec<String>,
    #[arg(long)]
    theme:       Vec<String>,
    #[arg(long)]
    facilitator: Vec<String>,
  },

  /// Push the local table file to the configured mirror.
  Sync,

  /// Serve the JSON API.
  Serve,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = config::load(&cli.config)?;

  match cli.command {
    Command::Add {
      date,
      grade,
      subject,
      theme,
      start,
      end,
      invited,
      attended,
      facilitator,
      photo,
      sheet,
    } => {
      commands::add(&cfg, commands::AddArgs {
        date,
        grade,
        subject,
        theme,
        start,
        end,
        invited,
        attended,
        facilitator,
        photo,
        sheets: sheet,
      })
      .await
    }

    Command::List { window, grade, subject, theme, facilitator } => {
      commands::list(&cfg, &window, grade, subject, theme, facilitator)
    }

    Command::Delete { ordinal } => commands::delete(&cfg, ordinal).await,

    Command::Export { format, out, window, grade, subject, theme, facilitator } => {
      commands::export(&cfg, &format, &out, &window, grade, subject, theme, facilitator)
    }

    Command::Sync => commands::sync(&cfg).await,

    Command::Serve => commands::serve(&cfg).await,
  }
}
