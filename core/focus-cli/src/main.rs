//! focus: terminal host for the focus timer engine.
//!
//! Each invocation restores the session from `~/.focus` (or `$FOCUS_HOME`),
//! applies one command and persists the result.
//!
//! ## Subcommands
//!
//! - `start`, `break`, `pause`, `resume`, `stop`, `reset`: session commands
//! - `tick`, `run`: advance the running phase by hand or once per second
//! - `status`, `history`: inspect the session and the completion log
//! - `sync`, `complete-remote`: reconcile against a backend session row
//! - `sounds`: list the sound catalog

mod app;
mod backend;
mod error;
mod logging;
mod preferences;
mod terminal;

use clap::{Parser, Subcommand};
use focus_core::catalog::SoundCategory;
use focus_core::{load_engine_config, BreakKind, StorageConfig};
use std::path::PathBuf;

use crate::app::App;
use crate::error::Result;

#[derive(Parser)]
#[command(name = "focus")]
#[command(about = "Focus timer with audio cues")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a focus session for a task
    Start {
        #[arg(long)]
        task_id: String,

        #[arg(long)]
        title: String,

        /// Focus length override in minutes
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        minutes: Option<u32>,
    },

    /// Start a break (short or long)
    Break {
        #[arg(value_name = "KIND", value_parser = parse_break_kind)]
        kind: BreakKind,
    },

    /// Pause the focus phase
    Pause,

    /// Resume a paused phase
    Resume,

    /// Stop the session, recording a focus phase that has time on it
    Stop,

    /// Abort the session and clear the completion counter
    Reset,

    /// Advance the running phase by whole seconds
    Tick {
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Tick once per second until the phase ends
    Run,

    /// Print the session as JSON
    Status,

    /// Print the completion log
    History,

    /// Re-apply the stored backend session row
    Sync,

    /// Complete the session from a backend snapshot file
    CompleteRemote {
        #[arg(value_name = "SNAPSHOT")]
        path: PathBuf,
    },

    /// List the sound catalog
    Sounds {
        #[arg(long, value_parser = parse_category)]
        category: Option<SoundCategory>,
    },
}

fn parse_break_kind(value: &str) -> std::result::Result<BreakKind, String> {
    BreakKind::from_str(value).ok_or_else(|| format!("expected short or long, got {}", value))
}

fn parse_category(value: &str) -> std::result::Result<SoundCategory, String> {
    SoundCategory::from_str(value).ok_or_else(|| {
        format!(
            "expected timer_start, task_completion or focus_background, got {}",
            value
        )
    })
}

fn main() {
    let cli = Cli::parse();

    let storage = match StorageConfig::from_env() {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("focus: {}", err);
            std::process::exit(1);
        }
    };
    let _logging_guard = logging::init(&storage.logs_dir());

    if let Err(err) = run(cli.command, &storage) {
        tracing::error!(error = %err, "focus command failed");
        eprintln!("focus: {}", err);
        std::process::exit(1);
    }
}

fn run(command: Commands, storage: &StorageConfig) -> Result<()> {
    if let Commands::Sounds { category } = command {
        app::list_sounds(category);
        return Ok(());
    }

    let config = load_engine_config(Some(storage.config_file()))?;
    let mut app = App::open(storage, &config)?;
    match command {
        Commands::Start {
            task_id,
            title,
            minutes,
        } => app.start(task_id, title, minutes),
        Commands::Break { kind } => app.start_break(kind),
        Commands::Pause => app.pause(),
        Commands::Resume => app.resume(),
        Commands::Stop => app.stop(),
        Commands::Reset => app.reset(),
        Commands::Tick { count } => app.tick(count),
        Commands::Run => app.run(),
        Commands::Status => app.status(),
        Commands::History => app.history(),
        Commands::Sync => app.sync(),
        Commands::CompleteRemote { path } => app.complete_remote(&path),
        Commands::Sounds { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_break_kind_case_insensitively() {
        let cli = Cli::try_parse_from(["focus", "break", "LONG"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Break {
                kind: BreakKind::Long
            }
        ));
        assert!(Cli::try_parse_from(["focus", "break", "lunch"]).is_err());
    }

    #[test]
    fn rejects_zero_minute_override() {
        assert!(Cli::try_parse_from([
            "focus", "start", "--task-id", "A", "--title", "Algebra", "--minutes", "0"
        ])
        .is_err());
    }

    #[test]
    fn parses_sound_category_filter() {
        let cli = Cli::try_parse_from(["focus", "sounds", "--category", "focus_background"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Sounds {
                category: Some(SoundCategory::FocusBackground)
            }
        ));
    }
}
