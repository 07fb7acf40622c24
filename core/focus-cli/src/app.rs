//! Wires the engine to the terminal ports and runs one command against it.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

use focus_core::catalog::{self, SoundCategory};
use focus_core::{
    AudioOutput, BreakKind, CompletionRecord, EngineConfig, FileStore, FocusEngine, RemoteStatus,
    StorageConfig, SystemClock, TaskRef,
};
use serde_json::json;
use tracing::{debug, info};

use crate::backend::{read_snapshot, FileBackend};
use crate::error::{CliError, Result};
use crate::preferences::ConfigPreferences;
use crate::terminal::{StdoutNotifier, TerminalBackend, TextCuePlayer};

const DRIVER_PERIOD: StdDuration = StdDuration::from_secs(1);

pub struct App {
    engine: FocusEngine,
    backend: Arc<FileBackend>,
}

impl App {
    /// Builds the engine and restores it from the local mirror and the stored
    /// session row.
    pub fn open(storage: &StorageConfig, config: &EngineConfig) -> Result<Self> {
        storage.ensure_root()?;
        let clock = Arc::new(SystemClock);
        let audio = AudioOutput::new(Box::new(TerminalBackend::stdout()), clock.clone())
            .with_element_player(Box::new(TextCuePlayer::stdout()))
            .with_loop_interval(config.audio.loop_interval());
        let preferences = Arc::new(ConfigPreferences::new(
            storage.config_file(),
            config.sounds.clone(),
        ));
        let backend = Arc::new(FileBackend::new(
            storage.remote_session_file(),
            storage.completions_file(),
        ));

        let mut engine = FocusEngine::new(config, audio, preferences, clock)
            .with_store(Arc::new(FileStore::new(&storage.session_mirror_file())))
            .with_sink(backend.clone())
            .with_notifier(Arc::new(StdoutNotifier));
        // Running a command is the user interaction that unlocks audio.
        engine.unlock_audio();

        let remote = backend.load_snapshot();
        if let Some(record) = engine.restore(remote.as_ref())? {
            print_record(&record);
        }
        Ok(Self { engine, backend })
    }

    pub fn start(&mut self, task_id: String, title: String, minutes: Option<u32>) -> Result<()> {
        let mut task = TaskRef::new(task_id, title);
        if let Some(minutes) = minutes {
            task = task.with_focus_minutes(minutes);
        }
        self.engine.start_focus_session(task)?;
        self.print_status()
    }

    pub fn start_break(&mut self, kind: BreakKind) -> Result<()> {
        self.engine.start_break(kind);
        self.print_status()
    }

    pub fn pause(&mut self) -> Result<()> {
        self.engine.pause_timer();
        self.print_status()
    }

    pub fn resume(&mut self) -> Result<()> {
        self.engine.resume_timer();
        self.print_status()
    }

    pub fn stop(&mut self) -> Result<()> {
        match self.engine.stop_timer() {
            Some(record) => print_record(&record),
            None => println!("stopped"),
        }
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.engine.reset_timer();
        self.print_status()
    }

    pub fn tick(&mut self, count: u32) -> Result<()> {
        for _ in 0..count {
            if let Some(record) = self.engine.tick() {
                print_record(&record);
            }
        }
        self.print_status()
    }

    /// Drives the engine once per second until the phase ends or is paused.
    pub fn run(&mut self) -> Result<()> {
        if !self.engine.session().phase.is_running() {
            println!("nothing to run ({})", self.engine.session().phase.as_str());
            return Ok(());
        }
        info!(phase = self.engine.session().phase.as_str(), "Driver started");
        while self.engine.session().phase.is_running() {
            thread::sleep(DRIVER_PERIOD);
            if let Some(record) = self.engine.tick() {
                print_record(&record);
            }
            if let Some(remaining) = self.engine.remaining_seconds() {
                debug!(remaining, "Driver tick");
            }
        }
        info!("Driver stopped");
        self.print_status()
    }

    pub fn status(&self) -> Result<()> {
        self.print_status()
    }

    /// Re-applies the stored session row, as a resume from the backend would.
    pub fn sync(&mut self) -> Result<()> {
        match self.backend.load_snapshot() {
            Some(snapshot) if snapshot.status == RemoteStatus::Completed => {
                match self.engine.complete_timer_from_database(&snapshot)? {
                    Some(record) => print_record(&record),
                    None => println!("completion already handled"),
                }
            }
            Some(snapshot) => self.engine.resume_from_database(&snapshot)?,
            None => println!("no stored session"),
        }
        self.print_status()
    }

    pub fn complete_remote(&mut self, path: &Path) -> Result<()> {
        let snapshot = read_snapshot(path)?;
        match self.engine.complete_timer_from_database(&snapshot)? {
            Some(record) => print_record(&record),
            None => println!("completion already handled"),
        }
        Ok(())
    }

    pub fn history(&self) -> Result<()> {
        for record in self.backend.completions()? {
            print_record(&record);
        }
        Ok(())
    }

    fn print_status(&self) -> Result<()> {
        let session = self.engine.session();
        let status = json!({
            "session": session,
            "targetSeconds": self.engine.target_seconds(),
            "remainingSeconds": self.engine.remaining_seconds(),
            "wallClockSeconds": self.engine.wall_clock_elapsed().map(|d| d.num_seconds()),
            "activeLoop": self.engine.active_loop_sound(),
            "active": session.is_active(),
        });
        let text = serde_json::to_string_pretty(&status)
            .map_err(|err| CliError::json("serializing status", err))?;
        println!("{}", text);
        Ok(())
    }
}

pub fn list_sounds(category: Option<SoundCategory>) {
    let categories = match category {
        Some(category) => vec![category],
        None => vec![
            SoundCategory::TimerStart,
            SoundCategory::TaskCompletion,
            SoundCategory::FocusBackground,
        ],
    };
    for category in categories {
        println!("{}:", category.as_str());
        println!("  {}", catalog::NONE_SOUND);
        for entry in catalog::sounds_in(category) {
            println!("  {:<10} {}", entry.id, entry.asset);
        }
    }
}

fn print_record(record: &CompletionRecord) {
    let how = if record.auto_completed {
        "completed"
    } else {
        "stopped"
    };
    println!(
        "{} {} ({}) after {}s",
        how, record.task_title, record.task_id, record.duration_seconds
    );
}
