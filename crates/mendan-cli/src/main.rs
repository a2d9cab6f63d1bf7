//! `mendan`: terminal client for recording customer meetings.
//!
//! # Usage
//!
//! ```
//! mendan --url http://localhost:8000
//! mendan --config ~/.config/mendan/config.toml
//! ```

mod app;
mod compose;
mod config;
#[cfg(test)]
mod fake;
mod login;
mod picker;
mod records;
mod router;
mod ticket;
mod ui;

use std::{fs, io, sync::Mutex, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use config::{Args, Settings};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use mendan_client::{ApiClient, SessionContext, session::FileStore};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_subscriber::EnvFilter;

// ─── Logging ──────────────────────────────────────────────────────────────────

/// Send tracing output to `settings.log_file`; the terminal belongs to the
/// UI. Filter with `MENDAN_LOG`, default `info`.
fn init_tracing(settings: &Settings) -> Result<()> {
  if let Some(parent) = settings.log_file.parent() {
    fs::create_dir_all(parent)
      .with_context(|| format!("creating log directory {}", parent.display()))?;
  }
  let file = fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(&settings.log_file)
    .with_context(|| format!("opening log file {}", settings.log_file.display()))?;

  let filter = EnvFilter::try_from_env("MENDAN_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .with_target(true)
    .init();
  Ok(())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let settings = Settings::from_env(Args::parse())?;
  init_tracing(&settings)?;
  tracing::info!(url = %settings.api.base_url, state = %settings.state_dir.display(), "starting");

  let session = SessionContext::hydrate(FileStore::new(&settings.state_dir));
  let client = ApiClient::new(settings.api, session).context("building HTTP client")?;
  let mut app = App::new(client);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Run the event loop; restore terminal even on error.
  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  if let Err(e) = &run_result {
    tracing::error!(error = %e, "event loop failed");
  }
  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    // Apply whatever requests finished since the last frame.
    app.drain();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key) {
          break;
        }
      }
      // Resizes are picked up by the next draw.
      _ => {}
    }
  }

  tracing::info!("exiting");
  Ok(())
}
