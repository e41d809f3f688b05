//! Terminal view layer
//!
//! Screens render the latest published store snapshot and dispatch user
//! intents as store commands; no view mutates state directly. A single
//! event channel feeds the loop: key events from a blocking input thread,
//! change notifications forwarded from the store's watch channel, and
//! completions of spawned operations.

mod app;
mod views;

use crossterm::event::{Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use tracing::info;

use crate::config::AppConfig;
use crate::prefs::PrefStore;
use crate::types::error::Result;

use app::App;

/// Events fed into the main loop
pub enum AppEvent {
    /// A terminal input event
    Input(Event),
    /// The store published a new state snapshot
    StateChanged,
    /// A spawned send operation finished
    SendFinished(Result<()>),
}

/// Run the terminal UI until the user quits
pub async fn run(config: AppConfig, prefs: PrefStore) -> Result<()> {
    let (events_tx, events_rx) = flume::unbounded();

    // Blocking input thread; ends when the loop drops the receiver
    let input_tx = events_tx.clone();
    std::thread::spawn(move || loop {
        match crossterm::event::read() {
            Ok(event) => {
                if input_tx.send(AppEvent::Input(event)).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, config, prefs, events_tx, events_rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: AppConfig,
    prefs: PrefStore,
    events_tx: flume::Sender<AppEvent>,
    events_rx: flume::Receiver<AppEvent>,
) -> Result<()> {
    let mut app = App::new(config, prefs, events_tx)?;

    loop {
        terminal.draw(|frame| views::render(frame, &app))?;

        let Ok(event) = events_rx.recv_async().await else {
            break;
        };

        match event {
            AppEvent::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                app.handle_key(key);
            }
            AppEvent::Input(_) => {}
            AppEvent::StateChanged => app.refresh_state(),
            AppEvent::SendFinished(result) => app.send_finished(result),
        }

        if app.should_quit {
            info!("Quit requested");
            break;
        }
    }

    Ok(())
}
