//! Terminal setup and the single event channel the chat loop reads from.

use std::io::{self, Stderr};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

const TICK_RATE: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
    /// Outcome of one chat request, sent by its background task
    Reply(Result<String>),
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;

fn translate(event: Event) -> Option<AppEvent> {
    match event {
        // Presses only; release and repeat would double every keystroke
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Resize(_, _) => Some(AppEvent::Resize),
        _ => None,
    }
}

/// Terminal input, animation ticks and chat replies, merged into one stream.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: EventSender,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let input_tx = tx.clone();
        tokio::spawn(async move {
            let mut reader = EventStream::new();
            while let Some(read) = reader.next().await {
                let Some(event) = read.ok().and_then(translate) else {
                    continue;
                };
                if input_tx.send(event).is_err() {
                    break;
                }
            }
        });

        let tick_tx = tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_RATE);
            loop {
                interval.tick().await;
                if tick_tx.send(AppEvent::Tick).is_err() {
                    break;
                }
            }
        });

        Self { rx, tx }
    }

    /// Handle for tasks that report back into the event loop
    pub fn sender(&self) -> EventSender {
        self.tx.clone()
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

/// Run `cleanup` when `result` is an error, then hand the result back.
fn cleanup_on_err<T>(result: Result<T>, cleanup: impl FnOnce()) -> Result<T> {
    if result.is_err() {
        cleanup();
    }
    result
}

fn enter() -> Result<Tui> {
    // Mouse capture: Send control and wheel scrolling
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(io::stderr()))?)
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    // Raw mode is on from here; undo it if the rest fails
    cleanup_on_err(enter(), || {
        let _ = restore();
    })
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Put the terminal back before the default hook prints the panic.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        default_hook(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::cell::Cell;

    #[test]
    fn test_cleanup_runs_only_on_error() {
        let ran = Cell::new(false);
        let ok = cleanup_on_err(Ok(1), || ran.set(true));
        assert_eq!(ok.unwrap(), 1);
        assert!(!ran.get());

        let err: Result<()> = cleanup_on_err(Err(anyhow!("no tty")), || ran.set(true));
        assert!(err.is_err());
        assert!(ran.get());
    }

    #[test]
    fn test_translate_ignores_key_release() {
        let mut key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert!(matches!(translate(Event::Key(key)), Some(AppEvent::Key(_))));

        key.kind = KeyEventKind::Release;
        assert!(translate(Event::Key(key)).is_none());

        assert!(matches!(translate(Event::Resize(80, 24)), Some(AppEvent::Resize)));
        assert!(translate(Event::FocusGained).is_none());
    }
}
