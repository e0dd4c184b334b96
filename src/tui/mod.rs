//! Terminal host for confirmation dialogs using ratatui
//!
//! Presents requests from a [`ConfirmStore`] on an [`ElementTree`] and draws
//! the mounted markup each frame.

mod events;
mod render;
mod theme;

pub use events::{Event, EventHandler};
pub use render::{draw, Hit, HitMap};
pub use theme::Palette;

use crate::config::ConfirmerConfig;
use crate::dialogs::{
    ConfirmRequest, ConfirmStore, Confirmation, Confirmer, DataState, PresenterEvent,
};
use crate::dom::ElementTree;
use anyhow::{anyhow, Result};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers, MouseButton,
    MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use tracing::{debug, info};

pub type Backend = CrosstermBackend<io::Stdout>;
pub type Frame<'a> = ratatui::Frame<'a>;

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore_terminal(terminal: &mut Terminal<Backend>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Guess the terminal background from `COLORFGBG` ("fg;bg"). Dark when unknown.
pub fn terminal_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| value.rsplit(';').next().and_then(|bg| bg.parse::<u8>().ok()))
        .map(|bg| bg < 7 || bg == 8)
        .unwrap_or(true)
}

/// Ask one question in the terminal and return the answer
pub async fn run_dialog(
    store: ConfirmStore,
    config: ConfirmerConfig,
    request: ConfirmRequest,
) -> Result<bool> {
    let mut document = ElementTree::new();
    document.set_prefers_dark(terminal_prefers_dark());

    let mut confirmer = Confirmer::new(store.clone(), document, config);
    let answer = store.request(request);

    let mut terminal = init_terminal()?;
    let mut event_handler = EventHandler::new();

    let result = run_app(&mut terminal, &mut confirmer, answer, &mut event_handler).await;

    restore_terminal(&mut terminal)?;
    result
}

/// Main dialog loop
async fn run_app(
    terminal: &mut Terminal<Backend>,
    confirmer: &mut Confirmer<ElementTree>,
    mut answer: Confirmation,
    event_handler: &mut EventHandler,
) -> Result<bool> {
    let mut hits = HitMap::default();
    let mut tick = 0usize;

    loop {
        confirmer.process_pending();
        if let Some(outcome) = answer.try_outcome() {
            info!(outcome, "Dialog answered");
            return Ok(outcome);
        }

        terminal.draw(|frame| hits = draw(frame, confirmer.document(), tick))?;

        // A frame has been painted: the initial state may open, and a drawn
        // closed state has finished its transition.
        match confirmer.data_state() {
            Some(DataState::Initial) => confirmer.dispatch(PresenterEvent::Frame),
            Some(DataState::Closed) => {
                confirmer.dispatch(PresenterEvent::AnimationEnd);
                continue;
            }
            _ => {}
        }

        let input = tokio::select! {
            _ = confirmer.step() => None,
            event = event_handler.next() => Some(event),
        };

        match input {
            None => {}
            Some(None) => return Err(anyhow!("Terminal input closed")),
            Some(Some(Event::Key(key))) if is_interrupt(&key) => {
                debug!("Interrupted");
                return Ok(false);
            }
            Some(Some(Event::Key(key))) => confirmer.dispatch(PresenterEvent::Key(key)),
            Some(Some(Event::Mouse(mouse))) => {
                if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                    match hits.hit(mouse.column, mouse.row) {
                        Some(Hit::Element(element)) => {
                            confirmer.dispatch(PresenterEvent::Click(element))
                        }
                        Some(Hit::Overlay) => confirmer.dispatch(PresenterEvent::OverlayClick),
                        Some(Hit::Inside) | None => {}
                    }
                }
            }
            Some(Some(Event::Resize(..))) => confirmer.dispatch(PresenterEvent::Frame),
            Some(Some(Event::Tick)) => tick = tick.wrapping_add(1),
        }
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}
