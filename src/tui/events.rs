use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Terminal input events
#[derive(Debug, Clone)]
pub enum Event {
    /// Keyboard input event
    Key(KeyEvent),

    /// Mouse input event
    Mouse(MouseEvent),

    /// Terminal resize event
    Resize(u16, u16),

    /// Periodic tick event
    Tick,
}

/// Reads crossterm events on a blocking thread and forwards them
pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Start the reader. Must be called inside a tokio runtime.
    pub fn new() -> Self {
        Self::with_tick_rate(Duration::from_millis(100))
    }

    pub fn with_tick_rate(tick_rate: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::task::spawn_blocking(move || loop {
            let event = match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(event) => convert_crossterm_event(event),
                    Err(e) => {
                        debug!("Failed to read terminal event: {}", e);
                        break;
                    }
                },
                Ok(false) => Some(Event::Tick),
                Err(e) => {
                    debug!("Failed to poll terminal events: {}", e);
                    break;
                }
            };

            if let Some(event) = event {
                if sender.send(event).is_err() {
                    break;
                }
            }
        });

        Self { receiver }
    }

    /// Get the next event; `None` once the reader has stopped
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn convert_crossterm_event(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key_event) => Some(Event::Key(key_event)),
        CrosstermEvent::Mouse(mouse_event) => Some(Event::Mouse(mouse_event)),
        CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
        CrosstermEvent::FocusGained | CrosstermEvent::FocusLost | CrosstermEvent::Paste(_) => None,
    }
}
