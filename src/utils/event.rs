use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::{
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

/// Events that can be handled by the application
#[derive(Debug, Clone, Copy)]
pub enum Event {
    /// Terminal tick, used to expire status messages
    Tick,
    /// Key press event
    Key(KeyEvent),
    /// Terminal resize event
    #[allow(dead_code)]
    Resize(u16, u16),
}

/// Event handler configuration
#[derive(Debug, Clone, Copy)]
pub struct EventConfig {
    /// Duration between ticks
    pub tick_rate: Duration,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(250),
        }
    }
}

/// Event handler that listens for terminal events on a background thread
pub struct EventHandler {
    /// Event receiver channel
    pub rx: mpsc::Receiver<Event>,
    /// Thread handle for the event handler
    #[allow(dead_code)]
    handle: thread::JoinHandle<()>,
}

impl EventHandler {
    /// Create a new event handler with the given configuration
    pub fn new(config: EventConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let tick_rate = config.tick_rate;
            let mut last_tick = Instant::now();

            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));

                match event::poll(timeout) {
                    Ok(true) => {
                        let sent = match event::read() {
                            Ok(CrosstermEvent::Key(key)) => tx.send(Event::Key(key)),
                            Ok(CrosstermEvent::Resize(width, height)) => {
                                tx.send(Event::Resize(width, height))
                            }
                            Ok(_) => Ok(()),
                            Err(e) => {
                                tracing::error!("Failed to read terminal event: {}", e);
                                return;
                            }
                        };
                        if sent.is_err() {
                            return;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::error!("Failed to poll terminal events: {}", e);
                        return;
                    }
                }

                if last_tick.elapsed() >= tick_rate {
                    if tx.send(Event::Tick).is_err() {
                        return;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { rx, handle }
    }
}
