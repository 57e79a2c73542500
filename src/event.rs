// event.rs
use std::{
    sync::mpsc::{self, Receiver},
    thread,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use tracing::error;

use crate::app::TerminalEvent;

pub enum Event {
    Tick,
    Input(KeyEvent),
    Mouse(MouseEvent),
    TerminalEvent(TerminalEvent),
}

pub struct EventHandler {
    receiver: Receiver<Event>,
    #[allow(dead_code)]
    event_thread: thread::JoinHandle<()>,
}

impl EventHandler {
    /// Spawns the input thread. It stops on its own once the receiver is dropped.
    pub fn new(tick_rate: Duration) -> EventHandler {
        let (sender, receiver) = mpsc::channel();
        let event_thread = thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or_else(|| Duration::from_secs(0));

                let polled = match event::poll(timeout) {
                    Ok(ready) => ready,
                    Err(err) => {
                        error!("unable to poll terminal events: {err}");
                        break;
                    }
                };
                if polled {
                    let forwarded = match event::read() {
                        // key repeat/release reports would double every keystroke
                        Ok(CrosstermEvent::Key(e)) if e.kind == KeyEventKind::Press => {
                            sender.send(Event::Input(e))
                        }
                        Ok(CrosstermEvent::Mouse(e)) => sender.send(Event::Mouse(e)),
                        Ok(CrosstermEvent::Resize(_, _)) => {
                            sender.send(Event::TerminalEvent(TerminalEvent::Resize))
                        }
                        Ok(_) => Ok(()),
                        Err(err) => {
                            error!("unable to read terminal event: {err}");
                            break;
                        }
                    };
                    if forwarded.is_err() {
                        break;
                    }
                }

                if last_tick.elapsed() >= tick_rate {
                    if sender.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });
        EventHandler {
            receiver,
            event_thread,
        }
    }

    pub fn next(&self, timeout: Duration) -> Result<Option<Event>, mpsc::RecvTimeoutError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
