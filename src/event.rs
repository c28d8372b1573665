use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use crate::integration::events::IntegrationEvent;

/// Application events
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
  /// One line of command input
  Line(String),
  /// Input closed
  Eof,
  /// Ctrl-C
  Interrupt,
  /// Something changed in TaskTracker
  Integration(IntegrationEvent),
}

/// Event handler that merges command input, Ctrl-C and integration events
/// into a single stream
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Read commands from stdin
  pub fn new(integration_events: broadcast::Receiver<IntegrationEvent>) -> Self {
    Self::with_input(BufReader::new(tokio::io::stdin()), integration_events)
  }

  pub fn with_input<R>(input: R, integration_events: broadcast::Receiver<IntegrationEvent>) -> Self
  where
    R: AsyncBufRead + Unpin + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();

    // Spawn input reader
    let input_tx = tx.clone();
    tokio::spawn(async move {
      let mut lines = input.lines();
      loop {
        let event = match lines.next_line().await {
          Ok(Some(line)) => Event::Line(line),
          Ok(None) => Event::Eof,
          Err(e) => {
            warn!(error = %e, "failed to read input");
            Event::Eof
          }
        };
        let done = event == Event::Eof;
        if input_tx.send(event).is_err() || done {
          break;
        }
      }
    });

    // Spawn Ctrl-C listener
    let signal_tx = tx.clone();
    tokio::spawn(async move {
      while tokio::signal::ctrl_c().await.is_ok() {
        if signal_tx.send(Event::Interrupt).is_err() {
          break;
        }
      }
    });

    // Forward integration events
    let forward_tx = tx;
    tokio::spawn(async move {
      let mut events = integration_events;
      loop {
        match events.recv().await {
          Ok(event) => {
            if forward_tx.send(Event::Integration(event)).is_err() {
              break;
            }
          }
          Err(broadcast::error::RecvError::Lagged(skipped)) => {
            warn!(skipped, "dropped integration events");
          }
          Err(broadcast::error::RecvError::Closed) => break,
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
