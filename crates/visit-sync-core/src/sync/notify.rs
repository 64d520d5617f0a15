//! Completion listeners and the error-signal channel.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::SyncResult;

/// Receives the outcome of one spawned operation.
pub trait CompletionListener<T>: Send + Sync {
    fn on_success(&self, value: T);
    fn on_failure(&self);
}

/// Fire-and-forget channel for human-readable failure messages.
pub trait ErrorSignal: Send + Sync {
    fn raise(&self, message: &str);
}

/// Writes signals to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSignal;

impl ErrorSignal for LogErrorSignal {
    fn raise(&self, message: &str) {
        log::error!("{}", message);
    }
}

/// Forwards signals to a receiver, e.g. a UI task showing toasts.
#[derive(Debug, Clone)]
pub struct ChannelErrorSignal {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelErrorSignal {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ErrorSignal for ChannelErrorSignal {
    fn raise(&self, message: &str) {
        // Receiver gone means nobody is listening any more.
        if self.tx.send(message.to_string()).is_err() {
            log::debug!("Dropped error signal: {}", message);
        }
    }
}

/// Run an operation on the tokio runtime and report its outcome.
pub(crate) fn spawn_with_listener<T, F>(
    operation: F,
    listener: Option<Arc<dyn CompletionListener<T>>>,
) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Future<Output = SyncResult<T>> + Send + 'static,
{
    tokio::spawn(async move {
        let result = operation.await;
        if let Some(listener) = listener {
            match result {
                Ok(value) => listener.on_success(value),
                Err(_) => listener.on_failure(),
            }
        }
    })
}
