//! Trailing-edge debouncer.
//!
//! Every pushed value restarts the quiet period; when it elapses the latest
//! value is emitted once. Used for the search box (300 ms by default).

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Returns the debouncer and the receiver of settled values
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input, mut inputs) = mpsc::unbounded_channel::<T>();
        let (output, outputs) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut pending: Option<T> = None;
            let sleep = tokio::time::sleep(delay);
            tokio::pin!(sleep);

            loop {
                tokio::select! {
                    value = inputs.recv() => match value {
                        Some(value) => {
                            pending = Some(value);
                            sleep.as_mut().reset(Instant::now() + delay);
                        }
                        None => break,
                    },
                    _ = &mut sleep, if pending.is_some() => {
                        if let Some(value) = pending.take() {
                            if output.send(value).is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        (Self { input, task }, outputs)
    }

    pub fn push(&self, value: T) {
        if self.input.send(value).is_err() {
            tracing::debug!("Debouncer task already stopped");
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        // A value still waiting out its quiet period is dropped
        self.task.abort();
    }
}
