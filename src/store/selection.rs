use std::sync::Arc;

use tokio::sync::watch;

use super::sample::ReferenceSample;

/// The single shared "currently selected reference" slot.
///
/// Both the recording/management side and the generation side hold a clone
/// of the same handle; selection is not ambient global state. Consumers that
/// want to react to changes subscribe explicitly instead of polling.
#[derive(Clone)]
pub struct SelectionSlot {
    tx: Arc<watch::Sender<Option<ReferenceSample>>>,
}

impl SelectionSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Atomically replace the selection. `None` clears it.
    pub fn select(&self, sample: Option<ReferenceSample>) {
        // send_replace never fails; the sender keeps the value alive even
        // with no subscribers.
        self.tx.send_replace(sample);
    }

    /// The currently selected sample, if any.
    pub fn current(&self) -> Option<ReferenceSample> {
        self.tx.borrow().clone()
    }

    /// Subscribe to selection changes. The receiver immediately sees the
    /// current value and is notified on every replacement.
    pub fn subscribe(&self) -> watch::Receiver<Option<ReferenceSample>> {
        self.tx.subscribe()
    }
}

impl Default for SelectionSlot {
    fn default() -> Self {
        Self::new()
    }
}
