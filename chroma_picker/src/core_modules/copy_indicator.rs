//! Copy-to-clipboard plus the short-lived "copied" indicator.
//!
//! The indicator is display state only. Each copy raises it for a fixed duration
//! through a tokio task; a newer copy or dropping the indicator cancels the
//! pending reset. A generation counter keeps a late reset from clearing a newer flag.

use log::debug;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Fire-and-forget clipboard collaborator.
pub trait Clipboard {
    fn copy_text(&mut self, text: &str);
}

/// A clipboard that remembers the last copied text. Useful headless and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    pub last: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn copy_text(&mut self, text: &str) {
        self.last = Some(text.to_string());
    }
}

/// Which representation was copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopiedField {
    Hex,
    Rgb,
}

#[derive(Debug, Default)]
struct IndicatorState {
    generation: u64,
    copied: Option<CopiedField>,
}

pub struct CopyIndicator {
    state: Arc<Mutex<IndicatorState>>,
    reset: Option<JoinHandle<()>>,
    duration: Duration,
}

impl CopyIndicator {
    pub fn new(duration: Duration) -> Self {
        Self {
            state: Arc::default(),
            reset: None,
            duration,
        }
    }

    /// Raises the indicator for `field` and schedules its reset.
    /// Without a tokio runtime the flag stays raised until the next `raise` or `clear`.
    pub fn raise(&mut self, field: CopiedField) {
        self.cancel_reset();
        let generation = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.generation += 1;
            state.copied = Some(field);
            state.generation
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime, copied indicator will not auto-reset");
            return;
        };
        let state = Arc::clone(&self.state);
        let duration = self.duration;
        self.reset = Some(runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation == generation {
                state.copied = None;
            }
        }));
    }

    pub fn copied(&self) -> Option<CopiedField> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).copied
    }

    pub fn clear(&mut self) {
        self.cancel_reset();
        self.state.lock().unwrap_or_else(PoisonError::into_inner).copied = None;
    }

    fn cancel_reset(&mut self) {
        if let Some(handle) = self.reset.take() {
            handle.abort();
        }
    }
}

impl Drop for CopyIndicator {
    fn drop(&mut self) {
        self.cancel_reset();
    }
}
