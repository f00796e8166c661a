//! Observer hooks fired at detector lifecycle points
//!
//! Callbacks are held in registration order by the detector that owns them and
//! are invoked synchronously. A detector with no callbacks behaves identically.

use crate::drift::ComparisonResult;
use crate::semi_supervised::{ChunkScore, MarginDensityBaseline};
use serde::Serialize;
use std::fmt;

/// Event delivered to callbacks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DriftEvent {
    /// A batch comparison finished
    ComparisonCompleted {
        method: &'static str,
        result: ComparisonResult,
    },
    /// A streamed chunk crossed the margin-density threshold
    DriftSuspected { score: ChunkScore },
    /// A new baseline was published after labels arrived
    BaselineRetrained {
        previous: MarginDensityBaseline,
        current: MarginDensityBaseline,
        drift_confirmed: bool,
    },
}

/// Callback type for drift events
pub type DriftCallback = Box<dyn Fn(&DriftEvent) + Send + Sync>;

/// Ordered list of callbacks
#[derive(Default)]
pub struct CallbackList {
    callbacks: Vec<DriftCallback>,
}

impl CallbackList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback; it runs after every previously registered one
    pub fn register<F>(&mut self, callback: F)
    where
        F: Fn(&DriftEvent) + Send + Sync + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    pub fn notify(&self, event: &DriftEvent) {
        for callback in &self.callbacks {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl fmt::Debug for CallbackList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackList")
            .field("len", &self.callbacks.len())
            .finish()
    }
}
