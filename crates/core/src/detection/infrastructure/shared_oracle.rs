use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::detection::domain::frame_oracle::FrameOracle;
use crate::detection::domain::target_class::TargetClass;
use crate::shared::frame::Frame;
use crate::BoxError;

/// Cloneable handle to a pool of oracle instances.
///
/// Each instance sits behind its own mutex, so one inference session never
/// runs two frames at once. Calls are spread round-robin across the pool;
/// with a pool of one, concurrent searches simply take turns. The pool is
/// built once and dropped when the last handle goes away.
#[derive(Clone)]
pub struct SharedOracle {
    slots: Arc<Vec<Mutex<Box<dyn FrameOracle>>>>,
    next: Arc<AtomicUsize>,
}

impl SharedOracle {
    pub fn new(oracle: Box<dyn FrameOracle>) -> Self {
        Self {
            slots: Arc::new(vec![Mutex::new(oracle)]),
            next: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A pool over several equivalent instances (e.g. one session per core).
    pub fn pool(oracles: Vec<Box<dyn FrameOracle>>) -> Result<Self, &'static str> {
        if oracles.is_empty() {
            return Err("oracle pool needs at least one instance");
        }
        Ok(Self {
            slots: Arc::new(oracles.into_iter().map(Mutex::new).collect()),
            next: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }
}

impl FrameOracle for SharedOracle {
    fn is_present(&mut self, frame: &Frame, target: &TargetClass) -> Result<bool, BoxError> {
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.slots.len();
        // A search that panicked mid-call poisons its slot; the oracle stays
        // usable for the next one.
        let mut oracle = self.slots[slot].lock().unwrap_or_else(|poisoned| {
            log::warn!("Oracle slot {slot} was poisoned by a panicked search, reusing it");
            self.slots[slot].clear_poison();
            poisoned.into_inner()
        });
        log::trace!("frame {} -> oracle slot {slot}", frame.index());
        oracle.is_present(frame, target)
    }
}
