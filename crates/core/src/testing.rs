//! Stub collaborators shared by unit tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::detection::domain::frame_oracle::FrameOracle;
use crate::detection::domain::target_class::TargetClass;
use crate::search::boundary_search_engine::BoundarySearchEngine;
use crate::search::domain::occurrence::SearchOutcome;
use crate::search::domain::search_strategy::SearchStrategy;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameReadError, FrameSource, FrameSourceOpener};
use crate::BoxError;

pub fn target(label: &str) -> TargetClass {
    TargetClass::new(label).unwrap()
}

/// Source of `len` tiny frames whose pixel data encodes nothing; the frame
/// index is all an oracle stub needs.
#[derive(Clone)]
pub struct ScriptedSource {
    len: usize,
    failing: HashSet<usize>,
    reads: Arc<Mutex<Vec<usize>>>,
}

impl ScriptedSource {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            failing: HashSet::new(),
            reads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_at(mut self, indices: &[usize]) -> Self {
        self.failing.extend(indices.iter().copied());
        self
    }

    pub fn reads(&self) -> Vec<usize> {
        self.reads.lock().unwrap().clone()
    }
}

impl FrameSource for ScriptedSource {
    fn frame_count(&self) -> usize {
        self.len
    }

    fn read_frame_at(&mut self, index: usize) -> Result<Frame, FrameReadError> {
        self.reads.lock().unwrap().push(index);
        if index >= self.len {
            return Err(FrameReadError::OutOfRange {
                index,
                len: self.len,
            });
        }
        if self.failing.contains(&index) {
            return Err(FrameReadError::EndOfStream { index });
        }
        Ok(Frame::filled(1, 1, [0, 0, 0], index))
    }
}

/// Opener handing out clones of one scripted source, for any path.
pub struct ScriptedOpener {
    pub source: ScriptedSource,
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptedOpener {
    pub fn new(source: ScriptedSource) -> Self {
        Self {
            source,
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FrameSourceOpener for ScriptedOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameSource>, BoxError> {
        if !path.exists() {
            return Err(format!("no such file: {}", path.display()).into());
        }
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(Box::new(self.source.clone()))
    }
}

/// Oracle answering from a fixed presence pattern over frame indices.
///
/// Optionally answers only for one target label, so multi-class searches can
/// be told apart.
#[derive(Clone)]
pub struct PresenceOracle {
    present: HashSet<usize>,
    label: Option<String>,
    fail_at: Option<usize>,
    asked: Arc<Mutex<Vec<usize>>>,
}

impl PresenceOracle {
    pub fn at(indices: &[usize]) -> Self {
        Self {
            present: indices.iter().copied().collect(),
            label: None,
            fail_at: None,
            asked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn from_pattern(pattern: &[bool]) -> Self {
        let indices: Vec<usize> = pattern
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| p.then_some(i))
            .collect();
        Self::at(&indices)
    }

    pub fn for_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn asked(&self) -> Vec<usize> {
        self.asked.lock().unwrap().clone()
    }
}

impl FrameOracle for PresenceOracle {
    fn is_present(&mut self, frame: &Frame, target: &TargetClass) -> Result<bool, BoxError> {
        let index = frame.index();
        self.asked.lock().unwrap().push(index);
        if self.fail_at == Some(index) {
            return Err(format!("inference failed on frame {index}").into());
        }
        let label_ok = self.label.as_deref().map_or(true, |l| target.matches(l));
        Ok(label_ok && self.present.contains(&index))
    }
}

/// Every boolean pattern of length `n`, as vectors.
pub fn all_patterns(n: usize) -> impl Iterator<Item = Vec<bool>> {
    (0u32..(1 << n)).map(move |bits| (0..n).map(|i| bits & (1 << i) != 0).collect())
}

/// Every unimodal pattern (false*, true*, false*) of length `n`, including
/// the all-false one, with its true run as `start..end`.
pub fn unimodal_patterns(n: usize) -> impl Iterator<Item = (Vec<bool>, usize, usize)> {
    (0..=n).flat_map(move |start| {
        (start..=n).map(move |end| ((0..n).map(|i| (start..end).contains(&i)).collect(), start, end))
    })
}

/// Runs a full search over a scripted presence pattern and returns the
/// outcome.
pub fn run_search(strategy: Box<dyn SearchStrategy>, pattern: &[bool]) -> SearchOutcome {
    BoundarySearchEngine::new(strategy)
        .locate(
            &mut ScriptedSource::new(pattern.len()),
            &mut PresenceOracle::from_pattern(pattern),
            &target("person"),
        )
        .unwrap()
}
