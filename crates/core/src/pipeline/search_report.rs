use serde::{Deserialize, Serialize};

use crate::detection::domain::target_class::TargetClass;
use crate::search::domain::occurrence::OccurrenceInterval;

/// What a search reports back to its caller, in the shape the HTTP service
/// used to answer with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_frame: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_frame: Option<usize>,
    pub message: String,
}

impl SearchReport {
    pub fn new(target: &TargetClass, interval: Option<OccurrenceInterval>) -> Self {
        match interval {
            Some(interval) => Self {
                first_frame: Some(interval.first()),
                last_frame: Some(interval.last()),
                message: format!(
                    "'{target}' found from frame {} to frame {}",
                    interval.first(),
                    interval.last()
                ),
            },
            None => Self {
                first_frame: None,
                last_frame: None,
                message: format!("No '{target}' detected."),
            },
        }
    }

    pub fn is_found(&self) -> bool {
        self.first_frame.is_some()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
