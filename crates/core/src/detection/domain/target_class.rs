use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("target class must be a non-empty label")]
pub struct InvalidTargetClass;

/// Label of the object class being searched for, e.g. `"person"`.
///
/// Surrounding whitespace is trimmed; matching against detector labels is
/// case-insensitive.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TargetClass(String);

impl TargetClass {
    pub fn new(label: &str) -> Result<Self, InvalidTargetClass> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(InvalidTargetClass);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, label: &str) -> bool {
        self.0.eq_ignore_ascii_case(label.trim())
    }
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for TargetClass {
    type Error = InvalidTargetClass;

    fn try_from(label: &str) -> Result<Self, Self::Error> {
        Self::new(label)
    }
}
