use std::collections::BTreeMap;

use derive_more::{AsRef, Display};

/// A prescribed or recorded metric bag, keyed by metric identifier.
pub type Metrics = BTreeMap<MetricKey, MetricValue>;

#[derive(AsRef, Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MetricKey(String);

impl MetricKey {
    pub fn new(key: &str) -> Result<Self, MetricKeyError> {
        let trimmed_key = key.trim();

        if trimmed_key.is_empty() {
            return Err(MetricKeyError::Empty);
        }

        Ok(MetricKey(trimmed_key.to_string()))
    }

    /// Reserved key carrying the set-count directive in a global prescription.
    /// It is a cardinality directive, never a prescribed value.
    #[must_use]
    pub fn sets() -> Self {
        MetricKey(String::from("sets"))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MetricKeyError {
    #[error("Metric key must not be empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Number(f64),
    /// Seconds.
    Duration(u32),
    Text(String),
}

impl MetricValue {
    #[must_use]
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Number(_) => MetricKind::Number,
            MetricValue::Duration(_) => MetricKind::Duration,
            MetricValue::Text(_) => MetricKind::Text,
        }
    }

    /// Interprets the value as a set count. Anything that is not a whole
    /// number greater than zero yields `None`.
    #[must_use]
    pub fn as_count(&self) -> Option<u32> {
        match self {
            MetricValue::Number(n) => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                if *n > 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX) {
                    Some(*n as u32)
                } else {
                    None
                }
            }
            MetricValue::Text(t) => t.trim().parse::<u32>().ok().filter(|n| *n > 0),
            MetricValue::Duration(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Number,
    Duration,
    Text,
}
