use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Opaque job identifier
///
/// Rendered as decimal nanoseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Hands out strictly increasing, process-unique job ids
///
/// Ids follow the wall clock in nanoseconds; two jobs created within the
/// same nanosecond (or after the clock steps back) get the previous id + 1.
#[derive(Debug, Default)]
pub struct JobIdGenerator {
    last: AtomicI64,
}

impl JobIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> JobId {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let next = now.max(prev.saturating_add(1));
            match self
                .last
                .compare_exchange(prev, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return JobId(next.to_string()),
                Err(actual) => prev = actual,
            }
        }
    }
}
