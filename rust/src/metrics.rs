use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

use crate::dtype::DType;

/// How a reduction was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReductionPath {
    /// No input elements; the result is the identity.
    Empty,
    Sequential,
    Parallel,
}

impl ReductionPath {
    pub const fn name(self) -> &'static str {
        match self {
            ReductionPath::Empty => "empty",
            ReductionPath::Sequential => "sequential",
            ReductionPath::Parallel => "parallel",
        }
    }
}

impl fmt::Display for ReductionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReductionUsage {
    pub operation: &'static str,
    pub dtype: DType,
    pub path: ReductionPath,
    pub count: u64,
}

type UsageKey = (&'static str, DType, ReductionPath);

fn usage_map() -> &'static Mutex<HashMap<UsageKey, u64>> {
    static COUNTS: OnceLock<Mutex<HashMap<UsageKey, u64>>> = OnceLock::new();
    COUNTS.get_or_init(|| Mutex::new(HashMap::new()))
}

pub fn record_reduction(operation: &'static str, dtype: DType, path: ReductionPath) {
    if operation.is_empty() {
        return;
    }
    if let Ok(mut guard) = usage_map().lock() {
        let entry = guard.entry((operation, dtype, path)).or_insert(0);
        *entry = entry.saturating_add(1);
    }
}

pub fn snapshot() -> Vec<ReductionUsage> {
    let mut usage: Vec<ReductionUsage> = usage_map()
        .lock()
        .map(|guard| {
            guard
                .iter()
                .map(|(&(operation, dtype, path), &count)| ReductionUsage {
                    operation,
                    dtype,
                    path,
                    count,
                })
                .collect()
        })
        .unwrap_or_default();
    usage.sort_by_key(|u| (u.operation, u.dtype, u.path.name()));
    usage
}
