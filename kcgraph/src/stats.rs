//! Timers and counters for graph operations.
//!
//! A [`Statistics`] handle is either disabled, in which case every call does nothing, or refers to
//! one shared set of counters. Component graphs get a clone of their parent's handle, so all
//! graphs of one compilation report into the same counters.
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Operations that are timed and counted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Operation {
    RemoveLiteral = 0,
    RestoreLiteral = 1,
    MergeVariables = 2,
    RestoreMerge = 3,
    Subsumption = 4,
    RestoreSubsumption = 5,
    Components = 6,
    CreateComponents = 7,
    GenerateKey = 8,
    CacheLookup = 9,
    HornQuery = 10,
    RemoveSubsumed = 11,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Operation::RemoveLiteral,
        Operation::RestoreLiteral,
        Operation::MergeVariables,
        Operation::RestoreMerge,
        Operation::Subsumption,
        Operation::RestoreSubsumption,
        Operation::Components,
        Operation::CreateComponents,
        Operation::GenerateKey,
        Operation::CacheLookup,
        Operation::HornQuery,
        Operation::RemoveSubsumed,
    ];
}

/// Counters of one operation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct OperationStats {
    /// Number of completed calls.
    pub calls: u64,
    /// Time spent in completed calls.
    pub time: Duration,
    /// Sum of the result sizes reported with [`Statistics::count`].
    pub results: u64,
}

/// Snapshot of all counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub operations: Vec<(Operation, OperationStats)>,
}

impl StatisticsReport {
    pub fn get(&self, operation: Operation) -> OperationStats {
        self.operations
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|&(_, stats)| stats)
            .unwrap_or_default()
    }
}

type Counters = Rc<RefCell<[OperationStats; Operation::ALL.len()]>>;

/// Handle to a shared statistics sink.
#[derive(Clone, Default)]
pub struct Statistics {
    counters: Option<Counters>,
}

impl Statistics {
    /// A handle on which every call is a no-op.
    pub fn disabled() -> Statistics {
        Statistics { counters: None }
    }

    /// A handle to a fresh set of counters.
    pub fn enabled() -> Statistics {
        Statistics {
            counters: Some(Default::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.counters.is_some()
    }

    /// Start timing an operation. The call is recorded when the returned guard is dropped.
    pub fn time(&self, operation: Operation) -> Timer {
        Timer {
            running: self
                .counters
                .as_ref()
                .map(|counters| (counters.clone(), operation, Instant::now())),
        }
    }

    /// Add to the result counter of an operation.
    pub fn count(&self, operation: Operation, results: usize) {
        if let Some(counters) = &self.counters {
            counters.borrow_mut()[operation as usize].results += results as u64;
        }
    }

    /// Current counters, `None` when disabled.
    pub fn report(&self) -> Option<StatisticsReport> {
        let counters = self.counters.as_ref()?.borrow();
        Some(StatisticsReport {
            operations: Operation::ALL
                .iter()
                .map(|&op| (op, counters[op as usize]))
                .collect(),
        })
    }
}

/// Guard returned by [`Statistics::time`].
#[must_use]
pub struct Timer {
    running: Option<(Counters, Operation, Instant)>,
}

impl Drop for Timer {
    fn drop(&mut self) {
        if let Some((counters, operation, start)) = self.running.take() {
            let mut counters = counters.borrow_mut();
            let stats = &mut counters[operation as usize];
            stats.calls += 1;
            stats.time += start.elapsed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_sink_reports_nothing() {
        let stats = Statistics::disabled();
        {
            let _timer = stats.time(Operation::Components);
            stats.count(Operation::Components, 3);
        }
        assert!(stats.report().is_none());
    }

    #[test]
    fn clones_share_counters() {
        let stats = Statistics::enabled();
        let child = stats.clone();
        {
            let _timer = child.time(Operation::RemoveLiteral);
        }
        {
            let _timer = stats.time(Operation::RemoveLiteral);
        }
        child.count(Operation::RemoveLiteral, 2);

        let report = stats.report().unwrap();
        assert_eq!(report.get(Operation::RemoveLiteral).calls, 2);
        assert_eq!(report.get(Operation::RemoveLiteral).results, 2);
        assert_eq!(report.get(Operation::HornQuery), OperationStats::default());
    }
}
