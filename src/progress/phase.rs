//! Phases and validated phase sequences.

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Number of trailing phases reserved for the "wrapping up" window.
const FINAL_WINDOW_PHASES: usize = 2;

/// A named stage of an operation with an expected duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    /// Identifier, unique within its sequence.
    pub id: String,
    /// Display text.
    pub label: String,
    /// Expected duration in milliseconds.
    pub estimated_duration_ms: u64,
}

impl Phase {
    /// Creates a new phase.
    pub fn new(id: impl Into<String>, label: impl Into<String>, estimated: Duration) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            estimated_duration_ms: duration_to_ms(estimated),
        }
    }

    /// Returns the expected duration.
    pub fn estimated(&self) -> Duration {
        Duration::from_millis(self.estimated_duration_ms)
    }
}

/// An ordered, non-empty list of phases that can drive a progress estimator.
///
/// The last one or two phases form the *final window*: the part of the
/// timeline that is only simulated once the real operation has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSequence {
    phases: Vec<Phase>,
    total_ms: u64,
    final_window_start: usize,
    final_window_ms: u64,
}

impl PhaseSequence {
    /// Validates and builds a sequence.
    ///
    /// Fails when the list is empty, when the total duration is zero (the
    /// percentage would divide by zero) or when two phases share an id.
    /// Individual phases may be zero-length.
    pub fn new(phases: Vec<Phase>) -> Result<Self> {
        if phases.is_empty() {
            return Err(StudioError::InvalidPhaseSequence(
                "sequence must contain at least one phase".into(),
            ));
        }

        let mut seen = HashSet::with_capacity(phases.len());
        for phase in &phases {
            if !seen.insert(phase.id.as_str()) {
                return Err(StudioError::InvalidPhaseSequence(format!(
                    "duplicate phase id '{}'",
                    phase.id
                )));
            }
        }

        let sequence = Self::assemble(phases);
        if sequence.total_ms == 0 {
            return Err(StudioError::InvalidPhaseSequence(
                "total estimated duration must be greater than zero".into(),
            ));
        }
        Ok(sequence)
    }

    /// Builds a sequence from a static `(id, label, ms)` table.
    pub(crate) fn from_table(table: &[(&str, &str, u64)]) -> Self {
        let phases = table
            .iter()
            .map(|&(id, label, ms)| Phase {
                id: id.to_string(),
                label: label.to_string(),
                estimated_duration_ms: ms,
            })
            .collect::<Vec<_>>();
        debug_assert!(Self::new(phases.clone()).is_ok());
        Self::assemble(phases)
    }

    fn assemble(phases: Vec<Phase>) -> Self {
        let total_ms = phases
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.estimated_duration_ms));
        let final_window_start = phases.len() - FINAL_WINDOW_PHASES.min(phases.len());
        let final_window_ms = phases[final_window_start..]
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.estimated_duration_ms));

        Self {
            phases,
            total_ms,
            final_window_start,
            final_window_ms,
        }
    }

    /// Returns the phases in order.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Returns the number of phases.
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always false; sequences are validated to be non-empty.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Returns the phase at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    /// Sum of all phase durations in milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    /// Sum of all phase durations.
    pub fn total(&self) -> Duration {
        Duration::from_millis(self.total_ms)
    }

    /// Index of the first phase of the final window.
    pub fn final_window_start(&self) -> usize {
        self.final_window_start
    }

    /// Duration of the final window in milliseconds.
    pub fn final_window_ms(&self) -> u64 {
        self.final_window_ms
    }

    /// Elapsed time the simulation may spend before real completion.
    pub fn pre_final_budget_ms(&self) -> u64 {
        self.total_ms - self.final_window_ms
    }

    /// Highest percentage reachable before real completion is signalled.
    pub fn pre_completion_ceiling(&self) -> f64 {
        self.percent_at(self.pre_final_budget_ms())
    }

    /// Percentage of the timeline covered after `effective_ms`.
    pub fn percent_at(&self, effective_ms: u64) -> f64 {
        (100.0 * effective_ms as f64 / self.total_ms as f64).min(100.0)
    }

    /// Index of the last phase whose cumulative start is at or before
    /// `effective_ms`.
    ///
    /// While completion is pending the index is held on the last phase
    /// before the final window.
    pub fn phase_index_at(&self, effective_ms: u64, completion_requested: bool) -> usize {
        let mut index = 0;
        let mut start = 0u64;
        for (i, phase) in self.phases.iter().enumerate() {
            if start > effective_ms {
                break;
            }
            index = i;
            start = start.saturating_add(phase.estimated_duration_ms);
        }

        if completion_requested {
            index
        } else {
            index.min(self.final_window_start.saturating_sub(1))
        }
    }
}

pub(crate) fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
