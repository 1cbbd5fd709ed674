//! A single estimation run, driven by explicit wall-clock instants.

use super::phase::{duration_to_ms, Phase, PhaseSequence};
use serde::Serialize;
use std::time::Instant;

/// Lifecycle state of an estimation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    /// No run is active.
    #[default]
    Idle,
    /// Simulating, parked at most at the final-window boundary.
    PreFinalWindow,
    /// Real completion signalled; simulating the final window.
    FinalWindow,
    /// Reached 100% after the completion signal.
    Completed,
    /// Stopped before completing.
    Abandoned,
}

impl RunState {
    /// Returns true for `Completed` and `Abandoned`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }

    /// Returns true while a run is being simulated.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::PreFinalWindow | Self::FinalWindow)
    }
}

/// Observable output of the estimator at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// Progress in `[0, 100]`.
    pub percent: f64,
    /// Index of the active phase.
    pub phase_index: usize,
    /// Estimated time left, in seconds.
    pub seconds_remaining: f64,
    /// Run lifecycle state.
    pub state: RunState,
}

impl ProgressSnapshot {
    /// Snapshot reported when no run is active.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Snapshot reported after a run was stopped.
    pub fn abandoned() -> Self {
        Self {
            state: RunState::Abandoned,
            ..Self::default()
        }
    }

    /// Percentage rounded for display.
    pub fn rounded_percent(&self) -> u8 {
        self.percent.round().clamp(0.0, 100.0) as u8
    }
}

/// Result of advancing a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum TickOutcome {
    /// Still simulating.
    Running,
    /// Reached 100% on this call; the completion callback is due.
    Completed,
    /// Nothing changed (already terminal, or a repeated signal).
    Inert,
}

/// State of one activation of the estimator.
///
/// Elapsed time is `baseline_ms + (now - anchor)`. A completion signal
/// re-anchors at the signal instant with the baseline set to the
/// pre-final budget, which is the rebase of the start timestamp expressed
/// without subtracting from an `Instant`.
#[derive(Debug, Clone)]
pub struct EstimationRun {
    sequence: PhaseSequence,
    anchor: Instant,
    baseline_ms: u64,
    completion_requested: bool,
    state: RunState,
    last: ProgressSnapshot,
}

impl EstimationRun {
    /// Starts a run at `now`.
    pub fn start(sequence: PhaseSequence, now: Instant) -> Self {
        let mut run = Self {
            sequence,
            anchor: now,
            baseline_ms: 0,
            completion_requested: false,
            state: RunState::PreFinalWindow,
            last: ProgressSnapshot::default(),
        };
        run.last = run.compute(0);
        run
    }

    /// Returns the phase sequence.
    pub fn sequence(&self) -> &PhaseSequence {
        &self.sequence
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Returns whether real completion has been signalled.
    pub fn completion_requested(&self) -> bool {
        self.completion_requested
    }

    /// Returns the most recently computed snapshot.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.last
    }

    /// Returns the phase the last snapshot points at.
    pub fn current_phase(&self) -> &Phase {
        &self.sequence.phases()[self.last.phase_index]
    }

    fn effective_elapsed_ms(&self, now: Instant) -> u64 {
        let since_anchor = duration_to_ms(now.saturating_duration_since(self.anchor));
        let elapsed = self.baseline_ms.saturating_add(since_anchor);
        if self.completion_requested {
            elapsed
        } else {
            elapsed.min(self.sequence.pre_final_budget_ms())
        }
    }

    fn compute(&self, effective_ms: u64) -> ProgressSnapshot {
        let percent = self.sequence.percent_at(effective_ms).max(self.last.percent);
        let phase_index = self
            .sequence
            .phase_index_at(effective_ms, self.completion_requested)
            .max(self.last.phase_index);
        let remaining_ms = self.sequence.total_ms().saturating_sub(effective_ms);

        ProgressSnapshot {
            percent,
            phase_index,
            seconds_remaining: remaining_ms as f64 / 1000.0,
            state: self.state,
        }
    }

    /// Recomputes the snapshot for `now`.
    pub fn sample(&mut self, now: Instant) -> TickOutcome {
        if !self.state.is_running() {
            return TickOutcome::Inert;
        }

        let mut snapshot = self.compute(self.effective_elapsed_ms(now));
        let outcome = if self.completion_requested && snapshot.percent >= 100.0 {
            self.state = RunState::Completed;
            snapshot.state = RunState::Completed;
            TickOutcome::Completed
        } else {
            TickOutcome::Running
        };
        self.last = snapshot;
        outcome
    }

    /// Marks real completion at `now`.
    ///
    /// The timeline is moved to the final-window boundary so only the final
    /// window remains to be simulated. When the final window has no length
    /// the run completes immediately.
    pub fn request_completion(&mut self, now: Instant) -> TickOutcome {
        if self.completion_requested || !self.state.is_running() {
            return TickOutcome::Inert;
        }

        self.completion_requested = true;
        self.anchor = now;
        self.baseline_ms = self.sequence.pre_final_budget_ms();
        self.state = RunState::FinalWindow;
        self.sample(now)
    }

    /// Stops the run without completing it.
    pub fn abandon(&mut self) {
        if self.state.is_running() {
            self.state = RunState::Abandoned;
            self.last.state = RunState::Abandoned;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn abc() -> PhaseSequence {
        PhaseSequence::from_table(&[("a", "A", 1000), ("b", "B", 1000), ("c", "C", 1000)])
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_concrete_scenario() {
        let t0 = Instant::now();
        let mut run = EstimationRun::start(abc(), t0);

        assert_eq!(run.sample(t0), TickOutcome::Running);
        assert_eq!(run.snapshot().percent, 0.0);
        assert_eq!(run.snapshot().phase_index, 0);
        assert_eq!(run.snapshot().state, RunState::PreFinalWindow);

        let _ = run.sample(t0 + ms(1000));
        assert!(approx(run.snapshot().percent, 100.0 / 3.0));

        let _ = run.sample(t0 + ms(5000));
        assert!(approx(run.snapshot().percent, 100.0 / 3.0));
        assert_eq!(run.snapshot().phase_index, 0);

        assert_eq!(run.request_completion(t0 + ms(5000)), TickOutcome::Running);
        assert_eq!(run.state(), RunState::FinalWindow);
        assert!(approx(run.snapshot().percent, 100.0 / 3.0));
        assert_eq!(run.snapshot().phase_index, 1);

        assert_eq!(run.sample(t0 + ms(7000)), TickOutcome::Completed);
        assert_eq!(run.snapshot().percent, 100.0);
        assert_eq!(run.snapshot().phase_index, 2);
        assert_eq!(run.snapshot().seconds_remaining, 0.0);
        assert_eq!(run.state(), RunState::Completed);
    }

    #[test]
    fn test_ceiling_holds_without_signal() {
        let t0 = Instant::now();
        let seq = PhaseSequence::from_table(&[
            ("upload", "Upload", 1500),
            ("generate", "Generate", 6500),
            ("optimize", "Optimize", 1200),
            ("complete", "Complete", 400),
        ]);
        let ceiling = seq.pre_completion_ceiling();
        let mut run = EstimationRun::start(seq, t0);

        for secs in [1, 5, 60, 3600, 86_400] {
            assert_eq!(run.sample(t0 + Duration::from_secs(secs)), TickOutcome::Running);
            assert!(run.snapshot().percent <= ceiling);
            assert!(run.snapshot().percent < 100.0);
        }
        assert!(approx(run.snapshot().percent, ceiling));
    }

    #[test]
    fn test_monotonic_across_rebase() {
        let t0 = Instant::now();
        let mut run = EstimationRun::start(abc(), t0);
        let mut last = 0.0;

        for step in 0..=30u64 {
            let now = t0 + ms(step * 100);
            if step == 4 {
                let _ = run.request_completion(now);
            } else {
                let _ = run.sample(now);
            }
            let percent = run.snapshot().percent;
            assert!(percent >= last, "progress went backwards at step {step}");
            last = percent;
        }
        assert_eq!(last, 100.0);
    }

    #[test]
    fn test_early_signal_reaches_completion_after_final_window() {
        let t0 = Instant::now();
        let mut run = EstimationRun::start(abc(), t0);

        assert_eq!(run.request_completion(t0), TickOutcome::Running);
        assert_eq!(run.sample(t0 + ms(1999)), TickOutcome::Running);
        assert_eq!(run.sample(t0 + ms(2000)), TickOutcome::Completed);
    }

    #[test]
    fn test_completes_once() {
        let t0 = Instant::now();
        let mut run = EstimationRun::start(abc(), t0);
        let _ = run.request_completion(t0);

        assert_eq!(run.sample(t0 + ms(2500)), TickOutcome::Completed);
        assert_eq!(run.sample(t0 + ms(3000)), TickOutcome::Inert);
        assert_eq!(run.request_completion(t0 + ms(3000)), TickOutcome::Inert);
    }

    #[test]
    fn test_repeated_signal_does_not_rebase_again() {
        let t0 = Instant::now();
        let mut run = EstimationRun::start(abc(), t0);
        let _ = run.request_completion(t0);
        let _ = run.sample(t0 + ms(1500));
        let before = run.snapshot().percent;

        assert_eq!(run.request_completion(t0 + ms(1500)), TickOutcome::Inert);
        assert_eq!(run.snapshot().percent, before);
    }

    #[test]
    fn test_zero_length_final_window_completes_on_signal() {
        let t0 = Instant::now();
        let seq = PhaseSequence::from_table(&[("work", "Work", 1000), ("a", "A", 0), ("b", "B", 0)]);
        let mut run = EstimationRun::start(seq, t0);

        assert_eq!(run.request_completion(t0 + ms(10)), TickOutcome::Completed);
        assert_eq!(run.snapshot().percent, 100.0);
        assert_eq!(run.snapshot().phase_index, 2);
    }

    #[test]
    fn test_abandon_is_terminal() {
        let t0 = Instant::now();
        let mut run = EstimationRun::start(abc(), t0);
        run.abandon();

        assert_eq!(run.state(), RunState::Abandoned);
        assert_eq!(run.sample(t0 + ms(500)), TickOutcome::Inert);
        assert_eq!(run.request_completion(t0 + ms(500)), TickOutcome::Inert);
    }

    #[test]
    fn test_irregular_ticks_use_wall_clock() {
        let t0 = Instant::now();
        let seq = PhaseSequence::from_table(&[
            ("a", "A", 2000),
            ("b", "B", 2000),
            ("c", "C", 500),
            ("d", "D", 500),
        ]);
        let mut run = EstimationRun::start(seq, t0);

        let _ = run.sample(t0 + ms(100));
        let _ = run.sample(t0 + ms(2500));
        assert!(approx(run.snapshot().percent, 50.0));
        assert_eq!(run.snapshot().phase_index, 1);
        assert!(approx(run.snapshot().seconds_remaining, 2.5));
    }

    #[test]
    fn test_current_phase() {
        let t0 = Instant::now();
        let mut run = EstimationRun::start(abc(), t0);
        assert_eq!(run.current_phase().id, "a");

        let _ = run.request_completion(t0);
        let _ = run.sample(t0 + ms(1200));
        assert_eq!(run.current_phase().id, "c");
    }
}
